//! `request`：重载请求/应答的数据类型。

use std::path::PathBuf;
use std::sync::Arc;

use henkan_core::data_manager::DataManager;
use henkan_core::model::Profile;

/// 数据来源：快照目录，或测试/嵌入场景下的内存 DataManager。
#[derive(Clone)]
pub enum DataSource {
    /// TSV 快照目录（`henkan_dict::TsvDataManager::from_dir` 加载）
    Directory(PathBuf),
    /// 已就绪的内存 DataManager
    Memory(Arc<dyn DataManager>),
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Directory(p) => f.debug_tuple("Directory").field(p).finish(),
            DataSource::Memory(_) => f.write_str("Memory(..)"),
        }
    }
}

/// 重载请求。版本比较只看 `id`（请求方分配，必须单调递增）。
#[derive(Debug, Clone)]
pub struct ReloadRequest {
    pub id: u64,
    pub profile: Profile,
    pub source: DataSource,
}

/// 一次重载的可观测结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStatus {
    /// 新一代已生效
    Installed,
    /// 请求已受理，结果尚未可知
    Pending,
    /// 静默丢弃（过期 id / 被更新的请求超越）
    Rejected,
    /// 构建或安装失败（旧一代保持生效）
    Failed,
}

/// 重载应答：状态 + 涉及的 id + 可选错误详情。
#[derive(Debug, Clone)]
pub struct ReloadResponse {
    pub status: ReloadStatus,
    pub id: u64,
    pub error: Option<String>,
}

impl ReloadResponse {
    pub fn installed(id: u64) -> Self {
        Self {
            status: ReloadStatus::Installed,
            id,
            error: None,
        }
    }

    pub fn pending(id: u64) -> Self {
        Self {
            status: ReloadStatus::Pending,
            id,
            error: None,
        }
    }

    pub fn rejected(id: u64) -> Self {
        Self {
            status: ReloadStatus::Rejected,
            id,
            error: None,
        }
    }

    pub fn failed(id: u64, error: impl std::fmt::Display) -> Self {
        Self {
            status: ReloadStatus::Failed,
            id,
            error: Some(error.to_string()),
        }
    }
}
