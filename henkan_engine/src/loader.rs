//! `loader`：快照的异步构建与一次性结果交接。
//!
//! `DataLoader::start_build` 立即返回一个 [`ResponseFuture`]，重活在
//! 后台线程完成；失败通过 future 的结果上报，调用方永远不会在
//! `start_build` 上被慢速/损坏的数据源卡住。
//!
//! 同一个 loader 同时只允许一个构建在途——这由上游
//! （`Engine::maybe_build_data_loader`）保证，loader 自身不再加锁。

use std::sync::mpsc;
use std::thread;

use henkan_core::error::DataError;
use henkan_core::model::Profile;
use henkan_core::modules::Modules;
use henkan_dict::TsvDataManager;

use crate::request::{DataSource, ReloadRequest};

/// 一次构建的结果：成功拿到整包 `Modules`，或失败原因。
pub struct LoaderResponse {
    pub id: u64,
    pub profile: Profile,
    pub result: Result<Modules, DataError>,
}

/// 一次性的构建结果句柄。
///
/// 生命周期：构建启动时创建，结果被取走（`try_take`/`wait` 返回 Some/值）
/// 后即作废；同一个结果只能被取走一次。进程退出时直接丢弃在途的
/// future 即可——结果到了也没人装。
pub struct ResponseFuture {
    rx: mpsc::Receiver<LoaderResponse>,
    handle: Option<thread::JoinHandle<()>>,
    id: u64,
    profile: Profile,
}

impl ResponseFuture {
    /// 非阻塞轮询。结果未就绪时返回 None（future 仍然有效）。
    pub fn try_take(&mut self) -> Option<LoaderResponse> {
        match self.rx.try_recv() {
            Ok(response) => {
                self.join_worker();
                Some(response)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.join_worker();
                Some(self.aborted())
            }
        }
    }

    /// 阻塞等待结果（仅测试的强制等待路径使用）。
    pub fn wait(&mut self) -> LoaderResponse {
        match self.rx.recv() {
            Ok(response) => {
                self.join_worker();
                response
            }
            Err(mpsc::RecvError) => {
                self.join_worker();
                self.aborted()
            }
        }
    }

    /// 构造一个已就绪的 future（loader 测试替身用）。
    pub fn resolved(response: LoaderResponse) -> Self {
        let (tx, rx) = mpsc::sync_channel(1);
        let id = response.id;
        let profile = response.profile;
        // 容量为 1 的 channel，send 不会阻塞
        let _ = tx.send(response);
        Self {
            rx,
            handle: None,
            id,
            profile,
        }
    }

    /// 构造一个挂起的 future 和它的发送端（loader 测试替身用）。
    pub fn pending(id: u64, profile: Profile) -> (Self, mpsc::SyncSender<LoaderResponse>) {
        let (tx, rx) = mpsc::sync_channel(1);
        (
            Self {
                rx,
                handle: None,
                id,
                profile,
            },
            tx,
        )
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// 构建线程没有交付结果（panic 等）时折算成失败应答。
    fn aborted(&self) -> LoaderResponse {
        LoaderResponse {
            id: self.id,
            profile: self.profile,
            result: Err(DataError::BuilderGone),
        }
    }
}

/// DataLoader：启动一次异步构建。测试可用替身实现换掉默认 loader。
pub trait DataLoader: Send {
    fn start_build(&mut self, request: ReloadRequest) -> ResponseFuture;
}

/// 默认 loader：在后台线程里从 `DataSource` 构建整包 `Modules`。
#[derive(Debug, Default)]
pub struct BackgroundLoader;

impl DataLoader for BackgroundLoader {
    fn start_build(&mut self, request: ReloadRequest) -> ResponseFuture {
        let (tx, rx) = mpsc::sync_channel(1);
        let id = request.id;
        let profile = request.profile;
        tracing::info!(id, "后台构建开始");
        let handle = thread::spawn(move || {
            let result = build_modules(&request);
            if let Err(e) = &result {
                tracing::warn!(id = request.id, error = %e, "快照构建失败");
            }
            // 接收端已放弃时仅丢弃结果
            let _ = tx.send(LoaderResponse {
                id: request.id,
                profile: request.profile,
                result,
            });
        });
        ResponseFuture {
            rx,
            handle: Some(handle),
            id,
            profile,
        }
    }
}

fn build_modules(request: &ReloadRequest) -> Result<Modules, DataError> {
    match &request.source {
        DataSource::Directory(dir) => {
            let manager = TsvDataManager::from_dir(dir)?;
            Modules::build(&manager)
        }
        DataSource::Memory(manager) => Modules::build(manager.as_ref()),
    }
}
