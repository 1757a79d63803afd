//! `data_manager`：数据快照的提供方抽象。
//!
//! 一个 `DataManager` 对应**一份**数据快照（词典/接续表/抑制词典/用户词典
//! 以及 data version 字符串）。`Modules::build` 从同一个 manager 派生全部
//! 资源，保证它们来自同一快照、版本一致。

use std::sync::Arc;

use crate::connector::Connector;
use crate::dictionary::{Dictionary, SuppressionDictionary, UserDictionary};
use crate::error::DataError;
use crate::segmenter::Segmenter;

/// DataManager：一份数据快照的资源工厂。
///
/// 实现方（例如 `henkan_dict::TsvDataManager`）应在构造时完成解析，
/// 让这里的 `build_*` 只做廉价的装配；解析错误在构造时以
/// [`DataError`] 上报。
pub trait DataManager: Send + Sync {
    /// 快照版本（不透明字符串，空串视为非法快照）。
    fn data_version(&self) -> &str;

    fn build_dictionary(&self) -> Result<Arc<dyn Dictionary>, DataError>;
    fn build_connector(&self) -> Result<Connector, DataError>;
    fn build_segmenter(&self) -> Result<Arc<dyn Segmenter>, DataError>;
    fn build_suppression_dictionary(&self) -> Result<SuppressionDictionary, DataError>;
    fn build_user_dictionary(&self) -> Result<UserDictionary, DataError>;
}
