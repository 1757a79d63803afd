//! `modules`：一次数据快照派生出的全部语言资源，打包成不可变整体。
//!
//! 不变量：同一个 `Modules` 里的每个字段都来自**同一个** [`DataManager`]
//! 快照，绝不跨版本混用；构建完成后不再原地修改，替换只能整体换装。

use std::sync::Arc;

use crate::connector::Connector;
use crate::data_manager::DataManager;
use crate::dictionary::{Dictionary, SuppressionDictionary, UserDictionary};
use crate::error::DataError;
use crate::segmenter::Segmenter;

/// 语言资源包。
pub struct Modules {
    data_version: String,
    dictionary: Arc<dyn Dictionary>,
    connector: Arc<Connector>,
    segmenter: Arc<dyn Segmenter>,
    suppression_dictionary: Arc<SuppressionDictionary>,
    user_dictionary: Arc<UserDictionary>,
}

impl Modules {
    /// 从一个数据快照整体构建。任何一项失败都放弃整包。
    pub fn build(manager: &dyn DataManager) -> Result<Self, DataError> {
        let data_version = manager.data_version().to_string();
        if data_version.is_empty() {
            return Err(DataError::MissingVersion);
        }
        let dictionary = manager.build_dictionary()?;
        let connector = Arc::new(manager.build_connector()?);
        let segmenter = manager.build_segmenter()?;
        let suppression_dictionary = Arc::new(manager.build_suppression_dictionary()?);
        let user_dictionary = Arc::new(manager.build_user_dictionary()?);
        tracing::debug!(version = %data_version, "modules 构建完成");
        Ok(Self {
            data_version,
            dictionary,
            connector,
            segmenter,
            suppression_dictionary,
            user_dictionary,
        })
    }

    pub fn data_version(&self) -> &str {
        &self.data_version
    }

    pub fn dictionary(&self) -> &Arc<dyn Dictionary> {
        &self.dictionary
    }

    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    pub fn segmenter(&self) -> &Arc<dyn Segmenter> {
        &self.segmenter
    }

    pub fn suppression_dictionary(&self) -> &Arc<SuppressionDictionary> {
        &self.suppression_dictionary
    }

    pub fn user_dictionary(&self) -> &Arc<UserDictionary> {
        &self.user_dictionary
    }
}
