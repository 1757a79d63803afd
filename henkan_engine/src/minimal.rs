//! `minimal`：初始化成功之前的兜底实现。
//!
//! 只读契约的“无害版”：空候选、空名字、空词典。永不失败、永不 panic。
//! 引擎一旦完成首次安装就不再回头用它（之后的失败保留旧一代）。

use henkan_core::converter::Converter;
use henkan_core::dictionary::SuppressionDictionary;
use henkan_core::model::Candidate;
use henkan_core::predictor::Predictor;

/// 永远返回空候选的 converter。
#[derive(Debug, Default)]
pub struct NullConverter;

impl Converter for NullConverter {
    fn convert(&self, _reading: &str, _limit: usize) -> Vec<Candidate> {
        Vec::new()
    }
}

/// 名字为空、永远不出候选的 predictor。
#[derive(Debug, Default)]
pub struct NullPredictor;

impl Predictor for NullPredictor {
    fn name(&self) -> &'static str {
        ""
    }

    fn predict(&self, _reading: &str, _limit: usize) -> Vec<Candidate> {
        Vec::new()
    }
}

/// 兜底引擎：与真引擎同一套只读接口形状。
#[derive(Debug, Default)]
pub struct MinimalEngine {
    converter: NullConverter,
    predictor: NullPredictor,
    suppression: SuppressionDictionary,
}

impl MinimalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn converter(&self) -> &dyn Converter {
        &self.converter
    }

    pub fn predictor(&self) -> &dyn Predictor {
        &self.predictor
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    pub fn suppression_dictionary(&self) -> &SuppressionDictionary {
        &self.suppression
    }

    pub fn pos_list(&self) -> Vec<String> {
        Vec::new()
    }

    pub fn data_version(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_engine_is_benign() {
        let engine = MinimalEngine::new();
        assert!(engine.converter().convert("てんき", 9).is_empty());
        assert!(engine.predictor().predict("て", 9).is_empty());
        assert_eq!(engine.predictor_name(), "");
        assert_eq!(engine.data_version(), "");
        assert!(engine.pos_list().is_empty());
        assert!(engine.suppression_dictionary().is_empty());
    }
}
