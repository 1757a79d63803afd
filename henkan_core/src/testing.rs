//! 测试用的内存数据快照（仅 `cfg(test)`）。

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::connector::Connector;
use crate::data_manager::DataManager;
use crate::dictionary::{
    Dictionary, PrefixMatch, SuppressionDictionary, Token, UserDictionary, UserEntry,
};
use crate::error::DataError;
use crate::modules::Modules;
use crate::segmenter::{MoraSegmenter, Segmenter};

/// 读音 -> 词条 的内存词典。
pub(crate) struct MapDictionary {
    map: BTreeMap<String, Vec<Token>>,
}

impl MapDictionary {
    pub(crate) fn new(entries: Vec<(&str, &str, u16, i32)>) -> Self {
        let mut map: BTreeMap<String, Vec<Token>> = BTreeMap::new();
        for (reading, surface, pos, weight) in entries {
            map.entry(reading.to_string()).or_default().push(Token {
                surface: surface.to_string(),
                pos,
                weight,
            });
        }
        for v in map.values_mut() {
            v.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.surface.cmp(&b.surface)));
        }
        Self { map }
    }
}

impl Dictionary for MapDictionary {
    fn lookup_span(
        &self,
        segment: &[String],
        start: usize,
        end: usize,
        limit: usize,
    ) -> Vec<Token> {
        if start >= end || end > segment.len() {
            return Vec::new();
        }
        let key: String = segment[start..end].concat();
        self.map
            .get(&key)
            .map(|v| v.iter().take(limit.max(1)).cloned().collect())
            .unwrap_or_default()
    }

    fn lookup_prefix(&self, key: &str, limit: usize) -> Vec<PrefixMatch> {
        let mut out = Vec::new();
        if key.is_empty() {
            return out;
        }
        for (k, tokens) in self.map.range(key.to_string()..) {
            if !k.starts_with(key) {
                break;
            }
            if k == key {
                continue;
            }
            for t in tokens {
                out.push(PrefixMatch {
                    key: k.clone(),
                    token: t.clone(),
                });
                if out.len() >= limit {
                    return out;
                }
            }
        }
        out
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

pub(crate) struct TestDataManager {
    version: String,
    dictionary: Vec<(&'static str, &'static str, u16, i32)>,
    connections: Vec<(u16, u16, i32)>,
    suppressions: Vec<(String, String)>,
    user_entries: Vec<UserEntry>,
}

impl DataManager for TestDataManager {
    fn data_version(&self) -> &str {
        &self.version
    }

    fn build_dictionary(&self) -> Result<Arc<dyn Dictionary>, DataError> {
        Ok(Arc::new(MapDictionary::new(self.dictionary.clone())))
    }

    fn build_connector(&self) -> Result<Connector, DataError> {
        Ok(Connector::from_pairs(self.connections.clone()))
    }

    fn build_segmenter(&self) -> Result<Arc<dyn Segmenter>, DataError> {
        Ok(Arc::new(MoraSegmenter::new()))
    }

    fn build_suppression_dictionary(&self) -> Result<SuppressionDictionary, DataError> {
        Ok(SuppressionDictionary::from_entries(self.suppressions.clone()))
    }

    fn build_user_dictionary(&self) -> Result<UserDictionary, DataError> {
        Ok(UserDictionary::from_entries(self.user_entries.clone()))
    }
}

/// 常用的小快照：converter/predictor 测试共用。
pub(crate) fn test_modules() -> Arc<Modules> {
    let manager = TestDataManager {
        version: "test.1".to_string(),
        dictionary: vec![
            ("わたし", "私", 1, 6000),
            ("てんき", "天気", 1, 6000),
            ("てん", "点", 1, 2000),
            ("き", "木", 1, 1800),
            ("き", "気", 1, 1700),
            ("きょう", "今日", 1, 6000),
            ("きょう", "京", 1, 3000),
            ("にほんご", "日本語", 1, 6200),
            ("にほん", "日本", 1, 6000),
            ("は", "は", 2, 4000),
            ("は", "歯", 1, 2500),
            ("は", "葉", 1, 2000),
            ("が", "が", 2, 4000),
            ("が", "蛾", 1, 1000),
            ("が", "画", 1, 900),
        ],
        connections: vec![(1, 2, 3000), (2, 1, 2000), (1, 1, 500)],
        suppressions: vec![("蛾".to_string(), "が".to_string())],
        user_entries: vec![UserEntry {
            surface: "技術".to_string(),
            reading: "ぎじゅつ".to_string(),
            pos_name: "名詞".to_string(),
            weight: 7000,
        }],
    };
    Arc::new(Modules::build(&manager).expect("test modules"))
}

/// 词典与用户词典都为空的快照（converter 构建失败路径用）。
pub(crate) fn empty_modules() -> Arc<Modules> {
    let manager = TestDataManager {
        version: "test.empty".to_string(),
        dictionary: Vec::new(),
        connections: Vec::new(),
        suppressions: Vec::new(),
        user_entries: Vec::new(),
    };
    Arc::new(Modules::build(&manager).expect("empty modules"))
}
