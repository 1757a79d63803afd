use std::collections::{BTreeMap, HashSet};

/// 词典返回的原始词条（converter 再把它包装成 [`crate::model::Candidate`]）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 表记（汉字/片假名等展示文本）
    pub surface: String,
    /// 词性 id（接续表按 (prev, next) 查权重）
    pub pos: u16,
    /// 权重（越大越靠前）
    pub weight: i32,
}

/// 前缀检索命中：`key` 是词典里的完整读音。
#[derive(Debug, Clone)]
pub struct PrefixMatch {
    pub key: String,
    pub token: Token,
}

/// 词典抽象：core 不关心词典来自文件/内存/网络。
///
/// 约定：
/// - `segment` 是读音的拍切分结果（例如 `["きょ","う"]`）
/// - `start..end` 是拍索引范围，含 start 不含 end
/// - 查询键为 `segment[start..end]` 按序拼接出的读音子串
pub trait Dictionary: Send + Sync {
    /// 查询拍范围 `segment[start..end]` 对应的词条（精确匹配）。
    /// - `limit`: 返回词条数量上限（实现可自行 clamp）
    fn lookup_span(&self, segment: &[String], start: usize, end: usize, limit: usize)
    -> Vec<Token>;

    /// 前缀检索（用于 predictor 的补全）；不含 `key` 本身的精确命中。
    /// 默认实现返回空（不支持前缀检索的词典可以不实现）。
    fn lookup_prefix(&self, key: &str, limit: usize) -> Vec<PrefixMatch> {
        let _ = (key, limit);
        Vec::new()
    }

    /// 词典是否为空（converter 构建时校验）。
    fn is_empty(&self) -> bool;
}

/// 用户词典词条。
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub surface: String,
    pub reading: String,
    /// 词性名（展示用；参见 [`UserDictionary::pos_list`]）
    pub pos_name: String,
    pub weight: i32,
}

/// 用户词典词条统一挂的词性 id。
///
/// 取 `u16::MAX` 保留值：主词典省略 pos 列时默认 0，
/// 用户词条必须与之区分开（候选标注与接续查询都按这个 id 走）。
pub const USER_POS: u16 = u16::MAX;

/// 用户词典：按读音索引的用户词条集合。
///
/// 与主词典分开持有，converter 查词时合并结果并加权（用户词优先）。
#[derive(Debug, Default)]
pub struct UserDictionary {
    by_reading: BTreeMap<String, Vec<UserEntry>>,
    pos_list: Vec<String>,
}

impl UserDictionary {
    pub fn from_entries(entries: Vec<UserEntry>) -> Self {
        let mut by_reading: BTreeMap<String, Vec<UserEntry>> = BTreeMap::new();
        let mut pos_list: Vec<String> = Vec::new();
        for e in entries {
            if !pos_list.contains(&e.pos_name) {
                pos_list.push(e.pos_name.clone());
            }
            by_reading.entry(e.reading.clone()).or_default().push(e);
        }
        for v in by_reading.values_mut() {
            v.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.surface.cmp(&b.surface)));
        }
        Self { by_reading, pos_list }
    }

    /// 精确按读音查询。
    pub fn lookup(&self, reading: &str) -> Vec<Token> {
        self.by_reading
            .get(reading)
            .map(|v| {
                v.iter()
                    .map(|e| Token {
                        surface: e.surface.clone(),
                        pos: USER_POS,
                        weight: e.weight,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 用户词典里出现过的词性名（保持文件内出现顺序）。
    pub fn pos_list(&self) -> &[String] {
        &self.pos_list
    }

    pub fn is_empty(&self) -> bool {
        self.by_reading.is_empty()
    }
}

/// 抑制词典：命中的候选在 rewriter 里被整条丢弃。
///
/// 两类规则：
/// - `(surface, reading)` 对：表记与读音都匹配才抑制
/// - 仅 `surface`（reading 为空）：该表记在任何读音下都抑制
#[derive(Debug, Default)]
pub struct SuppressionDictionary {
    pairs: HashSet<(String, String)>,
    surfaces: HashSet<String>,
}

impl SuppressionDictionary {
    pub fn from_entries(entries: Vec<(String, String)>) -> Self {
        let mut pairs = HashSet::new();
        let mut surfaces = HashSet::new();
        for (surface, reading) in entries {
            if reading.is_empty() {
                surfaces.insert(surface);
            } else {
                pairs.insert((surface, reading));
            }
        }
        Self { pairs, surfaces }
    }

    pub fn suppressed(&self, surface: &str, reading: &str) -> bool {
        self.surfaces.contains(surface)
            || self
                .pairs
                .contains(&(surface.to_string(), reading.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_dictionary_lookup_and_pos_list() {
        let dict = UserDictionary::from_entries(vec![
            UserEntry {
                surface: "技術".to_string(),
                reading: "ぎじゅつ".to_string(),
                pos_name: "名詞".to_string(),
                weight: 7000,
            },
            UserEntry {
                surface: "ギジュツ".to_string(),
                reading: "ぎじゅつ".to_string(),
                pos_name: "固有名詞".to_string(),
                weight: 100,
            },
        ]);
        let tokens = dict.lookup("ぎじゅつ");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].surface, "技術");
        assert_eq!(dict.pos_list(), &["名詞".to_string(), "固有名詞".to_string()]);
        assert!(dict.lookup("なし").is_empty());
    }

    #[test]
    fn suppression_matches_pair_and_surface_only() {
        let dict = SuppressionDictionary::from_entries(vec![
            ("蛾".to_string(), "が".to_string()),
            ("広告".to_string(), String::new()),
        ]);
        assert!(dict.suppressed("蛾", "が"));
        assert!(!dict.suppressed("蛾", "げ"));
        assert!(dict.suppressed("広告", "こうこく"));
        assert!(dict.suppressed("広告", "なんでも"));
        assert!(!dict.is_empty());
    }
}
