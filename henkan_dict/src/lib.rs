//! `henkan_dict`：TSV 快照的 [`DataManager`] 实现。
//!
//! 一份快照是一个目录：
//!
//! - `version`              —— data version 字符串（单行，必须）
//! - `dictionary.tsv`       —— `surface<TAB>reading<TAB>pos<TAB>weight`（必须）
//! - `connection.tsv`       —— `prev_pos<TAB>next_pos<TAB>weight`（可省略）
//! - `suppression.tsv`      —— `surface[<TAB>reading]`（可省略；reading 为空表示任意读音）
//! - `user_dictionary.tsv`  —— `surface<TAB>reading<TAB>pos_name[<TAB>weight]`（可省略）
//!
//! 所有文件允许 `#` 开头注释行与空行；weight 省略时默认 0。
//! 解析在构造（`from_dir` / `from_tsv`）时一次完成，之后的 `build_*`
//! 只做廉价装配——这样加载失败能在后台构建线程里尽早上报。

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use henkan_core::connector::Connector;
use henkan_core::data_manager::DataManager;
use henkan_core::dictionary::{
    Dictionary, PrefixMatch, SuppressionDictionary, Token, UserDictionary, UserEntry,
};
use henkan_core::error::DataError;
use henkan_core::segmenter::{MoraSegmenter, Segmenter};

/// 主词典：读音 -> 词条（BTreeMap，天然支持前缀 range 扫描）。
#[derive(Debug)]
pub struct TsvDictionary {
    map: BTreeMap<String, Vec<Token>>,
}

impl TsvDictionary {
    /// 解析 `dictionary.tsv` 内容。
    pub fn from_tsv_str(s: &str) -> Result<Self, DataError> {
        let mut map: BTreeMap<String, Vec<Token>> = BTreeMap::new();
        for (idx, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut it = line.split('\t');
            let surface = it.next().unwrap_or("").trim();
            let reading = it.next().unwrap_or("").trim();
            if surface.is_empty() || reading.is_empty() {
                return Err(DataError::Format {
                    line: idx + 1,
                    message: "缺少 surface/reading".to_string(),
                });
            }
            let pos = parse_or_default::<u16>(it.next(), idx + 1, "pos")?;
            let weight = parse_or_default::<i32>(it.next(), idx + 1, "weight")?;
            map.entry(reading.to_string()).or_default().push(Token {
                surface: surface.to_string(),
                pos,
                weight,
            });
        }
        for v in map.values_mut() {
            v.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.surface.cmp(&b.surface)));
        }
        Ok(Self { map })
    }

    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}

impl Dictionary for TsvDictionary {
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
        if key.is_empty() {
            return Vec::new();
        }
        self.map
            .get(&key)
            .map(|v| v.iter().take(limit.max(1)).cloned().collect())
            .unwrap_or_default()
    }

    fn lookup_prefix(&self, key: &str, limit: usize) -> Vec<PrefixMatch> {
        let mut out = Vec::new();
        if key.is_empty() || limit == 0 {
            return out;
        }
        for (k, tokens) in self.map.range(key.to_string()..) {
            if !k.starts_with(key) {
                break;
            }
            // 精确命中交给 lookup_span；这里只出“更长的词”
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

/// TSV 快照的 DataManager。
#[derive(Debug)]
pub struct TsvDataManager {
    version: String,
    dictionary: Arc<TsvDictionary>,
    connections: Vec<(u16, u16, i32)>,
    suppressions: Vec<(String, String)>,
    user_entries: Vec<UserEntry>,
}

impl TsvDataManager {
    /// 从快照目录加载。`version` 与 `dictionary.tsv` 缺失即失败，
    /// 其余文件缺失按空内容处理。
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        let version = read_required(dir, "version")?;
        let version = version.lines().next().unwrap_or("").trim().to_string();
        let dictionary = read_required(dir, "dictionary.tsv")?;
        let connection = read_optional(dir, "connection.tsv")?;
        let suppression = read_optional(dir, "suppression.tsv")?;
        let user = read_optional(dir, "user_dictionary.tsv")?;
        tracing::debug!(dir = %dir.display(), version = %version, "TSV 快照読み込み");
        Self::from_tsv(&version, &dictionary, &connection, &suppression, &user)
    }

    /// 从内存字符串构造（测试与嵌入数据用）。
    pub fn from_tsv(
        version: &str,
        dictionary: &str,
        connection: &str,
        suppression: &str,
        user_dictionary: &str,
    ) -> Result<Self, DataError> {
        if version.trim().is_empty() {
            return Err(DataError::MissingVersion);
        }
        let dictionary = Arc::new(TsvDictionary::from_tsv_str(dictionary)?);
        let connections = parse_connection(connection)?;
        let suppressions = parse_suppression(suppression)?;
        let user_entries = parse_user_dictionary(user_dictionary)?;
        Ok(Self {
            version: version.trim().to_string(),
            dictionary,
            connections,
            suppressions,
            user_entries,
        })
    }
}

impl DataManager for TsvDataManager {
    fn data_version(&self) -> &str {
        &self.version
    }

    fn build_dictionary(&self) -> Result<Arc<dyn Dictionary>, DataError> {
        Ok(Arc::clone(&self.dictionary) as Arc<dyn Dictionary>)
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

fn read_required(dir: &Path, name: &str) -> Result<String, DataError> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DataError::MissingSection(name.to_string()))
        }
        Err(e) => Err(DataError::Io(e)),
    }
}

fn read_optional(dir: &Path, name: &str) -> Result<String, DataError> {
    match std::fs::read_to_string(dir.join(name)) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(DataError::Io(e)),
    }
}

fn parse_or_default<T: std::str::FromStr + Default>(
    field: Option<&str>,
    line: usize,
    name: &str,
) -> Result<T, DataError> {
    match field.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(T::default()),
        Some(s) => s.parse::<T>().map_err(|_| DataError::Format {
            line,
            message: format!("{name} 不是合法数值: {s}"),
        }),
    }
}

fn parse_connection(s: &str) -> Result<Vec<(u16, u16, i32)>, DataError> {
    let mut out = Vec::new();
    for (idx, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut it = line.split('\t');
        let prev = parse_required::<u16>(it.next(), idx + 1, "prev_pos")?;
        let next = parse_required::<u16>(it.next(), idx + 1, "next_pos")?;
        let weight = parse_required::<i32>(it.next(), idx + 1, "weight")?;
        out.push((prev, next, weight));
    }
    Ok(out)
}

fn parse_suppression(s: &str) -> Result<Vec<(String, String)>, DataError> {
    let mut out = Vec::new();
    for (idx, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut it = line.split('\t');
        let surface = it.next().unwrap_or("").trim();
        if surface.is_empty() {
            return Err(DataError::Format {
                line: idx + 1,
                message: "缺少 surface".to_string(),
            });
        }
        let reading = it.next().unwrap_or("").trim();
        out.push((surface.to_string(), reading.to_string()));
    }
    Ok(out)
}

fn parse_user_dictionary(s: &str) -> Result<Vec<UserEntry>, DataError> {
    let mut out = Vec::new();
    for (idx, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut it = line.split('\t');
        let surface = it.next().unwrap_or("").trim();
        let reading = it.next().unwrap_or("").trim();
        let pos_name = it.next().unwrap_or("").trim();
        if surface.is_empty() || reading.is_empty() || pos_name.is_empty() {
            return Err(DataError::Format {
                line: idx + 1,
                message: "缺少 surface/reading/pos_name".to_string(),
            });
        }
        let weight = parse_or_default::<i32>(it.next(), idx + 1, "weight")?;
        out.push(UserEntry {
            surface: surface.to_string(),
            reading: reading.to_string(),
            pos_name: pos_name.to_string(),
            weight,
        });
    }
    Ok(out)
}

fn parse_required<T: std::str::FromStr>(
    field: Option<&str>,
    line: usize,
    name: &str,
) -> Result<T, DataError> {
    let s = field.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        DataError::Format {
            line,
            message: format!("缺少 {name}"),
        }
    })?;
    s.parse::<T>().map_err(|_| DataError::Format {
        line,
        message: format!("{name} 不是合法数值: {s}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use henkan_core::modules::Modules;

    const DICT: &str = "\
# surface\treading\tpos\tweight
天気\tてんき\t1\t6000
私\tわたし\t1\t6000
は\tは\t2\t4000
";

    #[test]
    fn parses_dictionary_and_builds_modules() {
        let manager =
            TsvDataManager::from_tsv("24.1", DICT, "1\t2\t3000\n", "蛾\tが\n", "技術\tぎじゅつ\t名詞\t7000\n")
                .expect("manager");
        assert_eq!(manager.data_version(), "24.1");
        let modules = Modules::build(&manager).expect("modules");
        assert_eq!(modules.data_version(), "24.1");
        assert_eq!(modules.connector().weight(1, 2), 3000);
        assert!(modules.suppression_dictionary().suppressed("蛾", "が"));
        assert_eq!(modules.user_dictionary().pos_list(), &["名詞".to_string()]);
    }

    #[test]
    fn lookup_span_and_prefix() {
        let dict = TsvDictionary::from_tsv_str(DICT).expect("dict");
        let segment: Vec<String> = vec!["て".into(), "ん".into(), "き".into()];
        let tokens = dict.lookup_span(&segment, 0, 3, 9);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].surface, "天気");

        let matches = dict.lookup_prefix("て", 9);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, "てんき");
        // 精确命中は出さない
        assert!(dict.lookup_prefix("てんき", 9).is_empty());
    }

    #[test]
    fn omitted_pos_entry_is_not_user_labeled() {
        use henkan_core::converter::{Converter, DictConverter};
        use henkan_core::model::Profile;

        // pos 列省略 -> 默认 0，不得与用户词条的保留 id 混淆
        let manager = TsvDataManager::from_tsv(
            "24.1",
            "天気\tてんき\n",
            "",
            "",
            "技術\tぎじゅつ\t名詞\t7000\n",
        )
        .expect("manager");
        let modules = Arc::new(Modules::build(&manager).expect("modules"));
        let converter = DictConverter::new(modules, Profile::Desktop).expect("converter");

        let out = converter.convert("てんき", 9);
        let hit = out.iter().find(|c| c.text == "天気").expect("hit");
        assert_eq!(hit.comment, None);

        let out = converter.convert("ぎじゅつ", 9);
        assert_eq!(out[0].comment.as_deref(), Some("ユーザー辞書"));
    }

    #[test]
    fn format_error_carries_line_number() {
        let err = TsvDictionary::from_tsv_str("天気\tてんき\n壊れた行\n").unwrap_err();
        match err {
            DataError::Format { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_weight_is_format_error() {
        let err = TsvDictionary::from_tsv_str("天気\tてんき\t1\txyz\n").unwrap_err();
        assert!(matches!(err, DataError::Format { line: 1, .. }));
    }

    #[test]
    fn missing_version_rejected() {
        let err = TsvDataManager::from_tsv("", DICT, "", "", "").unwrap_err();
        assert!(matches!(err, DataError::MissingVersion));
    }

    #[test]
    fn missing_files_in_dir() {
        let err = TsvDataManager::from_dir("/nonexistent/henkan-data").unwrap_err();
        assert!(matches!(err, DataError::MissingSection(_)));
    }
}
