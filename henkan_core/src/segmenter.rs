//! `segmenter`：把读音切分为拍（mora）。
//!
//! `Analysis` 同时给出拍序列与 preedit 展示；词典查询键总是由
//! 拍子串按序拼接还原，所以切分粒度只影响组句的跨度，不影响查询结果。

/// 解析结果（segment + preedit）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// 切分后的拍序列（例如 `["きょ","う"]`）
    pub segment: Vec<String>,
    /// 展示用 preedit（日文读音直接展示原串）
    pub preedit: String,
}

/// Segmenter：把读音解析为拍序列并给出 preedit。
pub trait Segmenter: Send + Sync {
    fn segment(&self, reading: &str) -> Analysis;
}

/// 拍切分器：基于 `henkan_kana::morae`。
///
/// 非平假名输入切分失败（segment 为空，preedit 保留原串），
/// converter 据此放弃该输入。
#[derive(Debug, Default)]
pub struct MoraSegmenter;

impl MoraSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl Segmenter for MoraSegmenter {
    fn segment(&self, reading: &str) -> Analysis {
        Analysis {
            segment: henkan_kana::morae(reading),
            preedit: reading.to_string(),
        }
    }
}
