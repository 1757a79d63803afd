//! `rewriter`：候选后处理（抑制/追加/去重/排序/裁剪）。
//!
//! 当前流水线（`RewriterPipeline::new` 默认组装）：
//! - `SuppressionRewriter`：按抑制词典丢弃候选
//! - `KatakanaRewriter`：追加整段读音的片假名直写候选
//! - `DedupSortTruncate`：按 weight 倒序、按 (text, span) 去重、截断到 limit

use std::sync::Arc;

use crate::dictionary::SuppressionDictionary;
use crate::model::{Candidate, Profile};
use crate::modules::Modules;

/// 一次 rewrite 的输入上下文（读音与拍切分，供各 rewriter 还原候选覆盖的读音子串）。
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    pub reading: String,
    pub segment: Vec<String>,
}

impl RewriteRequest {
    /// 候选覆盖的读音子串（拍子串按序拼接）。
    pub fn span_reading(&self, candidate: &Candidate) -> String {
        let end = candidate.segment_end.min(self.segment.len());
        let start = candidate.segment_start.min(end);
        self.segment[start..end].concat()
    }
}

/// Rewriter：对候选列表做一次后处理。
pub trait Rewriter: Send + Sync {
    fn rewrite(&self, request: &RewriteRequest, candidates: Vec<Candidate>) -> Vec<Candidate>;
}

/// 抑制词典过滤：命中 (surface, reading) 对或 surface 单独规则的候选整条丢弃。
pub struct SuppressionRewriter {
    suppression: Arc<SuppressionDictionary>,
}

impl SuppressionRewriter {
    pub fn new(suppression: Arc<SuppressionDictionary>) -> Self {
        Self { suppression }
    }
}

impl Rewriter for SuppressionRewriter {
    fn rewrite(&self, request: &RewriteRequest, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        if self.suppression.is_empty() {
            return candidates;
        }
        candidates.retain(|c| {
            let reading = request.span_reading(c);
            !self.suppression.suppressed(&c.text, &reading)
        });
        candidates
    }
}

/// 片假名候选：整段读音可直写为片假名时追加一条低权重候选。
pub struct KatakanaRewriter;

impl Rewriter for KatakanaRewriter {
    fn rewrite(&self, request: &RewriteRequest, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        if !henkan_kana::is_hiragana(&request.reading) {
            return candidates;
        }
        let katakana = henkan_kana::hiragana_to_katakana(&request.reading);
        candidates.push(Candidate {
            text: katakana,
            comment: Some("カタカナ".to_string()),
            weight: -1,
            segment_start: 0,
            segment_end: request.segment.len(),
        });
        candidates
    }
}

/// 默认收尾：按 weight 倒序排序，按 (text, span) 去重，截断到 limit。
pub struct DedupSortTruncate {
    pub limit: u8,
}

impl Rewriter for DedupSortTruncate {
    fn rewrite(&self, _request: &RewriteRequest, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        let limit = usize::from(self.limit.max(1));
        candidates.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.text.cmp(&b.text)));
        candidates.dedup_by(|a, b| {
            a.text == b.text && a.segment_start == b.segment_start && a.segment_end == b.segment_end
        });
        candidates.truncate(limit);
        candidates
    }
}

/// 按 profile 组装的默认 rewriter 流水线。
pub struct RewriterPipeline {
    rewriters: Vec<Box<dyn Rewriter>>,
}

impl RewriterPipeline {
    pub fn new(modules: &Modules, profile: Profile) -> Self {
        let rewriters: Vec<Box<dyn Rewriter>> = vec![
            Box::new(SuppressionRewriter::new(Arc::clone(
                modules.suppression_dictionary(),
            ))),
            Box::new(KatakanaRewriter),
            Box::new(DedupSortTruncate {
                limit: profile.candidate_limit(),
            }),
        ];
        Self { rewriters }
    }
}

impl Rewriter for RewriterPipeline {
    fn rewrite(&self, request: &RewriteRequest, candidates: Vec<Candidate>) -> Vec<Candidate> {
        self.rewriters
            .iter()
            .fold(candidates, |acc, r| r.rewrite(request, acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str, weight: i32, start: usize, end: usize) -> Candidate {
        Candidate {
            text: text.to_string(),
            comment: None,
            weight,
            segment_start: start,
            segment_end: end,
        }
    }

    fn request(reading: &str) -> RewriteRequest {
        RewriteRequest {
            reading: reading.to_string(),
            segment: henkan_kana::morae(reading),
        }
    }

    #[test]
    fn suppression_drops_matching_candidate() {
        let suppression = Arc::new(SuppressionDictionary::from_entries(vec![(
            "蛾".to_string(),
            "が".to_string(),
        )]));
        let r = SuppressionRewriter::new(suppression);
        let out = r.rewrite(
            &request("が"),
            vec![candidate("蛾", 100, 0, 1), candidate("画", 50, 0, 1)],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "画");
    }

    #[test]
    fn katakana_appended_for_hiragana_reading() {
        let out = KatakanaRewriter.rewrite(&request("てんき"), Vec::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "テンキ");
        assert_eq!(out[0].comment.as_deref(), Some("カタカナ"));
    }

    #[test]
    fn dedup_sort_truncate_orders_by_weight() {
        let r = DedupSortTruncate { limit: 2 };
        let out = r.rewrite(
            &request("は"),
            vec![
                candidate("歯", 2500, 0, 1),
                candidate("葉", 2000, 0, 1),
                candidate("歯", 2500, 0, 1),
                candidate("波", 1500, 0, 1),
            ],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "歯");
        assert_eq!(out[1].text, "葉");
    }
}
