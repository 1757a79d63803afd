//! `converter`：把读音变换为排好序的候选列表。
//!
//! `DictConverter` 的流水线：
//! - segmenter：读音 -> 拍序列
//! - 直查（整段）+ 单词候选（从头枚举 1..=max_word_length 拍）
//! - 组句候选（beam search，覆盖整段；相邻词按接续表加权）
//! - rewriter：抑制/片假名/去重排序裁剪

use std::sync::Arc;

use crate::dictionary::{Token, USER_POS};
use crate::error::InitError;
use crate::model::{Candidate, Profile};
use crate::modules::Modules;
use crate::rewriter::{Rewriter, RewriterPipeline, RewriteRequest};

/// 用户词典词条的合并加权（用户词优先于主词典）。
const USER_WEIGHT_BONUS: i32 = 5000;

/// Converter：读音 -> 候选。实现必须对任意输入都不 panic。
pub trait Converter: Send + Sync {
    fn convert(&self, reading: &str, limit: usize) -> Vec<Candidate>;
}

/// 词典 converter：查词 + 组句 + 后处理。
pub struct DictConverter {
    modules: Arc<Modules>,
    rewriter: RewriterPipeline,
    /// 单个词候选最多覆盖的拍数
    max_word_length: u8,
    /// 每个跨度查询最多取多少条（控制组合规模）
    per_span_limit: usize,
}

impl std::fmt::Debug for DictConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictConverter")
            .field("max_word_length", &self.max_word_length)
            .field("per_span_limit", &self.per_span_limit)
            .finish_non_exhaustive()
    }
}

impl DictConverter {
    /// 构建失败（词典与用户词典都为空）时整体放弃，
    /// 调用方必须保持旧的 converter 不动。
    pub fn new(modules: Arc<Modules>, profile: Profile) -> Result<Self, InitError> {
        if modules.dictionary().is_empty() && modules.user_dictionary().is_empty() {
            return Err(InitError::EmptyDictionary);
        }
        let rewriter = RewriterPipeline::new(&modules, profile);
        Ok(Self {
            modules,
            rewriter,
            max_word_length: 4,
            per_span_limit: 16,
        })
    }

    /// 查询拍范围 `segment[start..end]`：主词典 + 用户词典（加权合并）。
    fn lookup_tokens(
        &self,
        segment: &[String],
        start: usize,
        end: usize,
        limit: usize,
    ) -> Vec<Token> {
        let mut out = self
            .modules
            .dictionary()
            .lookup_span(segment, start, end, limit);
        let key: String = segment[start..end].concat();
        for mut token in self.modules.user_dictionary().lookup(&key) {
            token.weight += USER_WEIGHT_BONUS;
            out.push(token);
        }
        out
    }

    fn translate(&self, segment: &[String], limit: usize) -> Vec<Candidate> {
        let limit = limit.max(1);
        let end = segment.len();
        let mut out: Vec<Candidate> = Vec::new();

        // 0) 直查整段
        for token in self.lookup_tokens(segment, 0, end, limit) {
            out.push(token_to_candidate(token, 0, end));
        }

        // 1) 单词候选（从头枚举长度 1..=max_word_length 拍；整段由直查覆盖，不重复）
        let max_j = usize::from(self.max_word_length.max(1)).min(end.saturating_sub(1));
        for j in 1..=max_j {
            for token in self.lookup_tokens(segment, 0, j, self.per_span_limit.max(1)) {
                out.push(token_to_candidate(token, 0, j));
            }
        }

        // 2) 组句候选（覆盖整段）
        if out.len() < limit {
            let mut composed = self.compose_sentence_candidates(segment, limit - out.len());
            out.append(&mut composed);
        }

        out
    }

    /// beam search 组句：路径分 = 词权重之和 + 接续权重之和 + 长词结构分。
    fn compose_sentence_candidates(&self, segment: &[String], limit: usize) -> Vec<Candidate> {
        let end = segment.len();
        if limit == 0 || end == 0 {
            return Vec::new();
        }

        #[derive(Clone)]
        struct Path {
            text: String,
            score: i64,
            last_pos: Option<u16>,
        }

        let beam_k = limit.max(8).min(64);
        let mut beams: Vec<Vec<Path>> = vec![Vec::new(); end + 1];
        beams[0].push(Path {
            text: String::new(),
            score: 0,
            last_pos: None,
        });

        for i in 0..end {
            if beams[i].is_empty() {
                continue;
            }
            beams[i].sort_by(|a, b| b.score.cmp(&a.score));
            beams[i].truncate(beam_k);
            let cur_paths = beams[i].clone();

            let max_j = (i + usize::from(self.max_word_length.max(1))).min(end);
            for j in (i + 1)..=max_j {
                let words = self.lookup_tokens(segment, i, j, self.per_span_limit.max(1));
                if words.is_empty() {
                    continue;
                }
                // 结构分：优先长词
                let len_bonus = ((j - i) as i64) * 1_000;
                for p in &cur_paths {
                    for w in &words {
                        let connection = match p.last_pos {
                            Some(prev) => {
                                i64::from(self.modules.connector().weight(prev, w.pos))
                            }
                            None => 0,
                        };
                        let mut text = String::with_capacity(p.text.len() + w.surface.len());
                        text.push_str(&p.text);
                        text.push_str(&w.surface);
                        beams[j].push(Path {
                            text,
                            score: p.score + i64::from(w.weight) + connection + len_bonus,
                            last_pos: Some(w.pos),
                        });
                    }
                }
            }
        }

        let mut finals = std::mem::take(&mut beams[end]);
        finals.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.text.cmp(&b.text)));
        finals.truncate(limit);
        finals
            .into_iter()
            .map(|p| Candidate {
                text: p.text,
                comment: Some("compose".to_string()),
                weight: p.score.min(i64::from(i32::MAX)) as i32,
                segment_start: 0,
                segment_end: end,
            })
            .collect()
    }
}

/// 词条 -> 候选。结构分（每拍 1000）与组句路径同尺度，
/// 否则整段直查永远输给组句候选。
fn token_to_candidate(token: Token, start: usize, end: usize) -> Candidate {
    let len_bonus = ((end - start) as i32) * 1_000;
    Candidate {
        text: token.surface,
        comment: (token.pos == USER_POS).then(|| "ユーザー辞書".to_string()),
        weight: token.weight.saturating_add(len_bonus),
        segment_start: start,
        segment_end: end,
    }
}

impl Converter for DictConverter {
    fn convert(&self, reading: &str, limit: usize) -> Vec<Candidate> {
        let analysis = self.modules.segmenter().segment(reading);
        if analysis.segment.is_empty() {
            return Vec::new();
        }
        let candidates = self.translate(&analysis.segment, limit);
        let request = RewriteRequest {
            reading: reading.to_string(),
            segment: analysis.segment,
        };
        self.rewriter.rewrite(&request, candidates)
    }
}
