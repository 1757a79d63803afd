//! `predictor`：按读音前缀补全候选。
//!
//! desktop / mobile 两套实现（Profile 的差异落在这里）：
//! - `DesktopPredictor`：保守，只做前缀补全
//! - `MobilePredictor`：激进，前缀补全之外还合并精确命中（便于小屏一次选完）

use std::sync::Arc;

use crate::model::{Candidate, Profile};
use crate::modules::Modules;

/// Predictor：读音 -> 补全候选。`name()` 供引擎的只读接口上报。
pub trait Predictor: Send + Sync {
    fn name(&self) -> &'static str;
    fn predict(&self, reading: &str, limit: usize) -> Vec<Candidate>;
}

/// 按 profile 选择 predictor 实现。
pub fn predictor_for_profile(modules: Arc<Modules>, profile: Profile) -> Box<dyn Predictor> {
    match profile {
        Profile::Desktop => Box::new(DesktopPredictor { modules }),
        Profile::Mobile => Box::new(MobilePredictor { modules }),
    }
}

pub struct DesktopPredictor {
    modules: Arc<Modules>,
}

impl Predictor for DesktopPredictor {
    fn name(&self) -> &'static str {
        "DesktopPredictor"
    }

    fn predict(&self, reading: &str, limit: usize) -> Vec<Candidate> {
        prefix_candidates(&self.modules, reading, limit.max(1))
    }
}

pub struct MobilePredictor {
    modules: Arc<Modules>,
}

impl Predictor for MobilePredictor {
    fn name(&self) -> &'static str {
        "MobilePredictor"
    }

    fn predict(&self, reading: &str, limit: usize) -> Vec<Candidate> {
        let limit = limit.max(1);
        let mut out = exact_candidates(&self.modules, reading, limit);
        if out.len() < limit {
            let mut rest = prefix_candidates(&self.modules, reading, limit - out.len());
            out.append(&mut rest);
        }
        out
    }
}

fn prefix_candidates(modules: &Modules, reading: &str, limit: usize) -> Vec<Candidate> {
    modules
        .dictionary()
        .lookup_prefix(reading, limit)
        .into_iter()
        .map(|m| Candidate {
            text: m.token.surface,
            comment: Some(m.key),
            weight: m.token.weight,
            segment_start: 0,
            segment_end: 0,
        })
        .collect()
}

fn exact_candidates(modules: &Modules, reading: &str, limit: usize) -> Vec<Candidate> {
    let analysis = modules.segmenter().segment(reading);
    if analysis.segment.is_empty() {
        return Vec::new();
    }
    let end = analysis.segment.len();
    modules
        .dictionary()
        .lookup_span(&analysis.segment, 0, end, limit)
        .into_iter()
        .map(|t| Candidate {
            text: t.surface,
            comment: None,
            weight: t.weight,
            segment_start: 0,
            segment_end: end,
        })
        .collect()
}
