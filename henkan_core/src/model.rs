/// 候选词（可被 UI 展示与用户选择）。
///
/// 注意：`segment_start/segment_end` 是**对当前读音拍切分结果的索引范围**，
/// 用于上层“逐段确认”的交互模型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 候选展示文本（提交文本）
    pub text: String,
    /// 备注（例如来源读音、是否 compose、カタカナ 等）
    pub comment: Option<String>,
    /// 权重（越大越靠前），由词典/接续表决定
    pub weight: i32,
    /// 覆盖的拍范围：[segment_start, segment_end)
    pub segment_start: usize,
    pub segment_end: usize,
}

/// 引擎配置类型：desktop / mobile。
///
/// 差异体现在 predictor 的选择与候选数量上限（见 `predictor` / `rewriter`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Desktop,
    Mobile,
}

impl Profile {
    /// 默认候选数量上限。
    pub fn candidate_limit(self) -> u8 {
        match self {
            Profile::Desktop => 9,
            Profile::Mobile => 5,
        }
    }
}
