//! `henkan_core`：假名汉字变换的纯逻辑层，不做任何 I/O。
//!
//! 设计目标：
//! - **核心可复用**：CLI/GUI/服务端都能复用同一套逻辑
//! - **分层清晰**：converter -> segmenter（切拍） -> dictionary/connector（查词/接续） -> rewriter（后处理） -> 输出候选
//! - **整体换装**：所有语言资源打包为 [`modules::Modules`]，由上层（`henkan_engine`）整体构建、整体替换
pub mod connector;
pub mod converter;
pub mod data_manager;
pub mod dictionary;
pub mod error;
pub mod model;
pub mod modules;
pub mod predictor;
pub mod rewriter;
pub mod segmenter;

#[cfg(test)]
pub(crate) mod testing;
