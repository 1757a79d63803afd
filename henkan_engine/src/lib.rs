//! `henkan_engine`：引擎的重载与版本管理层。
//!
//! 职责：
//! - 持有当前生效的一代资源（`Modules` + 派生的 converter/predictor）
//! - 接收重载请求（单调递增的 data id），在后台线程异步构建新快照
//! - 构建完成后**一次性整体换装**（cutover）：读者要么看到旧一代、要么看到新一代，
//!   绝不会看到混搭
//! - 初始化成功之前由 [`minimal::MinimalEngine`] 兜底，只读接口永不失败
//!
//! 并发模型：单一控制线程驱动请求/轮询/安装；重活（快照构建）放到
//! 后台线程，两边只通过一次性的 [`loader::ResponseFuture`] 交接，
//! 除此之外不共享可变状态。

pub mod engine;
pub mod loader;
pub mod minimal;
pub mod request;
