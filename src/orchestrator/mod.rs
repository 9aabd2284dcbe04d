//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session_machine` - 会话状态机
//! - 持有会话数据，校验所有阶段迁移
//! - 纯同步逻辑，输入事件、输出副作用
//!
//! ### `session_runner` - 会话运行器
//! - 唯一的事件队列，逐个消费事件
//! - 把副作用落地为定时器任务和后端请求
//! - 通过 watch 通道发布快照
//!
//! ## 层次关系
//!
//! ```text
//! session_runner (事件循环)
//!     ↓
//! session_machine (状态与守卫)
//!     ↓
//! workflow::QuestionQueue / services (模拟器、网关、分数协调)
//!     ↓
//! clients (HTTP)
//! ```

pub mod session_machine;
pub mod session_runner;

pub use session_machine::{Outcome, SessionMachine, SessionSnapshot, SessionState};
pub use session_runner::{SessionHandle, SessionRunner};
