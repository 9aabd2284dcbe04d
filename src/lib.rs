//! # Interview Orchestrator
//!
//! 模拟面试流程的会话编排核心：配置面试 → 上传简历 → 逐题录音作答 → 评测打分。
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 面试配置、题目、简历句柄、各阶段状态
//!
//! ### ② 传输层（Clients）
//! - `clients/` - 评测后端 HTTP 客户端（`/resume-score`、`/evaluate`）
//!
//! ### ③ 业务能力层（Services）
//! - `BackendGateway` - fire-and-forget 请求与结果合并
//! - `upload_simulator` / `recording_simulator` - 两个定时器模拟器
//! - `ScoreReconciler` - 占位分数动画与权威分数覆盖
//!
//! ### ④ 流程层（Workflow）
//! - `QuestionQueue` - 题目队列
//! - `events` - 事件、用户操作、副作用
//!
//! ### ⑤ 编排层（Orchestration）
//! - `SessionMachine` - 会话状态机
//! - `SessionRunner` - 单一有序事件队列
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{EvaluationBackend, EvaluationRequest, EvaluationResponse, HttpBackend};
pub use config::{Config, Timings};
pub use error::{AppError, GatewayError, GuardViolation, QueueError, Result};
pub use models::{ResumeFile, SessionStage};
pub use orchestrator::{SessionHandle, SessionMachine, SessionRunner, SessionSnapshot, SessionState};
pub use workflow::{QuestionQueue, SessionEvent, UserAction};
