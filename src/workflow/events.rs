//! 事件与副作用
//!
//! 所有输入（用户操作、定时器、后端回包）都是 [`SessionEvent`]，
//! 由唯一的事件队列逐个交给状态机；状态机只返回 [`Effect`]，
//! 由运行器负责真正启动定时器或发起请求。

use std::time::Duration;

use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

use crate::clients::{EvaluationRequest, EvaluationResponse};
use crate::error::GatewayError;
use crate::models::resume::ResumeFile;

/// 定时器片段 ID（全局递增，永不复用）
pub type EpisodeId = u64;
/// 会话代号（每次重置 +1）
pub type SessionId = u64;

/// 事件队列发送端
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
/// 事件队列接收端
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// 用户操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Landing → Setup
    Begin,
    SetCompanyName(String),
    SetJobRole(String),
    SetQuestionCount(u8),
    /// Setup → Upload
    ProceedToUpload,
    /// 通过文件选择框选中简历
    SelectResume(ResumeFile),
    /// 拖拽简历
    DropResume(ResumeFile),
    ClearResume,
    /// Upload → Interview
    SkipUpload,
    /// Upload → Setup
    BackToSetup,
    ToggleRecording,
    /// Results → Landing
    Restart,
}

/// 会话事件
#[derive(Debug)]
pub enum SessionEvent {
    User(UserAction),
    UploadProgressed {
        episode: EpisodeId,
        progress: u8,
    },
    UploadCompleted {
        episode: EpisodeId,
    },
    AnswerAutoCaptured {
        episode: EpisodeId,
        answer: String,
    },
    AnswerSubmitted {
        episode: EpisodeId,
    },
    AdvanceDue {
        episode: EpisodeId,
    },
    ScoreTick {
        episode: EpisodeId,
    },
    ResumeScored {
        session: SessionId,
        outcome: Result<JsonValue, GatewayError>,
    },
    EvaluationResolved {
        session: SessionId,
        outcome: Result<EvaluationResponse, GatewayError>,
    },
}

impl SessionEvent {
    /// 日志用的简短名称
    pub fn label(&self) -> &'static str {
        match self {
            SessionEvent::User(action) => match action {
                UserAction::Begin => "Begin",
                UserAction::SetCompanyName(_) => "SetCompanyName",
                UserAction::SetJobRole(_) => "SetJobRole",
                UserAction::SetQuestionCount(_) => "SetQuestionCount",
                UserAction::ProceedToUpload => "ProceedToUpload",
                UserAction::SelectResume(_) => "SelectResume",
                UserAction::DropResume(_) => "DropResume",
                UserAction::ClearResume => "ClearResume",
                UserAction::SkipUpload => "SkipUpload",
                UserAction::BackToSetup => "BackToSetup",
                UserAction::ToggleRecording => "ToggleRecording",
                UserAction::Restart => "Restart",
            },
            SessionEvent::UploadProgressed { .. } => "UploadProgressed",
            SessionEvent::UploadCompleted { .. } => "UploadCompleted",
            SessionEvent::AnswerAutoCaptured { .. } => "AnswerAutoCaptured",
            SessionEvent::AnswerSubmitted { .. } => "AnswerSubmitted",
            SessionEvent::AdvanceDue { .. } => "AdvanceDue",
            SessionEvent::ScoreTick { .. } => "ScoreTick",
            SessionEvent::ResumeScored { .. } => "ResumeScored",
            SessionEvent::EvaluationResolved { .. } => "EvaluationResolved",
        }
    }
}

impl From<UserAction> for SessionEvent {
    fn from(action: UserAction) -> Self {
        SessionEvent::User(action)
    }
}

/// 状态机要求运行器执行的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartUpload {
        episode: EpisodeId,
    },
    StartRecording {
        episode: EpisodeId,
    },
    ScheduleAdvance {
        episode: EpisodeId,
        delay: Duration,
    },
    StartScoreAnimation {
        episode: EpisodeId,
    },
    CancelTimer {
        episode: EpisodeId,
    },
    /// 会话重置时取消所有定时器（不影响在途请求）
    CancelAllTimers,
    ScoreResume {
        session: SessionId,
        resume: ResumeFile,
        role: String,
    },
    Evaluate {
        session: SessionId,
        request: EvaluationRequest,
    },
}
