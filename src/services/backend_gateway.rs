//! 后端网关 - 业务能力层
//!
//! 负责两件事：
//! - 把请求以 fire-and-forget 的方式发出去，结果作为事件送回队列
//! - 在状态机内部把结果合并进 `EvaluationState`（失败标记、忙碌标志）

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::clients::{EvaluationBackend, EvaluationRequest, EvaluationResponse};
use crate::error::GatewayError;
use crate::models::resume::ResumeFile;
use crate::models::session::EvaluationState;
use crate::utils::logging::truncate_text;
use crate::workflow::{EventSender, SessionEvent, SessionId};

pub const RESUME_UPLOAD_FAILED: &str = "Resume upload failed";
pub const RESUME_UPLOAD_ERROR: &str = "Error uploading resume";
pub const EVALUATION_FAILED: &str = "Evaluation failed";
pub const EVALUATION_ERROR: &str = "Error during evaluation";

/// 网关的状态记账
///
/// `backend_pending` 是"至少有一个请求在途"，用计数实现。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackendGateway {
    in_flight: u32,
}

impl BackendGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// 发出请求前调用
    pub fn begin(&mut self, state: &mut EvaluationState) {
        self.in_flight += 1;
        state.backend_pending = true;
    }

    /// 合并简历评分结果
    pub fn absorb_resume_score(
        &mut self,
        state: &mut EvaluationState,
        outcome: Result<JsonValue, GatewayError>,
    ) {
        self.finish(state);
        match outcome {
            Ok(value) => {
                let text = value.to_string();
                info!("📄 简历评分返回: {}", truncate_text(&text, 120));
                state.backend_feedback = Some(text);
            }
            Err(e) => {
                warn!("⚠️ 简历评分失败: {}", e);
                let marker = if e.is_status() {
                    RESUME_UPLOAD_FAILED
                } else {
                    RESUME_UPLOAD_ERROR
                };
                state.backend_feedback = Some(marker.to_string());
            }
        }
    }

    /// 合并评测结果，返回权威分数（如有）
    ///
    /// 分数本身由调用方交给 `ScoreReconciler`，这里只处理反馈文本。
    pub fn absorb_evaluation(
        &mut self,
        state: &mut EvaluationState,
        outcome: Result<EvaluationResponse, GatewayError>,
    ) -> Option<u8> {
        self.finish(state);
        match outcome {
            Ok(response) => {
                let score = response.authoritative_score();
                info!("📊 评测返回: 分数 {:?}", score);
                if let Some(feedback) = response.feedback {
                    state.backend_feedback = Some(feedback);
                }
                score
            }
            Err(e) => {
                warn!("⚠️ 评测失败: {}", e);
                let marker = if e.is_status() {
                    EVALUATION_FAILED
                } else {
                    EVALUATION_ERROR
                };
                state.backend_feedback = Some(marker.to_string());
                None
            }
        }
    }

    fn finish(&mut self, state: &mut EvaluationState) {
        self.in_flight = self.in_flight.saturating_sub(1);
        state.backend_pending = self.in_flight > 0;
    }
}

/// 发送简历评分请求，结果作为 `ResumeScored` 事件送回
pub async fn dispatch_resume_score(
    backend: Arc<dyn EvaluationBackend>,
    session: SessionId,
    resume: ResumeFile,
    role: String,
    events: EventSender,
) {
    let outcome = backend.score_resume(resume, role).await;
    if events
        .send(SessionEvent::ResumeScored { session, outcome })
        .is_err()
    {
        warn!("会话已结束，丢弃简历评分结果");
    }
}

/// 发送评测请求，结果作为 `EvaluationResolved` 事件送回
pub async fn dispatch_evaluation(
    backend: Arc<dyn EvaluationBackend>,
    session: SessionId,
    request: EvaluationRequest,
    events: EventSender,
) {
    let outcome = backend.evaluate(request).await;
    if events
        .send(SessionEvent::EvaluationResolved { session, outcome })
        .is_err()
    {
        warn!("会话已结束，丢弃评测结果");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_error(status: u16) -> GatewayError {
        GatewayError::Status {
            endpoint: "http://localhost:5000/evaluate".to_string(),
            status,
            body: "boom".to_string(),
        }
    }

    fn decode_error() -> GatewayError {
        GatewayError::Decode {
            endpoint: "http://localhost:5000/evaluate".to_string(),
            source: serde_json::from_str::<JsonValue>("<html>").unwrap_err(),
        }
    }

    #[test]
    fn test_pending_flag_uses_or_semantics() {
        let mut gateway = BackendGateway::new();
        let mut state = EvaluationState::default();

        gateway.begin(&mut state);
        gateway.begin(&mut state);
        assert!(state.backend_pending);

        gateway.absorb_resume_score(&mut state, Ok(json!({ "score": 7 })));
        assert!(state.backend_pending, "one request is still in flight");

        gateway.absorb_evaluation(&mut state, Ok(EvaluationResponse::default()));
        assert!(!state.backend_pending);
        assert_eq!(gateway.in_flight(), 0);
    }

    #[test]
    fn test_resume_success_stores_json_text() {
        let mut gateway = BackendGateway::new();
        let mut state = EvaluationState::default();
        gateway.begin(&mut state);

        gateway.absorb_resume_score(&mut state, Ok(json!({ "role": "Engineer" })));
        assert_eq!(
            state.backend_feedback.as_deref(),
            Some(r#"{"role":"Engineer"}"#)
        );
    }

    #[test]
    fn test_failure_markers_distinguish_status_from_exception() {
        let mut gateway = BackendGateway::new();
        let mut state = EvaluationState::default();

        gateway.absorb_resume_score(&mut state, Err(status_error(400)));
        assert_eq!(state.backend_feedback.as_deref(), Some(RESUME_UPLOAD_FAILED));

        gateway.absorb_resume_score(&mut state, Err(decode_error()));
        assert_eq!(state.backend_feedback.as_deref(), Some(RESUME_UPLOAD_ERROR));

        assert_eq!(
            gateway.absorb_evaluation(&mut state, Err(status_error(500))),
            None
        );
        assert_eq!(state.backend_feedback.as_deref(), Some(EVALUATION_FAILED));

        assert_eq!(gateway.absorb_evaluation(&mut state, Err(decode_error())), None);
        assert_eq!(state.backend_feedback.as_deref(), Some(EVALUATION_ERROR));
        assert!(!state.backend_pending);
    }

    #[test]
    fn test_partial_evaluation_keeps_existing_feedback() {
        let mut gateway = BackendGateway::new();
        let mut state = EvaluationState {
            backend_feedback: Some("resume ok".to_string()),
            ..Default::default()
        };
        gateway.begin(&mut state);

        let score = gateway.absorb_evaluation(
            &mut state,
            Ok(EvaluationResponse {
                total_score: Some(71.0),
                feedback: None,
            }),
        );

        assert_eq!(score, Some(71));
        assert_eq!(state.backend_feedback.as_deref(), Some("resume ok"));
    }
}
