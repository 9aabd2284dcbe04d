//! 会话状态机 - 编排层
//!
//! ## 职责
//!
//! - 持有唯一的 [`SessionState`]，所有修改都经过 [`SessionMachine::handle`]
//! - 校验阶段迁移的守卫条件，非法操作原样拒绝、不改状态
//! - 只产出 [`Effect`]，不睡眠、不做 I/O
//!
//! ## 迟到事件
//!
//! 定时器事件带片段 ID，后端事件带会话代号；与当前活跃值不符的事件视为过期，
//! 直接丢弃。后端结果只要属于当前会话，无论处在哪个阶段都会被合并，
//! 但永远不会触发阶段迁移，也不会碰题目队列。

use serde::Serialize;
use tracing::{debug, info};

use crate::clients::{EvaluationRequest, EvaluationResponse};
use crate::config::Timings;
use crate::error::{GatewayError, GuardViolation};
use crate::models::resume::{ResumeFile, ResumeSource};
use crate::models::session::{
    EvaluationState, InterviewConfig, RecordingState, SessionStage, UploadState,
};
use crate::services::{BackendGateway, ScoreReconciler};
use crate::workflow::{Effect, EpisodeId, QuestionQueue, SessionEvent, SessionId, UserAction};

/// 会话数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub stage: SessionStage,
    pub config: InterviewConfig,
    pub questions: QuestionQueue,
    pub upload: UploadState,
    pub recording: RecordingState,
    pub evaluation: EvaluationState,
}

impl SessionState {
    /// Setup → Upload 按钮是否可用
    pub fn can_proceed_to_upload(&self) -> bool {
        self.stage == SessionStage::Setup && self.config.is_complete()
    }

    /// 当前题是否可以开始录音
    pub fn ready_to_record(&self) -> bool {
        self.stage == SessionStage::Interview
            && !self.recording.is_recording
            && self.recording.draft_answer.is_none()
            && self.questions.current().is_some()
            && !self.questions.current_is_answered()
    }
}

/// 对外发布的会话快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// 会话代号，每次重置 +1
    pub session: SessionId,
    /// 状态版本，每个被接受的事件 +1
    pub revision: u64,
    pub state: SessionState,
}

/// 事件处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 事件已应用
    Applied(Vec<Effect>),
    /// 事件属于已取消的片段或旧会话，被丢弃
    Stale,
}

impl Outcome {
    pub fn effects(&self) -> &[Effect] {
        match self {
            Outcome::Applied(effects) => effects,
            Outcome::Stale => &[],
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Outcome::Stale)
    }
}

/// 当前活跃的定时器片段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Episodes {
    upload: Option<EpisodeId>,
    recording: Option<EpisodeId>,
    advance: Option<EpisodeId>,
    score: Option<EpisodeId>,
}

/// 会话状态机
#[derive(Debug, Clone)]
pub struct SessionMachine {
    timings: Timings,
    state: SessionState,
    session: SessionId,
    revision: u64,
    next_episode: EpisodeId,
    episodes: Episodes,
    gateway: BackendGateway,
    reconciler: ScoreReconciler,
}

impl SessionMachine {
    pub fn new(timings: Timings) -> Self {
        Self {
            timings,
            state: SessionState::default(),
            session: 0,
            revision: 0,
            next_episode: 0,
            episodes: Episodes::default(),
            gateway: BackendGateway::new(),
            reconciler: ScoreReconciler::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stage(&self) -> SessionStage {
        self.state.stage
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session,
            revision: self.revision,
            state: self.state.clone(),
        }
    }

    /// 处理一个事件
    pub fn handle(&mut self, event: SessionEvent) -> Result<Outcome, GuardViolation> {
        let outcome = match event {
            SessionEvent::User(action) => Outcome::Applied(self.on_user_action(action)?),
            SessionEvent::UploadProgressed { episode, progress } => {
                self.on_upload_progress(episode, progress)
            }
            SessionEvent::UploadCompleted { episode } => self.on_upload_completed(episode),
            SessionEvent::AnswerAutoCaptured { episode, answer } => {
                self.on_answer_captured(episode, answer)
            }
            SessionEvent::AnswerSubmitted { episode } => self.on_answer_submitted(episode)?,
            SessionEvent::AdvanceDue { episode } => self.on_advance_due(episode)?,
            SessionEvent::ScoreTick { episode } => self.on_score_tick(episode),
            SessionEvent::ResumeScored { session, outcome } => {
                self.on_resume_scored(session, outcome)
            }
            SessionEvent::EvaluationResolved { session, outcome } => {
                self.on_evaluation_resolved(session, outcome)
            }
        };

        if let Outcome::Applied(_) = outcome {
            self.revision += 1;
        }
        Ok(outcome)
    }

    // ========== 用户操作 ==========

    fn on_user_action(&mut self, action: UserAction) -> Result<Vec<Effect>, GuardViolation> {
        match action {
            UserAction::Begin => {
                self.require_stage(SessionStage::Landing, "begin")?;
                self.set_stage(SessionStage::Setup);
                Ok(Vec::new())
            }
            UserAction::SetCompanyName(name) => {
                self.require_config_edits("set company name")?;
                self.state.config.company_name = name;
                Ok(Vec::new())
            }
            UserAction::SetJobRole(role) => {
                self.require_config_edits("set job role")?;
                self.state.config.job_role = role;
                Ok(Vec::new())
            }
            UserAction::SetQuestionCount(n) => {
                self.require_config_edits("set question count")?;
                if !InterviewConfig::is_valid_question_count(n) {
                    return Err(GuardViolation::QuestionCountOutOfRange(n));
                }
                self.state.config.num_questions = n;
                Ok(Vec::new())
            }
            UserAction::ProceedToUpload => {
                self.require_stage(SessionStage::Setup, "proceed to upload")?;
                if !self.state.config.is_complete() {
                    return Err(GuardViolation::MissingRequiredFields);
                }
                self.set_stage(SessionStage::Upload);
                Ok(Vec::new())
            }
            UserAction::SelectResume(file) => self.start_upload(file, ResumeSource::Browse),
            UserAction::DropResume(file) => self.start_upload(file, ResumeSource::Drop),
            UserAction::ClearResume => {
                self.require_stage(SessionStage::Upload, "clear resume")?;
                let mut effects = Vec::new();
                cancel(&mut self.episodes.upload, &mut effects);
                self.state.config.resume = None;
                self.state.upload = UploadState::default();
                Ok(effects)
            }
            UserAction::SkipUpload => {
                self.require_stage(SessionStage::Upload, "skip upload")?;
                Ok(self.enter_interview())
            }
            UserAction::BackToSetup => {
                self.require_stage(SessionStage::Upload, "back to setup")?;
                let mut effects = Vec::new();
                cancel(&mut self.episodes.upload, &mut effects);
                self.set_stage(SessionStage::Setup);
                Ok(effects)
            }
            UserAction::ToggleRecording => self.toggle_recording(),
            UserAction::Restart => {
                self.require_stage(SessionStage::Results, "restart")?;
                Ok(self.reset())
            }
        }
    }

    fn start_upload(
        &mut self,
        file: ResumeFile,
        source: ResumeSource,
    ) -> Result<Vec<Effect>, GuardViolation> {
        self.require_stage(SessionStage::Upload, "select resume")?;
        if self.episodes.upload.is_some() {
            return Err(GuardViolation::UploadInProgress);
        }
        if !file.is_accepted_from(source) {
            return Err(GuardViolation::UnsupportedResume {
                name: file.name,
                mime: file.mime,
            });
        }

        info!("📎 选中简历 {} ({:?})", file.name, source);
        let episode = self.allocate_episode();
        self.episodes.upload = Some(episode);
        self.state.config.resume = Some(file.clone());
        self.state.upload = UploadState {
            progress: 0,
            file: Some(file.clone()),
        };
        self.gateway.begin(&mut self.state.evaluation);

        Ok(vec![
            Effect::StartUpload { episode },
            Effect::ScoreResume {
                session: self.session,
                resume: file,
                role: self.state.config.job_role.clone(),
            },
        ])
    }

    fn toggle_recording(&mut self) -> Result<Vec<Effect>, GuardViolation> {
        self.require_stage(SessionStage::Interview, "toggle recording")?;
        let mut effects = Vec::new();

        if self.state.recording.is_recording {
            // 手动停止：取消整个片段，不提交答案
            info!("⏹️ 手动停止录音");
            cancel(&mut self.episodes.recording, &mut effects);
            self.state.recording = RecordingState::default();
            return Ok(effects);
        }

        if self.episodes.recording.is_some()
            || self.episodes.advance.is_some()
            || self.state.questions.current_is_answered()
        {
            return Err(GuardViolation::AnswerPending);
        }

        let episode = self.allocate_episode();
        self.episodes.recording = Some(episode);
        self.state.recording = RecordingState {
            is_recording: true,
            draft_answer: None,
        };
        debug!("🎙️ 开始录音 #{}", episode);
        effects.push(Effect::StartRecording { episode });
        Ok(effects)
    }

    // ========== 定时器事件 ==========

    fn on_upload_progress(&mut self, episode: EpisodeId, progress: u8) -> Outcome {
        if self.episodes.upload != Some(episode) {
            return stale("UploadProgressed", episode);
        }
        self.state.upload.progress = self.state.upload.progress.max(progress.min(100));
        Outcome::Applied(Vec::new())
    }

    fn on_upload_completed(&mut self, episode: EpisodeId) -> Outcome {
        if self.episodes.upload != Some(episode) || self.state.stage != SessionStage::Upload {
            return stale("UploadCompleted", episode);
        }
        self.episodes.upload = None;
        Outcome::Applied(self.enter_interview())
    }

    fn on_answer_captured(&mut self, episode: EpisodeId, answer: String) -> Outcome {
        if self.episodes.recording != Some(episode) {
            return stale("AnswerAutoCaptured", episode);
        }
        self.state.recording.is_recording = false;
        self.state.recording.draft_answer = Some(answer);
        Outcome::Applied(Vec::new())
    }

    fn on_answer_submitted(&mut self, episode: EpisodeId) -> Result<Outcome, GuardViolation> {
        if self.episodes.recording != Some(episode) {
            return Ok(stale("AnswerSubmitted", episode));
        }
        let answer = self.state.recording.draft_answer.clone().unwrap_or_default();
        self.state.questions.record_answer(answer)?;
        self.episodes.recording = None;
        self.state.recording.draft_answer = None;

        let delay = if self.state.questions.is_last() {
            self.timings.results_delay()
        } else {
            self.timings.advance_delay()
        };
        let episode = self.allocate_episode();
        self.episodes.advance = Some(episode);
        info!(
            "✓ 第 {}/{} 题已作答",
            self.state.questions.cursor() + 1,
            self.state.questions.len()
        );

        Ok(Outcome::Applied(vec![Effect::ScheduleAdvance { episode, delay }]))
    }

    fn on_advance_due(&mut self, episode: EpisodeId) -> Result<Outcome, GuardViolation> {
        if self.episodes.advance != Some(episode) {
            return Ok(stale("AdvanceDue", episode));
        }
        if self.state.questions.is_last() {
            self.state.questions.complete()?;
            self.episodes.advance = None;
            return Ok(Outcome::Applied(self.enter_results()));
        }

        self.state.questions.advance()?;
        self.episodes.advance = None;
        self.state.recording = RecordingState::default();
        Ok(Outcome::Applied(Vec::new()))
    }

    fn on_score_tick(&mut self, episode: EpisodeId) -> Outcome {
        if self.episodes.score != Some(episode) {
            return stale("ScoreTick", episode);
        }
        self.state.evaluation.displayed_score = self.reconciler.tick();
        if !self.reconciler.is_animating() {
            self.episodes.score = None;
        }
        Outcome::Applied(Vec::new())
    }

    // ========== 后端事件 ==========

    fn on_resume_scored(
        &mut self,
        session: SessionId,
        outcome: Result<serde_json::Value, GatewayError>,
    ) -> Outcome {
        if session != self.session {
            return stale("ResumeScored", session);
        }
        self.gateway
            .absorb_resume_score(&mut self.state.evaluation, outcome);
        Outcome::Applied(Vec::new())
    }

    fn on_evaluation_resolved(
        &mut self,
        session: SessionId,
        outcome: Result<EvaluationResponse, GatewayError>,
    ) -> Outcome {
        if session != self.session {
            return stale("EvaluationResolved", session);
        }
        let mut effects = Vec::new();
        if let Some(score) = self
            .gateway
            .absorb_evaluation(&mut self.state.evaluation, outcome)
        {
            self.state.evaluation.displayed_score = self.reconciler.apply_authoritative(score);
            cancel(&mut self.episodes.score, &mut effects);
        }
        Outcome::Applied(effects)
    }

    // ========== 阶段切换 ==========

    fn enter_interview(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        cancel(&mut self.episodes.upload, &mut effects);
        self.state.questions = QuestionQueue::initialize(self.state.config.num_questions);
        self.state.recording = RecordingState::default();
        self.set_stage(SessionStage::Interview);
        effects
    }

    fn enter_results(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        cancel(&mut self.episodes.recording, &mut effects);
        self.state.recording = RecordingState::default();
        self.set_stage(SessionStage::Results);

        self.reconciler = ScoreReconciler::new();
        self.state.evaluation.displayed_score = 0;
        let episode = self.allocate_episode();
        self.episodes.score = Some(episode);
        effects.push(Effect::StartScoreAnimation { episode });

        let request = EvaluationRequest {
            company_name: self.state.config.company_name.clone(),
            job_role: self.state.config.job_role.clone(),
            qa: self.state.questions.qa_pairs(),
        };
        self.gateway.begin(&mut self.state.evaluation);
        effects.push(Effect::Evaluate {
            session: self.session,
            request,
        });
        effects
    }

    /// Results → Landing：所有会话数据恢复初始值，旧会话的迟到事件一律作废
    fn reset(&mut self) -> Vec<Effect> {
        info!("🔄 会话 #{} 重置", self.session);
        self.session += 1;
        self.state = SessionState::default();
        self.episodes = Episodes::default();
        self.gateway = BackendGateway::new();
        self.reconciler = ScoreReconciler::new();
        vec![Effect::CancelAllTimers]
    }

    // ========== 辅助方法 ==========

    fn set_stage(&mut self, stage: SessionStage) {
        info!("➡️ 阶段切换: {:?} → {:?}", self.state.stage, stage);
        self.state.stage = stage;
    }

    fn require_stage(
        &self,
        expected: SessionStage,
        action: &'static str,
    ) -> Result<(), GuardViolation> {
        if self.state.stage != expected {
            return Err(GuardViolation::WrongStage {
                stage: self.state.stage,
                action,
            });
        }
        Ok(())
    }

    fn require_config_edits(&self, action: &'static str) -> Result<(), GuardViolation> {
        if !self.state.stage.accepts_config_edits() {
            return Err(GuardViolation::WrongStage {
                stage: self.state.stage,
                action,
            });
        }
        Ok(())
    }

    fn allocate_episode(&mut self) -> EpisodeId {
        self.next_episode += 1;
        self.next_episode
    }
}

fn cancel(slot: &mut Option<EpisodeId>, effects: &mut Vec<Effect>) {
    if let Some(episode) = slot.take() {
        effects.push(Effect::CancelTimer { episode });
    }
}

fn stale(kind: &str, tag: u64) -> Outcome {
    debug!("丢弃过期事件 {} (#{})", kind, tag);
    Outcome::Stale
}
