use serde::Serialize;

use crate::models::resume::ResumeFile;

/// 题目数量下限
pub const MIN_QUESTIONS: u8 = 3;
/// 题目数量上限
pub const MAX_QUESTIONS: u8 = 10;
/// 默认题目数量
pub const DEFAULT_QUESTIONS: u8 = 5;

/// 会话阶段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStage {
    /// 首页
    #[default]
    Landing,
    /// 填写公司、职位、题目数量
    Setup,
    /// 上传简历
    Upload,
    /// 答题
    Interview,
    /// 结果
    Results,
}

impl SessionStage {
    /// 是否允许修改面试配置
    pub fn accepts_config_edits(self) -> bool {
        matches!(self, SessionStage::Setup | SessionStage::Upload)
    }
}

/// 面试配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewConfig {
    pub company_name: String,
    pub job_role: String,
    pub num_questions: u8,
    pub resume: Option<ResumeFile>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            job_role: String::new(),
            num_questions: DEFAULT_QUESTIONS,
            resume: None,
        }
    }
}

impl InterviewConfig {
    /// Setup → Upload 的守卫条件
    pub fn is_complete(&self) -> bool {
        !self.company_name.trim().is_empty() && !self.job_role.trim().is_empty()
    }

    pub fn is_valid_question_count(n: u8) -> bool {
        (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&n)
    }
}

/// 上传进度
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadState {
    /// 0..=100，单次上传内只增不减
    pub progress: u8,
    pub file: Option<ResumeFile>,
}

/// 录音状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingState {
    pub is_recording: bool,
    /// 录音结束、尚未提交的答案
    pub draft_answer: Option<String>,
}

/// 评测结果展示状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationState {
    pub displayed_score: u8,
    pub backend_feedback: Option<String>,
    pub backend_pending: bool,
}
