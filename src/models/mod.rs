pub mod question;
pub mod resume;
pub mod session;

pub use question::{QaPair, Question, MASTER_QUESTIONS};
pub use resume::{ResumeFile, ResumeSource};
pub use session::{
    EvaluationState, InterviewConfig, RecordingState, SessionStage, UploadState,
};
