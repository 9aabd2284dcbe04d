use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use interview_orchestrator::models::{InterviewConfig, ResumeSource};
use interview_orchestrator::services::score_reconciler::ANIMATION_STEPS;
use interview_orchestrator::utils::logging;
use interview_orchestrator::{
    Config, HttpBackend, ResumeFile, SessionHandle, SessionRunner, SessionStage, Timings,
    UserAction,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    let backend = Arc::new(HttpBackend::new(&config));
    let handle = SessionRunner::spawn(&config, backend);

    run_scripted_session(&handle, &config.timings).await?;

    handle.shutdown();
    Ok(())
}

/// 脚本参数
struct ScriptPlan {
    config: InterviewConfig,
    resume: Option<ResumeFile>,
}

impl ScriptPlan {
    /// 从环境变量读取脚本参数
    ///
    /// - `INTERVIEW_COMPANY` / `INTERVIEW_ROLE`: 公司与岗位
    /// - `INTERVIEW_QUESTIONS`: 题目数量
    /// - `INTERVIEW_RESUME`: 可选的简历路径，缺省时跳过上传
    async fn from_env() -> Result<Self> {
        let count = match std::env::var("INTERVIEW_QUESTIONS") {
            Ok(value) => value
                .trim()
                .parse()
                .with_context(|| format!("INTERVIEW_QUESTIONS 不是合法数字: {}", value))?,
            Err(_) => 3,
        };

        let resume = match std::env::var("INTERVIEW_RESUME") {
            Ok(path) => Some(
                ResumeFile::from_path(Path::new(&path))
                    .await
                    .with_context(|| format!("无法读取简历: {}", path))?,
            ),
            Err(_) => None,
        };

        let plan = Self {
            config: InterviewConfig {
                company_name: std::env::var("INTERVIEW_COMPANY")
                    .unwrap_or_else(|_| "Acme".to_string()),
                job_role: std::env::var("INTERVIEW_ROLE").unwrap_or_else(|_| "Engineer".to_string()),
                num_questions: count,
                resume: None,
            },
            resume,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// 会话会拒绝的输入提前报错，避免脚本卡在等待上
    fn validate(&self) -> Result<()> {
        if !self.config.is_complete() {
            bail!("INTERVIEW_COMPANY 和 INTERVIEW_ROLE 不能为空");
        }
        if !InterviewConfig::is_valid_question_count(self.config.num_questions) {
            bail!(
                "INTERVIEW_QUESTIONS 必须在 3..=10 之间，当前为 {}",
                self.config.num_questions
            );
        }
        if let Some(resume) = &self.resume {
            if !resume.is_accepted_from(ResumeSource::Browse) {
                bail!("不支持的简历格式: {}（仅支持 pdf / txt）", resume.name);
            }
        }
        Ok(())
    }
}

/// 按固定脚本跑完一次面试
async fn run_scripted_session(handle: &SessionHandle, timings: &Timings) -> Result<()> {
    let plan = ScriptPlan::from_env().await?;

    handle.send(UserAction::Begin);
    handle.send(UserAction::SetCompanyName(plan.config.company_name));
    handle.send(UserAction::SetJobRole(plan.config.job_role));
    handle.send(UserAction::SetQuestionCount(plan.config.num_questions));
    handle.send(UserAction::ProceedToUpload);

    let upload = handle
        .wait_for(|s| s.state.stage == SessionStage::Upload)
        .await
        .context("会话未进入上传阶段")?;
    info!("📋 共 {} 道题", upload.state.config.num_questions);

    match plan.resume {
        Some(resume) => handle.send(UserAction::SelectResume(resume)),
        None => handle.send(UserAction::SkipUpload),
    };

    let interview = handle
        .wait_for(|s| s.state.stage == SessionStage::Interview)
        .await
        .context("会话未进入面试阶段")?;

    for index in 0..interview.state.questions.len() {
        let ready = handle
            .wait_for(|s| s.state.ready_to_record() && s.state.questions.cursor() == index)
            .await
            .context("等待录音就绪失败")?;
        if let Some(question) = ready.state.questions.current() {
            info!("❓ Q{}: {}", question.id, question.text);
        }
        handle.send(UserAction::ToggleRecording);

        handle
            .wait_for(|s| {
                s.state.stage == SessionStage::Results || s.state.questions.cursor() > index
            })
            .await
            .context("等待作答完成失败")?;
    }

    handle
        .wait_for(|s| s.state.stage == SessionStage::Results && !s.state.evaluation.backend_pending)
        .await
        .context("等待评测结果失败")?;

    // 留出分数动画的时间
    tokio::time::sleep(timings.score_tick() * ANIMATION_STEPS).await;
    let results = handle.snapshot();

    if results.state.evaluation.backend_feedback.is_none() {
        warn!("⚠️ 未收到后端反馈");
    }
    logging::log_session_summary(&results);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(company: &str, role: &str, count: u8, resume: Option<ResumeFile>) -> ScriptPlan {
        ScriptPlan {
            config: InterviewConfig {
                company_name: company.to_string(),
                job_role: role.to_string(),
                num_questions: count,
                resume: None,
            },
            resume,
        }
    }

    #[test]
    fn test_valid_plan_passes() {
        let pdf = ResumeFile::new("cv.pdf", "application/pdf", b"%PDF".to_vec());
        assert!(plan("Acme", "Engineer", 3, Some(pdf)).validate().is_ok());
        assert!(plan("Acme", "Engineer", 10, None).validate().is_ok());
    }

    #[test]
    fn test_blank_company_or_role_is_rejected_up_front() {
        assert!(plan("", "Engineer", 3, None).validate().is_err());
        assert!(plan("Acme", "  ", 3, None).validate().is_err());
    }

    #[test]
    fn test_out_of_range_count_is_rejected_up_front() {
        assert!(plan("Acme", "Engineer", 2, None).validate().is_err());
        assert!(plan("Acme", "Engineer", 11, None).validate().is_err());
    }

    #[test]
    fn test_unsupported_resume_is_rejected_up_front() {
        let docx = ResumeFile::new("cv.docx", "application/msword", vec![0]);
        let err = plan("Acme", "Engineer", 3, Some(docx)).validate().unwrap_err();
        assert!(err.to_string().contains("cv.docx"));
    }
}
