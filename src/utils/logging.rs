/// 日志工具模块
///
/// 提供 tracing 初始化和日志格式化的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::SessionSnapshot;

/// 初始化 tracing
///
/// 优先使用 `RUST_LOG`，否则默认 `info`（verbose 时为 `debug`）。
/// 重复调用是安全的。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 模拟面试启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 评测后端: {}", config.api_base);
    info!("{}", "=".repeat(60));
}

/// 打印会话结果
pub fn log_session_summary(snapshot: &SessionSnapshot) {
    let state = &snapshot.state;
    info!("\n{}", "=".repeat(60));
    info!("📊 面试结果 (会话 #{})", snapshot.session);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "🏢 {} / {}",
        state.config.company_name, state.config.job_role
    );
    for question in state.questions.questions() {
        info!(
            "Q{}: {}\n   A: {}",
            question.id,
            question.text,
            truncate_text(question.answer.as_deref().unwrap_or("-"), 80)
        );
    }
    info!("⭐ 得分: {}", state.evaluation.displayed_score);
    if let Some(feedback) = &state.evaluation.backend_feedback {
        info!("💬 反馈: {}", truncate_text(feedback, 200));
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
