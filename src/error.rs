use thiserror::Error;

use crate::models::session::SessionStage;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 后端调用错误
    #[error("后端错误: {0}")]
    Gateway(#[from] GatewayError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 后端网关错误
///
/// 只在网关内部流转，状态机会把它转换成 `backend_feedback` 里的失败标记，
/// 不会向外抛出。
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 后端返回非 2xx 状态码
    #[error("后端返回错误状态 ({endpoint}): {status}, body={body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 响应体不是合法 JSON
    #[error("响应解析失败 ({endpoint}): {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    /// 简历文件无法组装成 multipart 请求
    #[error("简历文件无效: {0}")]
    InvalidResume(String),
}

impl GatewayError {
    /// 是否为"后端明确拒绝"（区别于网络/解析异常）
    pub fn is_status(&self) -> bool {
        matches!(self, GatewayError::Status { .. })
    }
}

/// 状态迁移守卫失败
///
/// 被拒绝的迁移不会修改任何状态。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardViolation {
    #[error("当前阶段 {stage:?} 不允许该操作: {action}")]
    WrongStage {
        stage: SessionStage,
        action: &'static str,
    },
    #[error("公司名称和职位都必须填写")]
    MissingRequiredFields,
    #[error("题目数量 {0} 超出范围 [3, 10]")]
    QuestionCountOutOfRange(u8),
    #[error("不支持的简历文件: {name} ({mime})")]
    UnsupportedResume { name: String, mime: String },
    #[error("上传已在进行中")]
    UploadInProgress,
    #[error("当前题目已作答或正在等待提交")]
    AnswerPending,
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// 题目队列错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("题目队列尚未初始化")]
    NotInterviewing,
    #[error("第 {0} 题已经作答")]
    AlreadyAnswered(usize),
    #[error("第 {0} 题尚未作答")]
    Unanswered(usize),
    #[error("已经是最后一题，应进入结果阶段")]
    AtLastQuestion,
    #[error("题目已全部完成")]
    Exhausted,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 数值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
