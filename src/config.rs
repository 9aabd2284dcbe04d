//! 程序配置
//!
//! 默认值 → TOML 文件（`INTERVIEW_CONFIG`）→ 环境变量，后者覆盖前者。

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认后端地址
pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

/// 程序配置
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 评测后端地址
    pub api_base: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 各模拟器的时间参数
    pub timings: Timings,
}

/// 模拟器时间参数（毫秒）
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// 上传进度每跳的间隔
    pub upload_tick_ms: u64,
    /// 上传进度每跳增加的百分比
    pub upload_step: u8,
    /// 进度到 100 后进入面试前的停顿
    pub upload_settle_ms: u64,
    /// 模拟录音时长
    pub recording_capture_ms: u64,
    /// 录音结束到提交答案的间隔
    pub recording_submit_ms: u64,
    /// 提交答案后切到下一题的间隔
    pub advance_delay_ms: u64,
    /// 最后一题提交后进入结果页的间隔
    pub results_delay_ms: u64,
    /// 分数动画每帧间隔
    pub score_tick_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            upload_tick_ms: 80,
            upload_step: 8,
            upload_settle_ms: 800,
            recording_capture_ms: 3000,
            recording_submit_ms: 1000,
            advance_delay_ms: 500,
            results_delay_ms: 1000,
            score_tick_ms: 25,
        }
    }
}

impl Timings {
    pub fn upload_tick(&self) -> Duration {
        Duration::from_millis(self.upload_tick_ms)
    }

    pub fn upload_settle(&self) -> Duration {
        Duration::from_millis(self.upload_settle_ms)
    }

    pub fn recording_capture(&self) -> Duration {
        Duration::from_millis(self.recording_capture_ms)
    }

    pub fn recording_submit(&self) -> Duration {
        Duration::from_millis(self.recording_submit_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn results_delay(&self) -> Duration {
        Duration::from_millis(self.results_delay_ms)
    }

    pub fn score_tick(&self) -> Duration {
        Duration::from_millis(self.score_tick_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_step == 0 || self.upload_step > 100 {
            return Err(ConfigError::Invalid {
                field: "timings.upload_step",
                reason: "必须在 1..=100 之间",
            });
        }
        if self.upload_tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timings.upload_tick_ms",
                reason: "不能为 0",
            });
        }
        if self.score_tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timings.score_tick_ms",
                reason: "不能为 0",
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            verbose_logging: false,
            timings: Timings::default(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// - `INTERVIEW_CONFIG`: 可选的 TOML 配置文件路径
    /// - `INTERVIEW_API_BASE`: 后端地址
    /// - `VERBOSE_LOGGING`: 是否输出详细日志
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("INTERVIEW_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(&path))?,
            _ => Self::default(),
        };

        if let Ok(api_base) = std::env::var("INTERVIEW_API_BASE") {
            if !api_base.trim().is_empty() {
                config.api_base = api_base;
            }
        }

        if let Ok(value) = std::env::var("VERBOSE_LOGGING") {
            config.verbose_logging =
                value
                    .parse()
                    .map_err(|_| ConfigError::EnvVarParseFailed {
                        var_name: "VERBOSE_LOGGING".to_string(),
                        value,
                        expected_type: "bool",
                    })?;
        }

        config.normalize()
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::TomlParseFailed { source, .. } => ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
                path: String::new(),
                source,
            })?;
        config.normalize()
    }

    fn normalize(mut self) -> Result<Self, ConfigError> {
        self.api_base = self.api_base.trim().trim_end_matches('/').to_string();
        if self.api_base.is_empty() {
            self.api_base = DEFAULT_API_BASE.to_string();
        }
        self.timings.validate()?;
        Ok(self)
    }

    /// 拼接后端接口地址
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}
