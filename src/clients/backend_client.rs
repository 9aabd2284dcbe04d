/// 评测后端客户端
///
/// 封装 `/resume-score` 与 `/evaluate` 两个接口的 HTTP 调用，
/// 不做重试、不设超时（交给传输层）。
use futures::future::{BoxFuture, FutureExt};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::Config;
use crate::error::GatewayError;
use crate::models::question::QaPair;
use crate::models::resume::ResumeFile;

pub const RESUME_SCORE_PATH: &str = "resume-score";
pub const EVALUATE_PATH: &str = "evaluate";

/// `/evaluate` 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub company_name: String,
    pub job_role: String,
    pub qa: Vec<QaPair>,
}

/// `/evaluate` 响应中核心关心的字段，缺失的字段保持 None
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationResponse {
    pub total_score: Option<f64>,
    pub feedback: Option<String>,
}

impl EvaluationResponse {
    /// 按字段宽松提取，类型不对的字段视为缺失
    pub fn from_json(value: &JsonValue) -> Self {
        let total_score = value
            .get("total_score")
            .and_then(JsonValue::as_f64)
            .filter(|score| score.is_finite());
        let feedback = value
            .get("feedback")
            .and_then(JsonValue::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Self {
            total_score,
            feedback,
        }
    }

    /// 权威分数：向下取整并限制在 0..=100
    pub fn authoritative_score(&self) -> Option<u8> {
        self.total_score
            .map(|score| score.floor().clamp(0.0, 100.0) as u8)
    }
}

/// 评测后端
///
/// 返回 `'static` future，方便网关直接 `tokio::spawn`。
pub trait EvaluationBackend: Send + Sync {
    fn score_resume(
        &self,
        resume: ResumeFile,
        role: String,
    ) -> BoxFuture<'static, Result<JsonValue, GatewayError>>;

    fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> BoxFuture<'static, Result<EvaluationResponse, GatewayError>>;
}

/// 基于 reqwest 的 HTTP 实现
pub struct HttpBackend {
    client: reqwest::Client,
    resume_score_url: String,
    evaluate_url: String,
}

impl HttpBackend {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// 使用自定义 reqwest 客户端（例如自带超时设置）
    pub fn with_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            client,
            resume_score_url: config.endpoint(RESUME_SCORE_PATH),
            evaluate_url: config.endpoint(EVALUATE_PATH),
        }
    }

    pub fn resume_score_url(&self) -> &str {
        &self.resume_score_url
    }

    pub fn evaluate_url(&self) -> &str {
        &self.evaluate_url
    }
}

impl EvaluationBackend for HttpBackend {
    fn score_resume(
        &self,
        resume: ResumeFile,
        role: String,
    ) -> BoxFuture<'static, Result<JsonValue, GatewayError>> {
        let client = self.client.clone();
        let endpoint = self.resume_score_url.clone();

        async move {
            debug!("发送简历 {} 到 {}", resume.name, endpoint);
            let form = resume_form(resume, role)?;
            let response = client
                .post(&endpoint)
                .multipart(form)
                .send()
                .await
                .map_err(|source| GatewayError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                })?;
            read_json(&endpoint, response).await
        }
        .boxed()
    }

    fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> BoxFuture<'static, Result<EvaluationResponse, GatewayError>> {
        let client = self.client.clone();
        let endpoint = self.evaluate_url.clone();

        async move {
            debug!("发送评测请求到 {}，共 {} 道题", endpoint, request.qa.len());
            let response = client
                .post(&endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|source| GatewayError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                })?;
            let value = read_json(&endpoint, response).await?;
            Ok(EvaluationResponse::from_json(&value))
        }
        .boxed()
    }
}

/// 组装 multipart 表单：`resume` 文件 + `role` 文本
fn resume_form(resume: ResumeFile, role: String) -> Result<Form, GatewayError> {
    let mime = if resume.mime.trim().is_empty() {
        "application/octet-stream".to_string()
    } else {
        resume.mime
    };
    let part = Part::bytes(resume.bytes)
        .file_name(resume.name)
        .mime_str(&mime)
        .map_err(|e| GatewayError::InvalidResume(e.to_string()))?;

    Ok(Form::new().part("resume", part).text("role", role))
}

/// 检查状态码并把响应体解析成 JSON
async fn read_json(endpoint: &str, response: reqwest::Response) -> Result<JsonValue, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let text = response
        .text()
        .await
        .map_err(|source| GatewayError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

    serde_json::from_str(&text).map_err(|source| GatewayError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_uses_camel_case_wire_names() {
        let request = EvaluationRequest {
            company_name: "Acme".to_string(),
            job_role: "Engineer".to_string(),
            qa: vec![QaPair {
                question: "Q1".to_string(),
                answer: String::new(),
            }],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "companyName": "Acme",
                "jobRole": "Engineer",
                "qa": [{ "question": "Q1", "answer": "" }]
            })
        );
    }

    #[test]
    fn test_response_with_both_fields() {
        let response = EvaluationResponse::from_json(&json!({
            "total_score": 92.7,
            "feedback": "Solid answers"
        }));

        assert_eq!(response.authoritative_score(), Some(92));
        assert_eq!(response.feedback.as_deref(), Some("Solid answers"));
    }

    #[test]
    fn test_response_missing_or_mistyped_fields_are_partial() {
        let only_result = EvaluationResponse::from_json(&json!({ "result": "text" }));
        assert_eq!(only_result, EvaluationResponse::default());

        let wrong_types = EvaluationResponse::from_json(&json!({
            "total_score": "92",
            "feedback": 3
        }));
        assert_eq!(wrong_types, EvaluationResponse::default());

        let empty_feedback = EvaluationResponse::from_json(&json!({
            "total_score": 50,
            "feedback": ""
        }));
        assert_eq!(empty_feedback.authoritative_score(), Some(50));
        assert!(empty_feedback.feedback.is_none());
    }

    #[test]
    fn test_authoritative_score_is_clamped() {
        let high = EvaluationResponse {
            total_score: Some(140.0),
            feedback: None,
        };
        let low = EvaluationResponse {
            total_score: Some(-3.5),
            feedback: None,
        };
        assert_eq!(high.authoritative_score(), Some(100));
        assert_eq!(low.authoritative_score(), Some(0));
    }

    #[test]
    fn test_urls_follow_config_base() {
        let config = Config::from_toml_str(r#"api_base = "https://api.example.com/""#).unwrap();
        let backend = HttpBackend::new(&config);

        assert_eq!(backend.resume_score_url(), "https://api.example.com/resume-score");
        assert_eq!(backend.evaluate_url(), "https://api.example.com/evaluate");
    }

    #[test]
    fn test_resume_form_accepts_blank_mime() {
        let resume = ResumeFile::new("cv.txt", "", b"hello".to_vec());
        assert!(resume_form(resume, "Engineer".to_string()).is_ok());
    }
}
