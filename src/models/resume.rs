//! 简历文件句柄
//!
//! 核心流程只把简历当作不透明的字节块，唯一关心的是"能不能接收"：
//! - 浏览选择：按扩展名过滤（`.pdf` / `.txt`）
//! - 拖拽上传：按 MIME 类型过滤（`application/pdf` / `text/plain`）

use std::path::Path;

use phf::phf_set;
use serde::Serialize;

/// 拖拽上传允许的 MIME 类型
static ACCEPTED_MIME_TYPES: phf::Set<&'static str> = phf_set! {
    "application/pdf",
    "text/plain",
};

/// 浏览选择允许的扩展名
static ACCEPTED_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "pdf",
    "txt",
};

/// 简历来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResumeSource {
    /// 文件选择框
    Browse,
    /// 拖拽
    Drop,
}

/// 简历文件
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFile {
    pub name: String,
    pub mime: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// 从磁盘读取简历，MIME 类型按扩展名推断
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime = mime_for_extension(&name).unwrap_or("application/octet-stream");
        Ok(Self::new(name, mime, bytes))
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// 判断该来源下文件是否可接收
    pub fn is_accepted_from(&self, source: ResumeSource) -> bool {
        match source {
            ResumeSource::Browse => self
                .extension()
                .map(|ext| ACCEPTED_EXTENSIONS.contains(ext.as_str()))
                .unwrap_or(false),
            ResumeSource::Drop => {
                ACCEPTED_MIME_TYPES.contains(self.mime.trim().to_ascii_lowercase().as_str())
            }
        }
    }
}

fn mime_for_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_string_lossy().to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
