use serde::{Deserialize, Serialize};

/// 固定题库（按顺序截取前 n 道）
pub const MASTER_QUESTIONS: [&str; 10] = [
    "Tell me about yourself and your professional background.",
    "What specifically interests you about this role and our company?",
    "Describe a challenging project you've worked on and how you overcame obstacles.",
    "How do you handle working under pressure and tight deadlines?",
    "Where do you see yourself professionally in the next 5 years?",
    "What would you say is your greatest professional strength?",
    "Describe a time when you had to work with a difficult team member.",
    "How do you stay updated with industry trends and technologies?",
    "What motivates you to do your best work?",
    "Do you have any questions about our company or this position?",
];

/// 面试题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 题号（从 1 开始，与题库顺序一致）
    pub id: u32,
    /// 题干
    pub text: String,
    /// 回答，未作答时为 None
    pub answer: Option<String>,
}

impl Question {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            answer: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// 提交给评测接口的问答对
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl From<&Question> for QaPair {
    fn from(q: &Question) -> Self {
        Self {
            question: q.text.clone(),
            answer: q.answer.clone().unwrap_or_default(),
        }
    }
}
