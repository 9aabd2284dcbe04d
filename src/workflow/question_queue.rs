//! 题目队列
//!
//! 进入面试阶段时从固定题库截取前 n 道题，之后只会就地写入答案，
//! 不会改题干、不会重排、不会删除。

use serde::Serialize;

use crate::error::QueueError;
use crate::models::question::{QaPair, Question, MASTER_QUESTIONS};
use crate::models::session::{MAX_QUESTIONS, MIN_QUESTIONS};

/// 题目队列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQueue {
    items: Vec<Question>,
    cursor: usize,
}

impl QuestionQueue {
    /// 截取题库前 n 道题，n 会被限制在 [3, 10]
    pub fn initialize(n: u8) -> Self {
        let n = n.clamp(MIN_QUESTIONS, MAX_QUESTIONS) as usize;
        let items = MASTER_QUESTIONS
            .iter()
            .take(n)
            .enumerate()
            .map(|(i, text)| Question::new(i as u32 + 1, *text))
            .collect();

        Self { items, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 当前题目下标；全部完成后等于 `len()`
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn questions(&self) -> &[Question] {
        &self.items
    }

    pub fn current(&self) -> Option<&Question> {
        self.items.get(self.cursor)
    }

    pub fn is_last(&self) -> bool {
        !self.items.is_empty() && self.cursor + 1 == self.items.len()
    }

    pub fn is_exhausted(&self) -> bool {
        !self.items.is_empty() && self.cursor >= self.items.len()
    }

    pub fn current_is_answered(&self) -> bool {
        self.current().map(Question::is_answered).unwrap_or(false)
    }

    pub fn answered_count(&self) -> usize {
        self.items.iter().filter(|q| q.is_answered()).count()
    }

    /// 记录当前题的答案；同一题不能重复作答
    pub fn record_answer(&mut self, text: impl Into<String>) -> Result<(), QueueError> {
        if self.items.is_empty() {
            return Err(QueueError::NotInterviewing);
        }
        let cursor = self.cursor;
        let question = self.items.get_mut(cursor).ok_or(QueueError::Exhausted)?;
        if question.is_answered() {
            return Err(QueueError::AlreadyAnswered(cursor));
        }
        question.answer = Some(text.into());
        Ok(())
    }

    /// 前进到下一题，返回新的下标
    ///
    /// 最后一题不能 advance，应改为 `complete()` 并进入结果阶段。
    pub fn advance(&mut self) -> Result<usize, QueueError> {
        self.ensure_current_answered()?;
        if self.is_last() {
            return Err(QueueError::AtLastQuestion);
        }
        self.cursor += 1;
        Ok(self.cursor)
    }

    /// 最后一题作答后收尾，下标移到 `len()`
    pub fn complete(&mut self) -> Result<(), QueueError> {
        self.ensure_current_answered()?;
        if !self.is_last() {
            return Err(QueueError::Unanswered(self.cursor + 1));
        }
        self.cursor = self.items.len();
        Ok(())
    }

    /// 评测请求用的问答列表，未作答的题目答案为空串
    pub fn qa_pairs(&self) -> Vec<QaPair> {
        self.items.iter().map(QaPair::from).collect()
    }

    fn ensure_current_answered(&self) -> Result<(), QueueError> {
        if self.items.is_empty() {
            return Err(QueueError::NotInterviewing);
        }
        match self.current() {
            None => Err(QueueError::Exhausted),
            Some(q) if !q.is_answered() => Err(QueueError::Unanswered(self.cursor)),
            Some(_) => Ok(()),
        }
    }
}
