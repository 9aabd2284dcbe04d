//! 录音模拟器
//!
//! 两段式：录音 `recording_capture` 后自动停止并随机给出一段答案，
//! 再过 `recording_submit` 提交给题目队列。

use rand::seq::SliceRandom;
use tokio::time::sleep;
use tracing::debug;

use crate::config::Timings;
use crate::workflow::{EpisodeId, EventSender, SessionEvent};

/// 预置答案
pub const CANNED_ANSWERS: [&str; 4] = [
    "Thank you for the question. I have over 5 years of experience in software development, specializing in full-stack web applications using modern technologies like React, Node.js, and cloud platforms.",
    "I'm particularly excited about this role because it combines my technical expertise with the opportunity to work on innovative projects that can make a real impact on user experiences.",
    "One challenging project involved rebuilding our entire legacy system within a tight 6-month deadline. I led a team of 4 developers and implemented agile methodologies to ensure we met all milestones.",
    "I thrive under pressure by staying organized, prioritizing tasks effectively, and maintaining clear communication with my team. I also use stress as motivation to push for creative solutions.",
];

/// 均匀随机选一段预置答案
pub fn pick_canned_answer() -> &'static str {
    CANNED_ANSWERS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(CANNED_ANSWERS[0])
}

/// 运行一次录音片段
///
/// 被取消时任务直接被 abort，状态机同时会丢弃该片段的迟到事件。
pub async fn run_capture_episode(episode: EpisodeId, timings: Timings, events: EventSender) {
    sleep(timings.recording_capture()).await;

    let answer = pick_canned_answer().to_string();
    debug!("录音片段 #{} 捕获答案", episode);
    if events
        .send(SessionEvent::AnswerAutoCaptured { episode, answer })
        .is_err()
    {
        return;
    }

    sleep(timings.recording_submit()).await;
    let _ = events.send(SessionEvent::AnswerSubmitted { episode });
}
