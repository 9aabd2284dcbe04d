//! 上传进度模拟器
//!
//! 每 `upload_tick` 增加 `upload_step`，到 100 后停顿 `upload_settle`
//! 再报告上传完成。与简历评分请求互不等待。

use tokio::time::sleep;
use tracing::debug;

use crate::config::Timings;
use crate::workflow::{EpisodeId, EventSender, SessionEvent};

pub const UPLOAD_COMPLETE: u8 = 100;

/// 上传进度计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    progress: u8,
    step: u8,
}

impl UploadProgress {
    pub fn new(step: u8) -> Self {
        Self {
            progress: 0,
            step: step.max(1),
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= UPLOAD_COMPLETE
    }

    /// 前进一跳，最后一跳截断到 100
    pub fn tick(&mut self) -> u8 {
        self.progress = self.progress.saturating_add(self.step).min(UPLOAD_COMPLETE);
        self.progress
    }
}

/// 运行一次上传片段
pub async fn run_upload_episode(episode: EpisodeId, timings: Timings, events: EventSender) {
    let mut progress = UploadProgress::new(timings.upload_step);

    while !progress.is_complete() {
        sleep(timings.upload_tick()).await;
        let value = progress.tick();
        if events
            .send(SessionEvent::UploadProgressed {
                episode,
                progress: value,
            })
            .is_err()
        {
            return;
        }
    }

    sleep(timings.upload_settle()).await;
    debug!("上传片段 #{} 完成", episode);
    let _ = events.send(SessionEvent::UploadCompleted { episode });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    #[test]
    fn test_progress_is_monotonic_and_ends_at_100() {
        let mut progress = UploadProgress::new(8);
        let mut previous = progress.progress();
        let mut ticks = 0;

        while !progress.is_complete() {
            let value = progress.tick();
            assert!(value >= previous);
            previous = value;
            ticks += 1;
        }

        assert_eq!(ticks, 13);
        assert_eq!(progress.progress(), 100);
    }

    #[test]
    fn test_step_not_dividing_100_still_lands_exactly() {
        let mut progress = UploadProgress::new(30);
        let values: Vec<u8> = (0..4).map(|_| progress.tick()).collect();
        assert_eq!(values, vec![30, 60, 90, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_episode_reports_ticks_then_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();

        tokio::spawn(run_upload_episode(7, Timings::default(), tx));

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::UploadProgressed { episode, progress } => {
                    assert_eq!(episode, 7);
                    seen.push(progress);
                }
                SessionEvent::UploadCompleted { episode } => {
                    assert_eq!(episode, 7);
                    break;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }

        assert_eq!(seen.len(), 13);
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(start.elapsed(), Duration::from_millis(13 * 80 + 800));
    }
}
