//! 分数协调器
//!
//! 进入结果页后本地把分数从 0 动画到占位值 87；
//! 评测接口返回权威分数后立即覆盖，之后动画不再生效。

use tokio::time::sleep;

use crate::config::Timings;
use crate::workflow::{EpisodeId, EventSender, SessionEvent};

/// 占位分数
pub const PLACEHOLDER_CEILING: u8 = 87;
/// 动画总帧数
pub const ANIMATION_STEPS: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreReconciler {
    step: u32,
    displayed: u8,
    authoritative: Option<u8>,
}

impl ScoreReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn displayed(&self) -> u8 {
        self.displayed
    }

    pub fn authoritative(&self) -> Option<u8> {
        self.authoritative
    }

    pub fn is_animating(&self) -> bool {
        self.authoritative.is_none() && self.step < ANIMATION_STEPS
    }

    /// 动画前进一帧，第 k 帧显示 ⌊87·k/60⌋
    pub fn tick(&mut self) -> u8 {
        if self.is_animating() {
            self.step += 1;
            self.displayed =
                (PLACEHOLDER_CEILING as u32 * self.step / ANIMATION_STEPS) as u8;
        }
        self.displayed
    }

    /// 权威分数无条件覆盖
    pub fn apply_authoritative(&mut self, score: u8) -> u8 {
        self.authoritative = Some(score);
        self.displayed = score;
        score
    }
}

/// 运行分数动画，发满 `ANIMATION_STEPS` 帧后结束
pub async fn run_score_animation(episode: EpisodeId, timings: Timings, events: EventSender) {
    for _ in 0..ANIMATION_STEPS {
        sleep(timings.score_tick()).await;
        if events.send(SessionEvent::ScoreTick { episode }).is_err() {
            return;
        }
    }
}
