//! 会话运行器 - 编排层
//!
//! 唯一的事件循环：从队列里逐个取事件交给 [`SessionMachine`]，
//! 再把返回的副作用落地成 tokio 任务。定时器任务登记在表里以便取消，
//! 后端请求任务不登记（离开阶段不取消在途请求）。

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clients::EvaluationBackend;
use crate::config::{Config, Timings};
use crate::orchestrator::session_machine::{Outcome, SessionMachine, SessionSnapshot};
use crate::services::{backend_gateway, recording_simulator, score_reconciler, upload_simulator};
use crate::workflow::{Effect, EpisodeId, EventReceiver, EventSender, SessionEvent, UserAction};

/// 会话句柄
///
/// 可以随意 clone，所有操作都只是往事件队列里投递。
#[derive(Clone)]
pub struct SessionHandle {
    events: EventSender,
    snapshots: watch::Receiver<SessionSnapshot>,
    shutdown: Arc<Notify>,
}

impl SessionHandle {
    /// 投递用户操作；运行器已退出时返回 false
    pub fn send(&self, action: UserAction) -> bool {
        self.events.send(SessionEvent::User(action)).is_ok()
    }

    /// 最新快照
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// 等待快照满足条件；运行器退出时返回 None
    pub async fn wait_for<F>(&self, predicate: F) -> Option<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = rx.wait_for(predicate).await.ok()?;
        Some(snapshot.clone())
    }

    /// 停止事件循环并取消所有定时器
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// 会话运行器
pub struct SessionRunner {
    machine: SessionMachine,
    timings: Timings,
    backend: Arc<dyn EvaluationBackend>,
    events_tx: EventSender,
    events_rx: EventReceiver,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    shutdown: Arc<Notify>,
    timers: HashMap<EpisodeId, JoinHandle<()>>,
}

impl SessionRunner {
    pub fn new(config: &Config, backend: Arc<dyn EvaluationBackend>) -> Self {
        let machine = SessionMachine::new(config.timings.clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

        Self {
            machine,
            timings: config.timings.clone(),
            backend,
            events_tx,
            events_rx,
            snapshot_tx,
            snapshot_rx,
            shutdown: Arc::new(Notify::new()),
            timers: HashMap::new(),
        }
    }

    /// 在当前 tokio 运行时上启动运行器
    pub fn spawn(config: &Config, backend: Arc<dyn EvaluationBackend>) -> SessionHandle {
        let runner = Self::new(config, backend);
        let handle = runner.handle();
        tokio::spawn(runner.run());
        handle
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            events: self.events_tx.clone(),
            snapshots: self.snapshot_rx.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// 事件循环
    pub async fn run(mut self) {
        info!("🚀 会话运行器启动");
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                event = self.events_rx.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
            }
        }

        self.cancel_all_timers();
        info!("会话运行器退出");
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let label = event.label();
        match self.machine.handle(event) {
            Ok(Outcome::Applied(effects)) => {
                for effect in effects {
                    self.execute(effect);
                }
                self.snapshot_tx.send_replace(self.machine.snapshot());
            }
            Ok(Outcome::Stale) => debug!("事件 {} 已过期", label),
            Err(violation) => warn!("⚠️ 操作被拒绝 ({}): {}", label, violation),
        }
    }

    fn execute(&mut self, effect: Effect) {
        let events = self.events_tx.clone();
        let timings = self.timings.clone();

        match effect {
            Effect::StartUpload { episode } => self.spawn_timer(
                episode,
                upload_simulator::run_upload_episode(episode, timings, events),
            ),
            Effect::StartRecording { episode } => self.spawn_timer(
                episode,
                recording_simulator::run_capture_episode(episode, timings, events),
            ),
            Effect::ScheduleAdvance { episode, delay } => self.spawn_timer(episode, async move {
                tokio::time::sleep(delay).await;
                let _ = events.send(SessionEvent::AdvanceDue { episode });
            }),
            Effect::StartScoreAnimation { episode } => self.spawn_timer(
                episode,
                score_reconciler::run_score_animation(episode, timings, events),
            ),
            Effect::CancelTimer { episode } => {
                if let Some(handle) = self.timers.remove(&episode) {
                    debug!("取消定时器 #{}", episode);
                    handle.abort();
                }
            }
            Effect::CancelAllTimers => self.cancel_all_timers(),
            Effect::ScoreResume {
                session,
                resume,
                role,
            } => {
                tokio::spawn(backend_gateway::dispatch_resume_score(
                    self.backend.clone(),
                    session,
                    resume,
                    role,
                    events,
                ));
            }
            Effect::Evaluate { session, request } => {
                tokio::spawn(backend_gateway::dispatch_evaluation(
                    self.backend.clone(),
                    session,
                    request,
                    events,
                ));
            }
        }
    }

    fn spawn_timer<F>(&mut self, episode: EpisodeId, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.timers.retain(|_, handle| !handle.is_finished());
        self.timers.insert(episode, tokio::spawn(task));
    }

    fn cancel_all_timers(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}
