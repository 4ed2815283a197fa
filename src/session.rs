//! Session actor: the single owner of autoplay state for one view.
//!
//! Timer ticks, user commands and animator steps are multiplexed in one
//! task, so state mutations never interleave. The view reads snapshots from
//! a watch channel and talks back through [`SessionHandle`].
//!
//! ```text
//!   view ──cmd──► ┌──────────────┐ ◄──tick── AutoplayTimer
//!                 │   Session    │ ◄──step── animator::play
//!   view ◄─snap── └──────────────┘
//! ```

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::animator;
use crate::autoplay::{AutoplayController, AutoplayEvent, AutoplayTimer, Direction};
use crate::catalog::{RegimeCatalog, RegimeId, Strategy};
use crate::config::EngineConfig;
use crate::logging::{
    log, log_jump, log_path, log_session_summary, log_step, log_strategy, log_tick, obj, v_str,
    Domain, Level,
};
use crate::path::{describe, requires_preview, resolve_path};
use crate::strategy::{direction_label, select_strategy};

/// Everything the view layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub current: RegimeId,
    pub previous: RegimeId,
    pub is_auto_playing: bool,
    pub direction: Direction,
    pub reduced_motion: bool,
    pub strategy: Strategy,
    pub direction_label: Option<&'static str>,
    /// Path being walked by an in-flight navigation
    pub preview_path: Option<Vec<RegimeId>>,
    /// Node currently highlighted on the preview path
    pub preview_step: Option<RegimeId>,
    pub navigating: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SelectOutcome {
    AlreadyThere,
    Jumped,
    Navigating { path: Vec<RegimeId> },
    /// A navigation is still in flight
    Busy,
}

#[derive(Debug)]
enum Command {
    Select(RegimeId, oneshot::Sender<SelectOutcome>),
    Control(AutoplayEvent, oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

#[derive(Debug)]
enum Internal {
    Step { regime: RegimeId, index: usize, len: usize },
    NavigationDone { target: RegimeId },
}

#[derive(Debug)]
struct Preview {
    path: Vec<RegimeId>,
    step: Option<RegimeId>,
}

#[derive(Debug, Default)]
struct SessionStats {
    ticks: u64,
    jumps: u64,
    navigations: u64,
    rejected: u64,
}

struct Session {
    catalog: Arc<RegimeCatalog>,
    controller: AutoplayController,
    timer: AutoplayTimer,
    step_delay: Duration,
    preview: Option<Preview>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    snapshots: watch::Sender<SessionSnapshot>,
    stats: SessionStats,
}

impl Session {
    /// Start a session task on the current runtime.
    fn spawn(catalog: Arc<RegimeCatalog>, cfg: &EngineConfig) -> SessionHandle {
        let mut controller = AutoplayController::new();
        controller.apply(AutoplayEvent::SetReducedMotion(cfg.reduced_motion));

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let initial = build_snapshot(&catalog, &controller, None);
        let (snap_tx, snap_rx) = watch::channel(initial);

        let session = Session {
            catalog,
            controller,
            timer: AutoplayTimer::new(cfg.autoplay_interval()),
            step_delay: cfg.step_delay(),
            preview: None,
            internal_tx,
            snapshots: snap_tx,
            stats: SessionStats::default(),
        };
        let task = tokio::spawn(session.run(cmd_rx, internal_rx));

        SessionHandle {
            commands: cmd_tx,
            snapshots: snap_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
    ) {
        log(
            Level::Info,
            Domain::System,
            "session_start",
            obj(&[
                ("regime", v_str(self.controller.state().current.key())),
                ("interval_ms", json!(self.timer.period().as_millis() as u64)),
                ("step_delay_ms", json!(self.step_delay.as_millis() as u64)),
                ("reduced_motion", Value::Bool(self.controller.reduced_motion())),
            ]),
        );
        self.sync_timer();

        loop {
            tokio::select! {
                _ = self.timer.tick() => self.on_tick(),
                Some(event) = internal.recv() => self.on_internal(event),
                cmd = commands.recv() => match cmd {
                    Some(Command::Select(target, reply)) => {
                        let outcome = self.on_select(target);
                        let _ = reply.send(outcome);
                    }
                    Some(Command::Control(event, reply)) => {
                        self.on_control(event);
                        let _ = reply.send(self.snapshots.borrow().clone());
                    }
                    Some(Command::Shutdown) | None => break,
                },
            }
        }

        self.timer.stop();
        log_session_summary(
            self.stats.ticks,
            self.stats.jumps,
            self.stats.navigations,
            self.stats.rejected,
        );
    }

    fn on_tick(&mut self) {
        let t = self.controller.apply(AutoplayEvent::Tick);
        if t.moved() {
            self.stats.ticks += 1;
            log_tick(t.before.current, t.after.current, t.after.direction.as_str(), t.flipped);
            self.publish();
        }
    }

    fn on_select(&mut self, target: RegimeId) -> SelectOutcome {
        if self.preview.is_some() {
            self.stats.rejected += 1;
            log(
                Level::Warn,
                Domain::Navigation,
                "select_rejected",
                obj(&[("regime", v_str(target.key())), ("msg", v_str("navigation in flight"))]),
            );
            return SelectOutcome::Busy;
        }

        let current = self.controller.state().current;
        if target == current {
            // Still a manual jump: autoplay stops and direction resets
            self.controller.apply(AutoplayEvent::ManualJump(target));
            log_jump(current, target, false);
            self.sync_timer();
            self.publish();
            return SelectOutcome::AlreadyThere;
        }

        if !requires_preview(current, target) {
            self.controller.apply(AutoplayEvent::ManualJump(target));
            self.stats.jumps += 1;
            log_jump(current, target, false);
            self.sync_timer();
            self.publish();
            return SelectOutcome::Jumped;
        }

        let path = resolve_path(current, target);
        log_path(&path, &describe(&path));

        // Autoplay stops for the whole walk; the final step commits the jump.
        self.controller.apply(AutoplayEvent::Pause);
        self.preview = Some(Preview {
            path: path.clone(),
            step: None,
        });
        self.sync_timer();
        self.stats.navigations += 1;

        let tx = self.internal_tx.clone();
        let len = path.len();
        let playback = animator::play(
            path.clone(),
            move |regime, index| {
                let _ = tx.send(Internal::Step { regime, index, len });
            },
            self.step_delay,
        );
        let done_tx = self.internal_tx.clone();
        tokio::spawn(async move {
            if let Err(err) = playback.finished().await {
                log(
                    Level::Error,
                    Domain::Navigation,
                    "playback_failed",
                    obj(&[("msg", v_str(&err.to_string()))]),
                );
            }
            let _ = done_tx.send(Internal::NavigationDone { target });
        });

        self.publish();
        SelectOutcome::Navigating { path }
    }

    fn on_internal(&mut self, event: Internal) {
        match event {
            Internal::Step { regime, index, len } => {
                log_step(regime, index, len);
                if let Some(preview) = self.preview.as_mut() {
                    preview.step = Some(regime);
                }
                if index + 1 == len {
                    let from = self.controller.state().current;
                    self.controller.apply(AutoplayEvent::ManualJump(regime));
                    self.stats.jumps += 1;
                    log_jump(from, regime, true);
                }
                self.publish();
            }
            Internal::NavigationDone { target } => {
                if self.controller.state().current != target {
                    // Final step never ran; commit so the view still lands on target
                    let from = self.controller.state().current;
                    self.controller.apply(AutoplayEvent::ManualJump(target));
                    log_jump(from, target, true);
                }
                self.preview = None;
                self.sync_timer();
                self.publish();
            }
        }
    }

    fn on_control(&mut self, event: AutoplayEvent) {
        // The walk owns playback until it lands; only reduced motion passes
        if self.preview.is_some() && !matches!(event, AutoplayEvent::SetReducedMotion(_)) {
            self.stats.rejected += 1;
            log(
                Level::Warn,
                Domain::Autoplay,
                "control_rejected",
                obj(&[
                    ("regime", v_str(self.controller.state().current.key())),
                    ("event", v_str(&format!("{:?}", event))),
                    ("msg", v_str("navigation in flight")),
                ]),
            );
            return;
        }

        let t = self.controller.apply(event);
        if t.changed() || matches!(event, AutoplayEvent::SetReducedMotion(_)) {
            log(
                Level::Info,
                Domain::Autoplay,
                "control",
                obj(&[
                    ("regime", v_str(t.after.current.key())),
                    ("event", v_str(&format!("{:?}", event))),
                    ("is_auto_playing", Value::Bool(t.after.is_auto_playing)),
                    ("reduced_motion", Value::Bool(self.controller.reduced_motion())),
                ]),
            );
        }
        self.sync_timer();
        self.publish();
    }

    /// Keep exactly one ticker alive, and only while ticks would apply.
    fn sync_timer(&mut self) {
        let should_run = self.controller.should_tick() && self.preview.is_none();
        self.timer.sync(should_run);
    }

    fn publish(&mut self) {
        let snapshot = build_snapshot(&self.catalog, &self.controller, self.preview.as_ref());
        log_strategy(snapshot.current, snapshot.strategy.title, snapshot.direction_label);
        self.snapshots.send_replace(snapshot);
    }
}

fn build_snapshot(
    catalog: &RegimeCatalog,
    controller: &AutoplayController,
    preview: Option<&Preview>,
) -> SessionSnapshot {
    let state = controller.state();
    let strategy = select_strategy(catalog, state.current, state.direction, Some(state.previous));
    SessionSnapshot {
        current: state.current,
        previous: state.previous,
        is_auto_playing: state.is_auto_playing,
        direction: state.direction,
        reduced_motion: controller.reduced_motion(),
        strategy: strategy.clone(),
        direction_label: direction_label(state.current, state.direction),
        preview_path: preview.map(|p| p.path.clone()),
        preview_step: preview.and_then(|p| p.step),
        navigating: preview.is_some(),
    }
}

// =============================================================================
// Handle
// =============================================================================

/// View-side handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn spawn(catalog: Arc<RegimeCatalog>, cfg: &EngineConfig) -> Self {
        Session::spawn(catalog, cfg)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Click on a regime node.
    pub async fn select(&self, target: RegimeId) -> Result<SelectOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Select(target, tx))?;
        rx.await.map_err(|_| anyhow!("session dropped select reply"))
    }

    /// Pause, resume and toggle are ignored while a navigation is in flight;
    /// the returned snapshot then still reads `navigating`.
    pub async fn pause(&self) -> Result<SessionSnapshot> {
        self.control(AutoplayEvent::Pause).await
    }

    pub async fn resume(&self) -> Result<SessionSnapshot> {
        self.control(AutoplayEvent::Resume).await
    }

    pub async fn toggle(&self) -> Result<SessionSnapshot> {
        self.control(AutoplayEvent::Toggle).await
    }

    pub async fn set_reduced_motion(&self, on: bool) -> Result<SessionSnapshot> {
        self.control(AutoplayEvent::SetReducedMotion(on)).await
    }

    pub async fn shutdown(self) -> Result<()> {
        // Already-stopped sessions are fine to shut down again
        let _ = self.commands.send(Command::Shutdown);
        self.task.await?;
        Ok(())
    }

    async fn control(&self, event: AutoplayEvent) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Control(event, tx))?;
        rx.await.map_err(|_| anyhow!("session dropped control reply"))
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.commands.send(cmd).map_err(|_| anyhow!("session is closed"))
    }
}
