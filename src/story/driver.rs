//! Timer-driven reveal driver.
//!
//! One background task owns a [`RevealSession`]. Callers talk to it through a
//! cloneable [`RevealHandle`]; ticks come from a `tokio::time::interval` that is
//! only polled while the session is typing. Commands are polled before ticks,
//! and `Show` resets the interval, so a new turn's text fully replaces the old
//! state before any further tick can run.

use std::time::Duration;

use log::{debug, trace};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::reveal::{RevealListener, RevealPhase, RevealSession, RevealState};
use super::segmenter::Segmenter;
use crate::config::RevealConfig;

#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    pub tick_interval: Duration,
    pub chars_per_tick: usize,
    pub segmenter: Segmenter,
}

impl From<&RevealConfig> for DriverConfig {
    fn from(cfg: &RevealConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(cfg.tick_interval_ms.max(1)),
            chars_per_tick: cfg.chars_per_tick,
            segmenter: Segmenter::with_limits(cfg.max_segment_chars, cfg.flush_threshold_chars),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from(&RevealConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealSnapshot {
    pub state: RevealState,
    pub phase: RevealPhase,
    pub total: usize,
    pub visible: String,
}

enum RevealCommand {
    Show(String),
    Click,
    Snapshot(oneshot::Sender<RevealSnapshot>),
    Shutdown,
}

#[derive(Clone, Debug)]
pub struct RevealHandle {
    tx: mpsc::UnboundedSender<RevealCommand>,
}

impl RevealHandle {
    /// Replace the current reveal with `text`.
    pub fn show(&self, text: impl Into<String>) {
        let _ = self.tx.send(RevealCommand::Show(text.into()));
    }

    pub fn click(&self) {
        let _ = self.tx.send(RevealCommand::Click);
    }

    /// Current state, or `None` once the driver has stopped.
    pub async fn snapshot(&self) -> Option<RevealSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(RevealCommand::Snapshot(tx)).ok()?;
        rx.await.ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(RevealCommand::Shutdown);
    }
}

/// Start a driver task. The join handle yields the listener back on shutdown.
pub fn spawn<L>(config: DriverConfig, listener: L) -> (RevealHandle, JoinHandle<L>)
where
    L: RevealListener + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let session = RevealSession::new(config.segmenter, config.chars_per_tick, listener);
    let task = tokio::spawn(run(session, rx, config.tick_interval));
    (RevealHandle { tx }, task)
}

async fn run<L: RevealListener>(
    mut session: RevealSession<L>,
    mut rx: mpsc::UnboundedReceiver<RevealCommand>,
    period: Duration,
) -> L {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let typing = session.phase() == RevealPhase::Typing;
        tokio::select! {
            biased;
            cmd = rx.recv() => match cmd {
                Some(RevealCommand::Show(text)) => {
                    session.show(&text);
                    ticker.reset();
                    debug!(
                        "reveal: new text, {} segment(s)",
                        session.controller().segment_count()
                    );
                }
                Some(RevealCommand::Click) => {
                    session.click();
                    ticker.reset();
                    trace!("reveal: click -> {:?}", session.phase());
                }
                Some(RevealCommand::Snapshot(reply)) => {
                    let controller = session.controller();
                    let _ = reply.send(RevealSnapshot {
                        state: controller.state(),
                        phase: controller.phase(),
                        total: controller.segment_count(),
                        visible: controller.visible_text().to_string(),
                    });
                }
                Some(RevealCommand::Shutdown) | None => break,
            },
            _ = ticker.tick(), if typing => {
                session.tick();
            }
        }
    }
    debug!("reveal: driver stopped");
    session.into_listener()
}
