//! Progressive reveal ("typewriter") state machine.
//!
//! [`RevealController`] is the pure machine: it consumes ticks and clicks and
//! returns the [`RevealEvent`]s they caused. [`RevealSession`] pairs it with a
//! [`Segmenter`] and a [`RevealListener`], turning raw turn text into segments
//! and events into callbacks.
//!
//! ## Phases
//!
//! ```text
//!            tick (+step)           click
//!   ┌────────┐ ──────────▶ ┌────────┐ ───▶ next segment
//!   │ Typing │  click=skip │Awaiting│
//!   └────────┘ ──────────▶ │Advance │
//!        │                 └────────┘
//!        │ last segment full
//!        ▼            click (once)
//!   ┌──────────┐ ─────────────────▶ ┌──────────────┐
//!   │ Finished │                    │ ReadComplete │ (terminal)
//!   └──────────┘                    └──────────────┘
//! ```
//!
//! Completion is only ever reported from the Finished phase on an explicit
//! click, exactly once per loaded segment list.

use super::segmenter::Segmenter;

/// Characters revealed per tick unless configured otherwise.
pub const DEFAULT_CHARS_PER_TICK: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// Nothing to show; inputs are ignored.
    Empty,
    Typing,
    AwaitingAdvance,
    Finished,
    ReadComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// The read-complete flag changed (or was reset by a new segment list).
    ReadStateChanged(bool),
    /// The player acknowledged the final segment.
    Completed,
}

/// Snapshot of the transient per-turn reveal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevealState {
    pub index: usize,
    pub shown: usize,
    pub read_complete: bool,
}

#[derive(Debug, Clone)]
struct Segment {
    text: String,
    chars: usize,
}

impl Segment {
    fn new(text: String) -> Self {
        let chars = text.chars().count();
        Self { text, chars }
    }

    fn prefix(&self, n: usize) -> &str {
        match self.text.char_indices().nth(n) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevealController {
    segments: Vec<Segment>,
    state: RevealState,
    chars_per_tick: usize,
}

impl RevealController {
    pub fn new(segments: Vec<String>, chars_per_tick: usize) -> Self {
        Self {
            segments: segments.into_iter().map(Segment::new).collect(),
            state: RevealState::default(),
            chars_per_tick: chars_per_tick.max(1),
        }
    }

    /// Replace the segment list and reset all state.
    ///
    /// Always reports `ReadStateChanged(false)` so observers can re-gate
    /// anything that depended on the previous turn being read.
    pub fn load(&mut self, segments: Vec<String>) -> Vec<RevealEvent> {
        self.segments = segments.into_iter().map(Segment::new).collect();
        self.state = RevealState::default();
        vec![RevealEvent::ReadStateChanged(false)]
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_read_complete(&self) -> bool {
        self.state.read_complete
    }

    pub fn phase(&self) -> RevealPhase {
        let Some(current) = self.segments.get(self.state.index) else {
            return RevealPhase::Empty;
        };
        if self.state.read_complete {
            RevealPhase::ReadComplete
        } else if self.state.shown < current.chars {
            RevealPhase::Typing
        } else if self.state.index + 1 < self.segments.len() {
            RevealPhase::AwaitingAdvance
        } else {
            RevealPhase::Finished
        }
    }

    /// Full text of the current segment, if any.
    pub fn current_segment(&self) -> Option<&str> {
        self.segments.get(self.state.index).map(|s| s.text.as_str())
    }

    /// The currently visible prefix of the current segment.
    pub fn visible_text(&self) -> &str {
        self.segments
            .get(self.state.index)
            .map(|s| s.prefix(self.state.shown))
            .unwrap_or("")
    }

    /// Advance the typewriter by one step. Returns whether anything changed.
    pub fn tick(&mut self) -> bool {
        if self.phase() != RevealPhase::Typing {
            return false;
        }
        let len = self.segments[self.state.index].chars;
        self.state.shown = (self.state.shown + self.chars_per_tick).min(len);
        true
    }

    /// Handle a player click. Returns the events it produced (possibly none).
    pub fn click(&mut self) -> Vec<RevealEvent> {
        match self.phase() {
            RevealPhase::Empty | RevealPhase::ReadComplete => Vec::new(),
            RevealPhase::Typing => {
                self.state.shown = self.segments[self.state.index].chars;
                Vec::new()
            }
            RevealPhase::AwaitingAdvance => {
                self.state.index += 1;
                self.state.shown = 0;
                Vec::new()
            }
            RevealPhase::Finished => {
                self.state.read_complete = true;
                vec![RevealEvent::ReadStateChanged(true), RevealEvent::Completed]
            }
        }
    }

    pub fn frame(&self) -> RevealFrame<'_> {
        RevealFrame {
            index: self.state.index,
            total: self.segments.len(),
            visible: self.visible_text(),
            phase: self.phase(),
        }
    }
}

/// What a renderer needs to draw the current reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealFrame<'a> {
    pub index: usize,
    pub total: usize,
    pub visible: &'a str,
    pub phase: RevealPhase,
}

/// Observer of a reveal session. All methods default to no-ops.
pub trait RevealListener {
    /// The read-complete flag changed.
    fn on_state_change(&mut self, _read_complete: bool) {}

    /// The final segment was acknowledged. Fires once per turn.
    fn on_complete(&mut self) {}

    /// Visible text changed (tick, skip, advance or reload).
    fn on_progress(&mut self, _frame: &RevealFrame<'_>) {}
}

/// One reveal session: segmentation + controller + listener.
pub struct RevealSession<L> {
    segmenter: Segmenter,
    controller: RevealController,
    listener: L,
}

impl<L: RevealListener> RevealSession<L> {
    pub fn new(segmenter: Segmenter, chars_per_tick: usize, listener: L) -> Self {
        Self {
            segmenter,
            controller: RevealController::new(Vec::new(), chars_per_tick),
            listener,
        }
    }

    /// Start revealing a new turn's text, discarding whatever was in progress.
    pub fn show(&mut self, text: &str) {
        let segments = self.segmenter.split(text);
        let events = self.controller.load(segments);
        self.dispatch(events);
        self.listener.on_progress(&self.controller.frame());
    }

    pub fn tick(&mut self) -> bool {
        let changed = self.controller.tick();
        if changed {
            self.listener.on_progress(&self.controller.frame());
        }
        changed
    }

    pub fn click(&mut self) {
        let before = self.controller.state();
        let events = self.controller.click();
        let after = self.controller.state();
        if before.index != after.index || before.shown != after.shown {
            self.listener.on_progress(&self.controller.frame());
        }
        self.dispatch(events);
    }

    pub fn phase(&self) -> RevealPhase {
        self.controller.phase()
    }

    pub fn controller(&self) -> &RevealController {
        &self.controller
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    fn dispatch(&mut self, events: Vec<RevealEvent>) {
        for event in events {
            match event {
                RevealEvent::ReadStateChanged(done) => self.listener.on_state_change(done),
                RevealEvent::Completed => self.listener.on_complete(),
            }
        }
    }
}
