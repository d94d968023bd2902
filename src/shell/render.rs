use std::io::Write;

use tokio::sync::mpsc;

use crate::story::reveal::{RevealFrame, RevealListener, RevealPhase};

const CONTINUE_MARK: &str = "  ▸";

/// Typewriter output for a terminal.
///
/// Prints only the characters a frame adds over what is already on screen,
/// starts a new line per segment, and reports completion on `done` tagged
/// with the generation of the text that was read (1 for the first `show`).
pub struct TerminalRenderer<W> {
    out: W,
    done: mpsc::UnboundedSender<u64>,
    generation: u64,
    index: usize,
    printed: usize,
    marked: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, done: mpsc::UnboundedSender<u64>) -> Self {
        Self {
            out,
            done,
            generation: 0,
            index: 0,
            printed: 0,
            marked: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn reset(&mut self) {
        self.index = 0;
        self.printed = 0;
        self.marked = false;
    }
}

impl<W: Write> RevealListener for TerminalRenderer<W> {
    fn on_state_change(&mut self, read_complete: bool) {
        if !read_complete {
            // a new block of text
            self.generation += 1;
            self.reset();
            let _ = writeln!(self.out);
        }
    }

    fn on_complete(&mut self) {
        let _ = writeln!(self.out);
        let _ = self.out.flush();
        let _ = self.done.send(self.generation);
    }

    fn on_progress(&mut self, frame: &RevealFrame<'_>) {
        if frame.phase == RevealPhase::Empty {
            return;
        }
        if frame.index != self.index {
            let _ = writeln!(self.out);
            self.index = frame.index;
            self.printed = 0;
            self.marked = false;
        }
        let fresh: String = frame.visible.chars().skip(self.printed).collect();
        if !fresh.is_empty() {
            self.printed += fresh.chars().count();
            let _ = write!(self.out, "{}", fresh);
        }
        let waiting = matches!(frame.phase, RevealPhase::AwaitingAdvance | RevealPhase::Finished);
        if waiting && !self.marked {
            self.marked = true;
            let _ = write!(self.out, "{}", CONTINUE_MARK);
        }
        let _ = self.out.flush();
    }
}

/// Matches completion signals to the most recent `show`.
///
/// A signal raised for earlier text can still be queued when the next text
/// is shown; only the latest generation counts as read.
#[derive(Debug, Default)]
pub struct ReadGate {
    shown: u64,
}

impl ReadGate {
    /// Record a `show` and return its generation.
    pub fn next(&mut self) -> u64 {
        self.shown += 1;
        self.shown
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.shown
    }
}
