//! Run state machine.
//!
//! ```text
//!          Submit           Rasterized          AllPagesDone
//!   Idle ─────────▶ Extracting ──────────▶ Processing ─────────▶ Completed
//!    ▲                  │                                           │
//!    │  DocumentFailed  │                  Reset                    │
//!    └──────────────────┴───────────────────────────────────────────┘
//! ```
//!
//! [`transition`] is a pure function of `(state, event)`. The orchestrator
//! owns the only [`Run`] value and feeds every event through it, so there is
//! no shared mutable state for observers to race on.

use crate::error::Pdf2PptxError;
use crate::output::ProcessedPage;
use serde::{Deserialize, Serialize};

/// Where a conversion run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    /// Nothing submitted, or the previous run was discarded.
    #[default]
    Idle,
    /// The rasterizer is turning the document into page images.
    Extracting,
    /// Pages are being cleaned one at a time.
    Processing,
    /// Every page has a result; the deck can be assembled.
    Completed,
}

/// Inputs to the run state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEvent {
    /// A document was submitted for conversion.
    Submit,
    /// Rasterization finished and produced the page images.
    Rasterized,
    /// The last page has been processed.
    AllPagesDone,
    /// The rasterizer rejected the document.
    DocumentFailed,
    /// The user discarded the results.
    Reset,
}

/// Compute the next state, or reject the event.
pub fn transition(state: RunState, event: RunEvent) -> Result<RunState, Pdf2PptxError> {
    use RunEvent::*;
    use RunState::*;

    match (state, event) {
        (Idle, Submit) => Ok(Extracting),
        (Extracting, Rasterized) => Ok(Processing),
        (Extracting, DocumentFailed) => Ok(Idle),
        (Processing, AllPagesDone) => Ok(Completed),
        (Completed, Reset) => Ok(Idle),
        (state, event) => Err(Pdf2PptxError::InvalidTransition { state, event }),
    }
}

/// One conversion run: its state, the pages processed so far, and progress.
#[derive(Debug, Clone, Default)]
pub struct Run {
    state: RunState,
    pages: Vec<ProcessedPage>,
    progress: f64,
}

impl Run {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Pages processed so far, in index order.
    pub fn pages(&self) -> &[ProcessedPage] {
        &self.pages
    }

    /// Progress in percent, `0.0..=100.0`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Feed an event through [`transition`] and apply its side effects on
    /// the accumulated data.
    ///
    /// Returning to `Idle` (document failure or reset) drops every page and
    /// zeroes progress; reaching `Completed` pins progress at 100.
    pub fn apply(&mut self, event: RunEvent) -> Result<RunState, Pdf2PptxError> {
        let next = transition(self.state, event)?;
        match next {
            RunState::Idle => {
                self.pages.clear();
                self.progress = 0.0;
            }
            RunState::Completed => self.progress = 100.0,
            RunState::Extracting | RunState::Processing => {}
        }
        self.state = next;
        Ok(next)
    }

    /// Record progress before page `index` of `total` starts.
    ///
    /// The value is `index / total * 100` and never moves backwards.
    pub(crate) fn begin_page(&mut self, index: usize, total: usize) -> f64 {
        if total > 0 {
            let pct = index as f64 / total as f64 * 100.0;
            self.progress = self.progress.max(pct);
        }
        self.progress
    }

    /// Drop a run that will never finish and go back to `Idle`.
    ///
    /// Bypasses [`transition`]: only the owner may call it, once it knows no
    /// task is still driving the run.
    pub(crate) fn discard(&mut self) {
        self.state = RunState::Idle;
        self.pages.clear();
        self.progress = 0.0;
    }

    /// Append a finished page. Pages arrive in index order.
    pub(crate) fn push_page(&mut self, page: ProcessedPage) {
        debug_assert_eq!(page.index, self.pages.len(), "pages must arrive in order");
        self.pages.push(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let mut s = RunState::Idle;
        for (event, expected) in [
            (RunEvent::Submit, RunState::Extracting),
            (RunEvent::Rasterized, RunState::Processing),
            (RunEvent::AllPagesDone, RunState::Completed),
            (RunEvent::Reset, RunState::Idle),
        ] {
            s = transition(s, event).expect("valid transition");
            assert_eq!(s, expected);
        }
    }

    #[test]
    fn document_failure_returns_to_idle() {
        assert_eq!(
            transition(RunState::Extracting, RunEvent::DocumentFailed).unwrap(),
            RunState::Idle
        );
    }

    #[test]
    fn reset_is_rejected_mid_run() {
        for state in [RunState::Idle, RunState::Extracting, RunState::Processing] {
            assert!(transition(state, RunEvent::Reset).is_err(), "{state:?}");
        }
    }

    #[test]
    fn submit_is_rejected_unless_idle() {
        for state in [RunState::Extracting, RunState::Processing, RunState::Completed] {
            assert!(transition(state, RunEvent::Submit).is_err(), "{state:?}");
        }
    }

    #[test]
    fn progress_is_monotonic_and_pinned_on_completion() {
        let mut run = Run::new();
        run.apply(RunEvent::Submit).unwrap();
        run.apply(RunEvent::Rasterized).unwrap();
        assert_eq!(run.begin_page(0, 4), 0.0);
        assert_eq!(run.begin_page(2, 4), 50.0);
        // An out-of-order call can't pull progress back.
        assert_eq!(run.begin_page(1, 4), 50.0);
        assert_eq!(run.begin_page(3, 4), 75.0);
        assert!(run.progress() < 100.0);
        run.apply(RunEvent::AllPagesDone).unwrap();
        assert_eq!(run.progress(), 100.0);
    }

    #[test]
    fn discard_clears_a_run_in_flight() {
        let mut run = Run::new();
        run.apply(RunEvent::Submit).unwrap();
        run.apply(RunEvent::Rasterized).unwrap();
        run.begin_page(1, 2);
        run.discard();
        assert_eq!(run.state(), RunState::Idle);
        assert_eq!(run.progress(), 0.0);
        assert!(run.pages().is_empty());
    }

    #[test]
    fn failed_event_leaves_state_untouched() {
        let mut run = Run::new();
        assert!(run.apply(RunEvent::AllPagesDone).is_err());
        assert_eq!(run.state(), RunState::Idle);
    }
}
