//! Synchronization between the structural tree and its markup text.
//!
//! The coordinator owns the canonical expression state: one tree, one
//! markup string, kept equal to the tree's serialization whenever the
//! coordinator is idle. Structural edits (palette insertions, placeholder
//! fills) commit immediately; textual edits are debounced and reparsed only
//! once the input has been quiet for the configured period, so a fast typist
//! never fights half-finished reparses. When both kinds of edit race, the
//! later one wins.
//!
//! The engine is single-threaded and callback-free: the host drives it by
//! calling [`SyncCoordinator::poll`] from its own tick. Time is injected
//! through the [`Clock`] trait so the debounce window is testable without
//! sleeping.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::parse_markup;
use crate::parser::ExprNode;
use crate::placeholder::{self, Path, Placeholders};
use crate::serializer::serialize;
use crate::types::{EngineError, Settings};

/// A source of the current time.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A hand-driven clock. Clones share the same time, so a test can keep one
/// handle and advance the clock inside the coordinator.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::default(),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// A one-shot deadline for the debounce window.
#[derive(Debug, Default)]
struct DebounceTimer {
    deadline: Option<Instant>,
}

impl DebounceTimer {
    /// Schedules (or reschedules) the deadline.
    fn schedule(&mut self, at: Instant) {
        self.deadline = Some(at);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }

    fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}

/// Which side of the editor produced the edit being worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSource {
    /// A tree-level edit: palette insertion or placeholder fill.
    Structural,
    /// A raw markup edit typed into the text field.
    Textual,
}

/// The coordinator's synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Tree and markup agree; no edit in flight.
    Idle,
    /// An edit has been received and not yet committed.
    Editing(EditSource),
    /// The two representations are being brought back in step.
    Reconciling,
}

/// A tree-level edit: fill the placeholder at `path` with `replacement`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralEdit {
    /// The placeholder to fill.
    pub path: Path,
    /// The subtree to put there.
    pub replacement: ExprNode,
}

/// Owner of the canonical expression state.
pub struct SyncCoordinator<C: Clock = SystemClock> {
    settings: Settings,
    clock: C,
    tree: ExprNode,
    markup: String,
    state: SyncState,
    timer: DebounceTimer,
    pending_text: Option<String>,
    queue: VecDeque<StructuralEdit>,
    deferred_error: Option<EngineError>,
    last_commit: Option<Instant>,
}

impl SyncCoordinator<SystemClock> {
    /// Creates a coordinator on the wall clock, starting from an empty
    /// expression.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> SyncCoordinator<C> {
    /// Creates a coordinator with an injected time source.
    #[must_use]
    pub fn with_clock(settings: Settings, clock: C) -> Self {
        let tree = ExprNode::Placeholder;
        let markup = serialize(&tree);
        Self {
            settings,
            clock,
            tree,
            markup,
            state: SyncState::Idle,
            timer: DebounceTimer::default(),
            pending_text: None,
            queue: VecDeque::new(),
            deferred_error: None,
            last_commit: None,
        }
    }

    /// The canonical tree.
    #[must_use]
    pub fn tree(&self) -> &ExprNode {
        &self.tree
    }

    /// The canonical markup. Equal to the tree's serialization whenever the
    /// coordinator is idle.
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// The current synchronization state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// When the last commit happened, on the injected clock.
    #[must_use]
    pub fn last_commit(&self) -> Option<Instant> {
        self.last_commit
    }

    /// The placeholder set of the current tree.
    #[must_use]
    pub fn placeholders(&self) -> Placeholders {
        Placeholders::from_tree(&self.tree)
    }

    /// Applies a structural edit and commits immediately.
    ///
    /// A pending textual edit is discarded: the structural edit is the later
    /// write and wins. On failure nothing changes and the error is returned
    /// to the caller.
    pub fn apply_structural(&mut self, edit: StructuralEdit) -> Result<(), EngineError> {
        if self.state == SyncState::Reconciling {
            self.queue.push_back(edit);
            return Ok(());
        }

        self.timer.cancel();
        self.pending_text = None;
        self.state = SyncState::Editing(EditSource::Structural);

        match placeholder::fill(&mut self.tree, &edit.path, edit.replacement, &self.settings) {
            Ok(()) => {
                self.reconcile();
                Ok(())
            }
            Err(error) => {
                self.state = SyncState::Idle;
                Err(error.into())
            }
        }
    }

    /// Queues a structural edit for the next reconcile instead of applying
    /// it now. Deferred edits run in arrival order after the next commit;
    /// a failure among them surfaces on the following [`Self::poll`].
    pub fn defer_structural(&mut self, edit: StructuralEdit) {
        self.queue.push_back(edit);
    }

    /// Records a textual edit and restarts the debounce window. Nothing is
    /// parsed until the window elapses; each keystroke replaces the pending
    /// text and pushes the deadline out again.
    pub fn submit_text(&mut self, markup: impl Into<String>) {
        self.pending_text = Some(markup.into());
        self.state = SyncState::Editing(EditSource::Textual);
        self.timer.schedule(self.clock.now() + self.settings.debounce);
    }

    /// Drives the engine forward: reparses the pending text once its
    /// debounce window has elapsed.
    ///
    /// Returns `Ok(true)` when a commit happened, `Ok(false)` when there was
    /// nothing due. On a rejected edit the last-known-good tree and markup
    /// are kept and the error is returned; the editor stays usable.
    pub fn poll(&mut self) -> Result<bool, EngineError> {
        if let Some(error) = self.deferred_error.take() {
            return Err(error);
        }
        if !self.timer.is_due(self.clock.now()) {
            return Ok(false);
        }
        self.timer.cancel();
        let Some(markup) = self.pending_text.take() else {
            self.state = SyncState::Idle;
            return Ok(false);
        };

        match parse_markup(&markup, &self.settings) {
            Ok(tree) => {
                self.tree = tree;
                self.reconcile();
                Ok(true)
            }
            Err(error) => {
                self.state = SyncState::Idle;
                Err(error)
            }
        }
    }

    /// Serializes the tree back to canonical markup, stamps the commit, and
    /// drains any deferred structural edits.
    fn reconcile(&mut self) {
        loop {
            self.state = SyncState::Reconciling;
            self.markup = serialize(&self.tree);
            self.last_commit = Some(self.clock.now());
            self.state = SyncState::Idle;

            let Some(edit) = self.queue.pop_front() else {
                break;
            };
            if let Err(error) =
                placeholder::fill(&mut self.tree, &edit.path, edit.replacement, &self.settings)
            {
                // first failure is kept for the next poll; the rest of the
                // queue still runs
                if self.deferred_error.is_none() {
                    self.deferred_error = Some(error.into());
                }
            }
        }
    }
}
