//! # History
//!
//! Bounded undo/redo over serialized snapshots.
//!
//! ```text
//!            trigger (new markup)           trigger (within burst window)
//!   Clean ───────────────────────▶ Recording ──────────────┐
//!     ▲                               │  ▲                  │ replace top
//!     │ undo / redo / close_burst     │  └──────────────────┘
//!     └───────────────────────────────┘
//! ```
//!
//! The undo stack's top is always the current state, so undo needs at
//! least two entries. Pushing clears the redo stack; a snapshot with the
//! same markup as the top only refreshes its caret offset.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use quire_config::HistoryConfig;

use crate::offset::Offset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub markup: String,
    pub offset: Option<Offset>,
    pub timestamp: Instant,
}

impl Snapshot {
    pub fn new(markup: impl Into<String>, offset: Option<Offset>) -> Self {
        Self::at(markup, offset, Instant::now())
    }

    pub fn at(markup: impl Into<String>, offset: Option<Offset>, timestamp: Instant) -> Self {
        Self {
            markup: markup.into(),
            offset,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    Clean,
    /// Inside an edit burst that started at `since`.
    Recording { since: Instant },
}

/// Tool interactions during which edits are not recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Normal,
    Dragging,
    InlineTool,
}

impl InteractionMode {
    pub fn is_exclusive(self) -> bool {
        !matches!(self, InteractionMode::Normal)
    }
}

/// What [`History::trigger`] did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Ignored,
    /// Same markup as the top; only the offset was updated.
    Merged,
    Pushed,
    /// Same burst; the top entry was overwritten.
    Replaced,
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
    burst_window: Duration,
    state: HistoryState,
}

impl History {
    /// A zero `limit` is raised to 1.
    pub fn new(limit: usize, burst_window: Duration) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
            burst_window,
            state: HistoryState::Clean,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.limit, Duration::from_millis(config.burst_window_ms))
    }

    /// Forget everything and record `initial` as the only entry.
    pub fn start(&mut self, initial: Snapshot) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(initial);
        self.state = HistoryState::Clean;
    }

    pub fn trigger(&mut self, snapshot: Snapshot, mode: InteractionMode) -> Trigger {
        if mode.is_exclusive() {
            log::debug!("history: ignored edit during {mode:?}");
            return Trigger::Ignored;
        }

        if let Some(top) = self.undo.back_mut() {
            if top.markup == snapshot.markup {
                top.offset = snapshot.offset;
                return Trigger::Merged;
            }
            if let HistoryState::Recording { since } = self.state
                && !self.burst_window.is_zero()
                && snapshot.timestamp.saturating_duration_since(since) <= self.burst_window
            {
                *top = snapshot;
                self.redo.clear();
                log::debug!("history: replaced top within burst");
                return Trigger::Replaced;
            }
        }

        let since = snapshot.timestamp;
        self.undo.push_back(snapshot);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
        self.state = HistoryState::Recording { since };
        log::debug!("history: pushed entry {}", self.undo.len());
        Trigger::Pushed
    }

    /// Step back; returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.undo.len() < 2 {
            return None;
        }
        let current = self.undo.pop_back()?;
        self.redo.push(current);
        self.state = HistoryState::Clean;
        log::debug!("history: undo ({} left)", self.undo.len());
        self.undo.back()
    }

    /// Step forward; returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push_back(next);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.state = HistoryState::Clean;
        log::debug!("history: redo ({} left)", self.redo.len());
        self.undo.back()
    }

    /// The current entry.
    pub fn get(&self) -> Option<&Snapshot> {
        self.undo.back()
    }

    /// End the current burst; the next edit pushes a new entry.
    pub fn close_burst(&mut self) {
        self.state = HistoryState::Clean;
    }

    pub fn state(&self) -> HistoryState {
        self.state
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Undo entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.undo.iter()
    }
}
