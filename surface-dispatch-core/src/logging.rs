//! Action logging with glob filtering and an optional in-memory history
//!
//! High-frequency actions (poll ticks) would drown everything else, so the
//! logger filters action names with glob patterns before emitting them.
//!
//! # Example
//!
//! ```ignore
//! use surface_dispatch::logging::{ActionLoggerConfig, ActionLoggerMiddleware};
//!
//! // Everything except poll ticks, to tracing only
//! let middleware = ActionLoggerMiddleware::new("wallet-panel", ActionLoggerConfig::default());
//!
//! // Keep the last 50 logged actions for the demo's summary
//! let middleware = ActionLoggerMiddleware::with_history("wallet-panel", config, 50);
//! for entry in middleware.history().unwrap().recent(10) {
//!     println!("#{} {}", entry.sequence, entry.summary);
//! }
//! ```

use std::collections::VecDeque;

use serde::Deserialize;

use crate::action::ActionSummary;
use crate::store::Middleware;

fn default_exclude() -> Vec<String> {
    vec!["PollTick".to_string()]
}

/// Glob include/exclude filter over action names.
///
/// `*` matches any sequence of characters, `?` exactly one.
/// `Did*` matches every result action, `*Error*` anything mentioning an error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionLoggerConfig {
    /// If non-empty, only actions matching one of these are logged.
    pub include: Vec<String>,
    /// Actions matching any of these are never logged (checked after include).
    pub exclude: Vec<String>,
}

impl Default for ActionLoggerConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: default_exclude(),
        }
    }
}

impl ActionLoggerConfig {
    /// Build from comma-separated pattern lists.
    ///
    /// `None` for `exclude` keeps the default exclusions.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let split = |s: &str| -> Vec<String> {
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        };
        Self {
            include: include.map(split).unwrap_or_default(),
            exclude: exclude.map(split).unwrap_or_else(default_exclude),
        }
    }

    /// No filtering at all.
    pub fn all() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn should_log(&self, action_name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| glob_match(p, action_name)) {
            return false;
        }
        !self.exclude.iter().any(|p| glob_match(p, action_name))
    }
}

/// One logged action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLogEntry {
    pub name: &'static str,
    /// From [`ActionSummary::summary`].
    pub summary: String,
    /// Position among logged actions, starting at 0.
    pub sequence: u64,
    /// Filled in once the reducer ran.
    pub state_changed: Option<bool>,
}

/// Ring buffer of recently logged actions.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl ActionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    pub fn push<A: ActionSummary>(&mut self, action: &A) -> &ActionLogEntry {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ActionLogEntry {
            name: action.name(),
            summary: action.summary(),
            sequence: self.next_sequence,
            state_changed: None,
        });
        self.next_sequence += 1;
        &self.entries[self.entries.len() - 1]
    }

    fn set_last_state_changed(&mut self, changed: bool) {
        if let Some(entry) = self.entries.back_mut() {
            entry.state_changed = Some(changed);
        }
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    /// Newest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Middleware logging filtered actions of one surface at debug level.
#[derive(Debug, Clone)]
pub struct ActionLoggerMiddleware {
    surface: String,
    config: ActionLoggerConfig,
    history: Option<ActionLog>,
    /// Whether `before` logged the action now being reduced
    logging_current: bool,
    active: bool,
}

impl ActionLoggerMiddleware {
    /// Tracing only.
    pub fn new(surface: impl Into<String>, config: ActionLoggerConfig) -> Self {
        Self {
            surface: surface.into(),
            config,
            history: None,
            logging_current: false,
            active: true,
        }
    }

    /// Tracing plus a ring buffer of the last `capacity` logged actions.
    pub fn with_history(
        surface: impl Into<String>,
        config: ActionLoggerConfig,
        capacity: usize,
    ) -> Self {
        Self {
            history: Some(ActionLog::new(capacity)),
            ..Self::new(surface, config)
        }
    }

    /// Turn the middleware into a no-op (e.g. when `--verbose` is off).
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn history(&self) -> Option<&ActionLog> {
        self.history.as_ref()
    }

    pub fn config(&self) -> &ActionLoggerConfig {
        &self.config
    }
}

impl<A: ActionSummary> Middleware<A> for ActionLoggerMiddleware {
    fn before(&mut self, action: &A) {
        self.logging_current = self.active && self.config.should_log(action.name());
        if !self.logging_current {
            return;
        }

        tracing::debug!(surface = %self.surface, action = %action.summary(), "Action");
        if let Some(history) = self.history.as_mut() {
            history.push(action);
        }
    }

    fn after(&mut self, _action: &A, state_changed: bool) {
        if !self.logging_current {
            return;
        }
        if let Some(history) = self.history.as_mut() {
            history.set_last_state_changed(state_changed);
        }
    }
}

/// Glob matching supporting `*` (zero or more characters) and `?` (one).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(&'*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                // Let the last star swallow one more character
                Some((star, consumed)) => {
                    backtrack = Some((star, consumed + 1));
                    p = star + 1;
                    t = consumed + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
