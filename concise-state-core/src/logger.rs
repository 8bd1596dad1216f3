//! Action logging with pattern-based filtering and in-memory storage
//!
//! [`ActionLoggerMiddleware`] logs every action that passes its filter via
//! `tracing`, before the action runs and again once its result is known.
//! With storage enabled it also keeps recent calls in an [`ActionLog`] ring
//! buffer shared with the caller.
//!
//! # Example
//!
//! ```ignore
//! use concise_state_core::logger::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};
//!
//! // Everything except `tick*`, tracing only
//! let logger = ActionLoggerMiddleware::new(ActionLoggerConfig::new(None, Some("tick*")));
//!
//! // With in-memory storage
//! let logger = ActionLoggerMiddleware::with_log(ActionLogConfig::default());
//! let log = logger.log().unwrap();
//! let options = StoreOptions::new().middleware(logger);
//!
//! for entry in log.borrow().recent(10) {
//!     println!("{} {} -> {:?}", entry.elapsed_display(), entry.name, entry.result);
//! }
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use crate::middleware::{Middleware, MiddlewareEntry};
use crate::outcome::Outcome;
use crate::value::Args;

/// Action name filter using glob patterns.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `add*` matches addTodo, addTag, etc.
/// - `*Todo` matches addTodo, removeTodo, etc.
/// - `set?` matches setA, setB but not set
#[derive(Debug, Clone, Default)]
pub struct ActionLoggerConfig {
    /// If non-empty, only log actions matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude actions matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl ActionLoggerConfig {
    /// Create a config from comma-separated pattern strings.
    ///
    /// `None` means no include filter (log everything) or no excludes.
    ///
    /// # Example
    /// ```
    /// use concise_state_core::logger::ActionLoggerConfig;
    ///
    /// let config = ActionLoggerConfig::new(Some("add*,toggle"), Some("addTag"));
    /// assert!(config.should_log("addTodo"));
    /// assert!(config.should_log("toggle"));
    /// assert!(!config.should_log("addTag"));
    /// assert!(!config.should_log("remove"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: include.map(split_patterns).unwrap_or_default(),
            exclude_patterns: exclude.map(split_patterns).unwrap_or_default(),
        }
    }

    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_patterns: include,
            exclude_patterns: exclude,
        }
    }

    /// Check if an action name passes the include/exclude patterns
    pub fn should_log(&self, action_name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, action_name))
        {
            return false;
        }
        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, action_name))
    }
}

fn split_patterns(patterns: &str) -> Vec<String> {
    patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

// ============================================================================
// In-Memory Action Log
// ============================================================================

/// An entry in the action log
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    pub name: String,
    /// Arguments as they reached the logger
    pub args: Args,
    pub timestamp: Instant,
    /// Sequence number for ordering
    pub sequence: u64,
    /// Rendered result; `None` until the action settles
    pub result: Option<Result<String, String>>,
}

impl ActionLogEntry {
    pub fn new(name: impl Into<String>, args: Args, sequence: u64) -> Self {
        Self {
            name: name.into(),
            args,
            timestamp: Instant::now(),
            sequence,
            result: None,
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }

    /// Format the elapsed time for display (e.g., "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Configuration for the action log ring buffer
#[derive(Debug, Clone)]
pub struct ActionLogConfig {
    /// Maximum number of entries to keep
    pub capacity: usize,
    pub filter: ActionLoggerConfig,
}

impl Default for ActionLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: ActionLoggerConfig::default(),
        }
    }
}

impl ActionLogConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn new(capacity: usize, filter: ActionLoggerConfig) -> Self {
        Self { capacity, filter }
    }
}

/// In-memory ring buffer of recent action calls.
///
/// Older entries are discarded once capacity is reached.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    config: ActionLogConfig,
    next_sequence: u64,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(ActionLogConfig::default())
    }
}

impl ActionLog {
    pub fn new(config: ActionLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Record a call if it passes the filter.
    ///
    /// Returns the sequence number of the new entry, or `None` if filtered.
    pub fn record(&mut self, name: &str, args: &Args) -> Option<u64> {
        if !self.config.filter.should_log(name) || self.config.capacity == 0 {
            return None;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries
            .push_back(ActionLogEntry::new(name, args.clone(), sequence));
        Some(sequence)
    }

    /// Attach a result to the entry with `sequence`, if still buffered.
    pub fn settle(&mut self, sequence: u64, result: Result<String, String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.sequence == sequence) {
            entry.result = Some(result);
        }
    }

    /// All entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    /// The most recent `count` entries, newest first
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

    pub fn config(&self) -> &ActionLogConfig {
        &self.config
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Middleware that logs actions with configurable pattern filtering.
///
/// Supports two modes:
/// - **Tracing only**: logs via `tracing::debug!()`
/// - **With storage**: also records into a shared [`ActionLog`]
///
/// The arguments are logged before the rest of the chain runs; the result
/// is logged once known, after awaiting it for asynchronous actions.
/// Errors are logged and then returned unchanged.
#[derive(Debug, Clone)]
pub struct ActionLoggerMiddleware {
    config: ActionLoggerConfig,
    log: Option<Rc<RefCell<ActionLog>>>,
    active: bool,
}

impl ActionLoggerMiddleware {
    /// Tracing only, no in-memory storage
    pub fn new(config: ActionLoggerConfig) -> Self {
        Self {
            config,
            log: None,
            active: true,
        }
    }

    /// With in-memory storage
    pub fn with_log(config: ActionLogConfig) -> Self {
        Self {
            config: config.filter.clone(),
            log: Some(Rc::new(RefCell::new(ActionLog::new(config)))),
            active: true,
        }
    }

    /// Log every action, tracing only
    pub fn log_all() -> Self {
        Self::new(ActionLoggerConfig::default())
    }

    /// Set whether the middleware logs anything.
    ///
    /// An inactive logger still forwards every call untouched, which makes it
    /// easy to wire to a `--debug` flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Shared handle to the action log (if storage is enabled)
    pub fn log(&self) -> Option<Rc<RefCell<ActionLog>>> {
        self.log.clone()
    }

    pub fn config(&self) -> &ActionLoggerConfig {
        &self.config
    }

    /// Build the pipeline stage.
    pub fn into_middleware(self) -> Middleware {
        Middleware::new(move |next, args, meta| {
            let name = meta.action_name();
            if !self.active || !self.config.should_log(name) {
                return next.run(args);
            }

            tracing::debug!(action = %name, %args, "calling action");
            let sequence = self
                .log
                .as_ref()
                .and_then(|log| log.borrow_mut().record(name, &args));

            let settle = {
                let log = self.log.clone();
                let name = name.to_string();
                move |result: Result<String, String>| {
                    match &result {
                        Ok(value) => {
                            tracing::debug!(action = %name, result = %value, "action finished")
                        }
                        Err(error) => tracing::debug!(action = %name, %error, "action failed"),
                    }
                    if let (Some(log), Some(sequence)) = (log, sequence) {
                        log.borrow_mut().settle(sequence, result);
                    }
                }
            };

            match next.run(args) {
                Ok(Outcome::Ready(value)) => {
                    settle(Ok(value.to_string()));
                    Ok(Outcome::Ready(value))
                }
                Ok(Outcome::Pending(future)) => Ok(Outcome::pending(async move {
                    let result = future.await;
                    match &result {
                        Ok(value) => settle(Ok(value.to_string())),
                        Err(error) => settle(Err(error.to_string())),
                    }
                    result
                })),
                Err(error) => {
                    settle(Err(error.to_string()));
                    Err(error)
                }
            }
        })
    }
}

impl From<ActionLoggerMiddleware> for Middleware {
    fn from(logger: ActionLoggerMiddleware) -> Self {
        logger.into_middleware()
    }
}

impl From<ActionLoggerMiddleware> for MiddlewareEntry {
    fn from(logger: ActionLoggerMiddleware) -> Self {
        MiddlewareEntry::Plain(logger.into_middleware())
    }
}

/// Simple glob pattern matching supporting `*` and `?`.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                backtrack = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match backtrack {
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    backtrack = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}
