// Per-call execution context carried through the hook chain

use std::fmt;
use std::panic::Location;
use std::time::Instant;

/// Source location of the code that issued a Redis command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallerSite {
    pub fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the caller of the enclosing `#[track_caller]` function
    #[track_caller]
    pub fn here() -> Self {
        Self::from(Location::caller())
    }
}

impl From<&'static Location<'static>> for CallerSite {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for CallerSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Immutable request-scoped context.
///
/// Every derivation returns a new value; the parent is never modified, so a
/// context can be shared read-only between concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    started_at: Option<Instant>,
    debug: bool,
    caller: Option<CallerSite>,
}

impl CallContext {
    /// Empty root context
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context with the per-call debug override set
    pub fn with_debug(&self, on: bool) -> Self {
        Self {
            debug: on,
            ..self.clone()
        }
    }

    /// Child context with an explicit caller site
    pub fn with_caller(&self, caller: CallerSite) -> Self {
        Self {
            caller: Some(caller),
            ..self.clone()
        }
    }

    /// Child context stamped with the current time
    pub fn started_now(&self) -> Self {
        Self {
            started_at: Some(Instant::now()),
            ..self.clone()
        }
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn caller(&self) -> Option<CallerSite> {
        self.caller
    }

    /// Microseconds since the before-hook stamped this context, 0 if never stamped
    pub fn elapsed_micros(&self) -> i64 {
        self.started_at
            .map(|start| i64::try_from(start.elapsed().as_micros()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}
