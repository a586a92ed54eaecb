//! Event logging for the rewrite pipeline.
//!
//! Every change a pass makes is recorded as an [`Event`] in the context's
//! [`EventLog`]. The log can be inspected for debugging or summarized with
//! [`DerivedStats`]; statistics are always derived from the events rather than
//! tracked separately.
//!
//! # Example
//!
//! ```rust
//! use vreduce::compiler::{EventKind, EventLog};
//!
//! let log = EventLog::new();
//! log.record(EventKind::InstructionScalarized)
//!     .at("main", 3)
//!     .message("a: vector = vadd x y -> a_s: int = add x y");
//! log.record(EventKind::Warning)
//!     .at("main", 5)
//!     .message("'u' is still a vector");
//!
//! assert_eq!(log.count_kind(EventKind::InstructionScalarized), 1);
//! assert_eq!(log.summary(), "1 instruction scalarized");
//! assert_eq!(log.warnings().count(), 1);
//! ```

use std::{collections::HashMap, fmt};

use rustc_hash::FxHashSet;

/// Categories of events that can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A vector instruction was replaced by its scalar form.
    InstructionScalarized,
    /// The predicate of a scalarized instruction was cleared.
    PredicateCleared,
    /// A destination was renamed and its later uses followed.
    ValueRenamed,
    /// A broadcast was inserted to feed a scalar into a vector position.
    WideningInserted,

    /// A pass started on a function.
    PassStarted,
    /// A pass completed on a function.
    PassCompleted,

    /// Warning (something unexpected but recoverable).
    Warning,
    /// Error (something failed).
    Error,
}

impl EventKind {
    /// Returns a human-readable description of this event kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::InstructionScalarized => "instruction scalarized",
            Self::PredicateCleared => "predicate cleared",
            Self::ValueRenamed => "value renamed",
            Self::WideningInserted => "widening inserted",
            Self::PassStarted => "pass started",
            Self::PassCompleted => "pass completed",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Returns true if this event represents a code transformation.
    #[must_use]
    pub fn is_transformation(&self) -> bool {
        matches!(
            self,
            Self::InstructionScalarized
                | Self::PredicateCleared
                | Self::ValueRenamed
                | Self::WideningInserted
        )
    }

    /// Returns true if this is a diagnostic event.
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A single logged event.
#[derive(Debug, Clone)]
pub struct Event {
    /// The type of event.
    pub kind: EventKind,
    /// The function where the event occurred (if applicable).
    pub function: Option<String>,
    /// Position within the function body.
    pub location: Option<usize>,
    /// Human-readable description.
    pub message: String,
    /// Associated pass name (if from a pass).
    pub pass: Option<&'static str>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(function) = &self.function {
            write!(f, " @{function}")?;
            if let Some(location) = self.location {
                write!(f, ":{location}")?;
            }
        }
        write!(f, " {}", self.message)
    }
}

/// Builder for creating events with a fluent API.
///
/// Created by [`EventLog::record`]. The event is added to the log when the
/// builder is dropped.
pub struct EventBuilder<'a> {
    log: &'a EventLog,
    kind: EventKind,
    function: Option<String>,
    location: Option<usize>,
    message: Option<String>,
    pass: Option<&'static str>,
}

impl<'a> EventBuilder<'a> {
    fn new(log: &'a EventLog, kind: EventKind) -> Self {
        Self {
            log,
            kind,
            function: None,
            location: None,
            message: None,
            pass: None,
        }
    }

    /// Sets the function and body position where the event occurred.
    pub fn at(mut self, function: impl Into<String>, location: usize) -> Self {
        self.function = Some(function.into());
        self.location = Some(location);
        self
    }

    /// Sets only the function (for function-level events).
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Sets a custom message describing the event.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Associates this event with a specific pass.
    pub fn pass(mut self, pass_name: &'static str) -> Self {
        self.pass = Some(pass_name);
        self
    }
}

impl Drop for EventBuilder<'_> {
    fn drop(&mut self) {
        let message = self
            .message
            .take()
            .unwrap_or_else(|| self.kind.description().to_string());

        let event = Event {
            kind: self.kind,
            function: self.function.take(),
            location: self.location.take(),
            message,
            pass: self.pass.take(),
        };

        self.log.events.push(event);
    }
}

/// Collection of events from the rewrite pipeline.
///
/// Events are appended through shared references, so passes holding only a
/// `&CompilerContext` can record them.
#[derive(Debug, Default)]
pub struct EventLog {
    events: boxcar::Vec<Event>,
}

impl EventLog {
    /// Creates an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: boxcar::Vec::new(),
        }
    }

    /// Returns true if no events have been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.count() == 0
    }

    /// Returns the total number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.count()
    }

    /// Starts building a new event of the given kind.
    ///
    /// The event is added when the builder is dropped.
    pub fn record(&self, kind: EventKind) -> EventBuilder<'_> {
        EventBuilder::new(self, kind)
    }

    /// Returns true if any event of the given kind exists.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.events.iter().any(|(_, e)| e.kind == kind)
    }

    /// Counts events of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|(_, e)| e.kind == kind).count()
    }

    /// Returns an iterator over all events.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|(_, e)| e)
    }

    /// Returns an iterator over events of a specific kind.
    pub fn filter_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(move |e| e.kind == kind)
    }

    /// Returns an iterator over events for a specific function.
    pub fn filter_function<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a Event> {
        self.iter()
            .filter(move |e| e.function.as_deref() == Some(function))
    }

    /// Returns an iterator over transformation events only.
    pub fn transformations(&self) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(|e| e.kind.is_transformation())
    }

    /// Returns an iterator over warning events.
    pub fn warnings(&self) -> impl Iterator<Item = &Event> + '_ {
        self.filter_kind(EventKind::Warning)
    }

    /// Counts events grouped by kind.
    #[must_use]
    pub fn count_by_kind(&self) -> HashMap<EventKind, usize> {
        let mut counts = HashMap::new();
        for (_, event) in &self.events {
            *counts.entry(event.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the number of unique functions with transformation events.
    #[must_use]
    pub fn functions_affected(&self) -> usize {
        self.transformations()
            .filter_map(|e| e.function.as_deref())
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// Generates a human-readable summary of all transformation events.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "no events".to_string();
        }

        let mut parts: Vec<String> = self
            .count_by_kind()
            .iter()
            .filter(|(k, _)| k.is_transformation())
            .map(|(kind, count)| format!("{} {}", count, kind.description()))
            .collect();

        if parts.is_empty() {
            return format!("{} events", self.len());
        }

        parts.sort();
        parts.join(", ")
    }
}

/// Statistics derived from an [`EventLog`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedStats {
    /// Number of functions that had any transformation.
    pub functions_transformed: usize,
    /// Number of vector instructions replaced by scalar ones.
    pub instructions_scalarized: usize,
    /// Number of predicates dropped from scalarized instructions.
    pub predicates_cleared: usize,
    /// Number of destinations renamed.
    pub values_renamed: usize,
    /// Number of broadcasts inserted by restitch.
    pub widenings_inserted: usize,
    /// Number of warnings.
    pub warnings: usize,
}

impl DerivedStats {
    /// Computes statistics from an event log.
    #[must_use]
    pub fn from_log(log: &EventLog) -> Self {
        let counts = log.count_by_kind();
        let get = |kind: EventKind| counts.get(&kind).copied().unwrap_or(0);

        Self {
            functions_transformed: log.functions_affected(),
            instructions_scalarized: get(EventKind::InstructionScalarized),
            predicates_cleared: get(EventKind::PredicateCleared),
            values_renamed: get(EventKind::ValueRenamed),
            widenings_inserted: get(EventKind::WideningInserted),
            warnings: get(EventKind::Warning),
        }
    }

    /// Generates a human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.functions_transformed > 0 {
            parts.push(format!("{} functions", self.functions_transformed));
        }
        if self.instructions_scalarized > 0 {
            parts.push(format!("{} scalarized", self.instructions_scalarized));
        }
        if self.predicates_cleared > 0 {
            parts.push(format!("{} predicates cleared", self.predicates_cleared));
        }
        if self.values_renamed > 0 {
            parts.push(format!("{} renamed", self.values_renamed));
        }
        if self.widenings_inserted > 0 {
            parts.push(format!("{} widenings", self.widenings_inserted));
        }
        if self.warnings > 0 {
            parts.push(format!("{} warnings", self.warnings));
        }

        if parts.is_empty() {
            "no transformations".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl fmt::Display for DerivedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(!log.has(EventKind::InstructionScalarized));
        assert_eq!(log.summary(), "no events");
    }

    #[test]
    fn test_builder_records_on_drop() {
        let log = EventLog::new();
        log.record(EventKind::WideningInserted)
            .at("main", 4)
            .pass("restitch")
            .message("a_s_v = s2vb a_s");

        let event = log.iter().next().unwrap();
        assert_eq!(event.kind, EventKind::WideningInserted);
        assert_eq!(event.function.as_deref(), Some("main"));
        assert_eq!(event.location, Some(4));
        assert_eq!(event.pass, Some("restitch"));
        assert_eq!(event.to_string(), "[widening inserted] @main:4 a_s_v = s2vb a_s");
    }

    #[test]
    fn test_default_message() {
        let log = EventLog::new();
        log.record(EventKind::PredicateCleared);
        assert_eq!(log.iter().next().unwrap().message, "predicate cleared");
    }

    #[test]
    fn test_summary_and_stats() {
        let log = EventLog::new();
        log.record(EventKind::InstructionScalarized).function("f");
        log.record(EventKind::InstructionScalarized).function("g");
        log.record(EventKind::ValueRenamed).function("f");
        log.record(EventKind::Warning).function("g");

        assert_eq!(
            log.summary(),
            "1 value renamed, 2 instruction scalarized"
        );
        assert_eq!(log.filter_function("f").count(), 2);

        let stats = DerivedStats::from_log(&log);
        assert_eq!(stats.functions_transformed, 2);
        assert_eq!(stats.instructions_scalarized, 2);
        assert_eq!(stats.values_renamed, 1);
        assert_eq!(stats.warnings, 1);
        assert_eq!(
            stats.summary(),
            "2 functions, 2 scalarized, 1 renamed, 1 warnings"
        );
    }

    #[test]
    fn test_diagnostics_are_not_transformations() {
        let log = EventLog::new();
        log.record(EventKind::Warning).at("f", 1).message("odd");
        log.record(EventKind::Error).function("f");
        log.record(EventKind::WideningInserted).at("f", 2);

        assert_eq!(log.warnings().count(), 1);
        assert_eq!(log.transformations().count(), 1);
        assert!(EventKind::Error.is_diagnostic());
        assert!(!EventKind::Warning.is_transformation());
        assert_eq!(log.summary(), "1 widening inserted");
    }
}
