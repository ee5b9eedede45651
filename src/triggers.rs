//! Wait triggers
//!
//! A waiting query parks until a named event source fires or its timeout
//! elapses. The registry is fixed; `WaitTrigger` lines resolve against it
//! and anything else is a bad request.

use crate::query::{QueryError, QueryResult};

/// Event sources that can wake a waiting query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Any of the sources below
    All,
    /// A check result came in
    Check,
    /// A host or service changed state
    State,
    /// A log line was written
    Log,
    /// A downtime was set or removed
    Downtime,
    /// A comment was added or removed
    Comment,
    /// An external command was executed
    Command,
    /// The monitoring core was reconfigured
    Program,
}

impl Trigger {
    pub const ALL: [Trigger; 8] = [
        Trigger::All,
        Trigger::Check,
        Trigger::State,
        Trigger::Log,
        Trigger::Downtime,
        Trigger::Comment,
        Trigger::Command,
        Trigger::Program,
    ];

    /// Resolve a trigger by its protocol name.
    pub fn from_name(name: &str) -> QueryResult<Self> {
        match name {
            "all" => Ok(Self::All),
            "check" => Ok(Self::Check),
            "state" => Ok(Self::State),
            "log" => Ok(Self::Log),
            "downtime" => Ok(Self::Downtime),
            "comment" => Ok(Self::Comment),
            "command" => Ok(Self::Command),
            "program" => Ok(Self::Program),
            _ => Err(QueryError::InvalidTrigger(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Check => "check",
            Self::State => "state",
            Self::Log => "log",
            Self::Downtime => "downtime",
            Self::Comment => "comment",
            Self::Command => "command",
            Self::Program => "program",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
