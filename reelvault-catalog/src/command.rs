//! Background command records and their lifecycle.
//!
//! ```text
//! Queued ──start──▶ Started ──end──▶ Completed | Failed | Aborted
//!                      │
//!                      └──startup recovery──▶ Orphaned
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An illegal status change was requested.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Command '{name}' cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
    pub name: String,
    pub from: CommandStatus,
    pub to: CommandStatus,
}

/// Status of a background command. Persisted as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandStatus {
    Queued,
    Started,
    Completed,
    Failed,
    Aborted,
    Orphaned,
}

impl CommandStatus {
    pub fn code(self) -> i64 {
        match self {
            Self::Queued => 0,
            Self::Started => 1,
            Self::Completed => 2,
            Self::Failed => 3,
            Self::Aborted => 4,
            Self::Orphaned => 6,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Queued),
            1 => Some(Self::Started),
            2 => Some(Self::Completed),
            3 => Some(Self::Failed),
            4 => Some(Self::Aborted),
            6 => Some(Self::Orphaned),
            _ => None,
        }
    }

    /// Whether a command in this status has finished, one way or another.
    pub fn is_ended(self) -> bool {
        !matches!(self, Self::Queued | Self::Started)
    }

    /// Transitions reachable during normal execution. `Orphaned` is only
    /// assigned by the startup sweep and is deliberately absent.
    pub fn can_transition_to(self, next: CommandStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Started)
                | (Self::Started, Self::Completed)
                | (Self::Started, Self::Failed)
                | (Self::Started, Self::Aborted)
        )
    }
}

/// Scheduling priority of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommandPriority {
    #[default]
    Normal,
    High,
    Low,
}

impl CommandPriority {
    pub fn code(self) -> i64 {
        match self {
            Self::Normal => 0,
            Self::High => 1,
            Self::Low => 2,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::High,
            2 => Self::Low,
            _ => Self::Normal,
        }
    }
}

/// What caused a command to be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommandTrigger {
    #[default]
    Unspecified,
    Manual,
    Scheduled,
}

impl CommandTrigger {
    pub fn code(self) -> i64 {
        match self {
            Self::Unspecified => 0,
            Self::Manual => 1,
            Self::Scheduled => 2,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Manual,
            2 => Self::Scheduled,
            _ => Self::Unspecified,
        }
    }
}

/// One execution of a background job.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandModel {
    pub id: i64,
    pub name: String,
    /// Command arguments as a JSON document.
    pub body: serde_json::Value,
    pub priority: CommandPriority,
    pub trigger: CommandTrigger,
    pub status: CommandStatus,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: Option<TimeDelta>,
    pub exception: Option<String>,
}

impl CommandModel {
    /// A new, unsaved command in the `Queued` state.
    pub fn queued(name: impl Into<String>, body: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            body,
            priority: CommandPriority::default(),
            trigger: CommandTrigger::default(),
            status: CommandStatus::Queued,
            queued_at: now,
            started_at: None,
            ended_at: None,
            duration: None,
            exception: None,
        }
    }

    pub fn with_priority(mut self, priority: CommandPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_trigger(mut self, trigger: CommandTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn mark_started(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(CommandStatus::Started)?;
        self.started_at = Some(now);
        Ok(())
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.finish(CommandStatus::Completed, now, None)
    }

    pub fn mark_failed(
        &mut self,
        now: DateTime<Utc>,
        exception: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.finish(CommandStatus::Failed, now, Some(exception.into()))
    }

    pub fn mark_aborted(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.finish(CommandStatus::Aborted, now, None)
    }

    /// Reclassify a command that was running when the process died. Only the
    /// startup sweep calls this.
    pub fn mark_orphaned(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != CommandStatus::Started {
            return Err(TransitionError {
                name: self.name.clone(),
                from: self.status,
                to: CommandStatus::Orphaned,
            });
        }
        self.status = CommandStatus::Orphaned;
        self.ended_at = Some(now);
        Ok(())
    }

    fn finish(
        &mut self,
        status: CommandStatus,
        now: DateTime<Utc>,
        exception: Option<String>,
    ) -> Result<(), TransitionError> {
        self.transition(status)?;
        self.ended_at = Some(now);
        self.duration = self.started_at.map(|started| now - started);
        self.exception = exception;
        Ok(())
    }

    fn transition(&mut self, next: CommandStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                name: self.name.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
