//! Background command tracking.
//!
//! A command row is written when the command is queued and touched twice
//! after that: once when it starts and once when it ends. Rows still marked
//! `Started` when the process comes up again were running when it died;
//! [`CommandRepository::orphan_started`] reclassifies them.

use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use reelvault_catalog::{CommandModel, CommandStatus, TransitionError};

use crate::builder::SqlBuilder;
use crate::datastore::Database;
use crate::error::OperationError;
use crate::events::EventSink;
use crate::mapping::timestamp_value;
use crate::repository::BasicRepository;
use crate::tables::CommandFields;

/// How long ended commands are kept, in hours.
pub const RETENTION_HOURS: i64 = 24;

/// How a started command finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    Failed(String),
    Aborted,
}

#[derive(Clone)]
pub struct CommandRepository {
    repo: BasicRepository<CommandModel>,
}

impl Deref for CommandRepository {
    type Target = BasicRepository<CommandModel>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl CommandRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db).with_events(events),
        }
    }

    /// Record a newly queued command.
    pub fn enqueue(&self, command: CommandModel) -> Result<CommandModel, OperationError> {
        if command.status != CommandStatus::Queued {
            return Err(TransitionError {
                name: command.name,
                from: command.status,
                to: CommandStatus::Queued,
            }
            .into());
        }
        self.insert(command)
    }

    /// The caller's model only changes once the row is written.
    pub fn start(&self, command: &mut CommandModel) -> Result<(), OperationError> {
        let mut next = command.clone();
        next.mark_started(Utc::now())?;
        self.set_fields(&next, &[CommandFields::STARTED_AT, CommandFields::STATUS])?;
        *command = next;
        Ok(())
    }

    pub fn end(
        &self,
        command: &mut CommandModel,
        outcome: CommandOutcome,
    ) -> Result<(), OperationError> {
        let now = Utc::now();
        let mut next = command.clone();
        match outcome {
            CommandOutcome::Completed => next.mark_completed(now)?,
            CommandOutcome::Failed(message) => next.mark_failed(now, message)?,
            CommandOutcome::Aborted => next.mark_aborted(now)?,
        }
        self.set_fields(
            &next,
            &[
                CommandFields::ENDED_AT,
                CommandFields::STATUS,
                CommandFields::DURATION,
                CommandFields::EXCEPTION,
            ],
        )?;
        *command = next;
        Ok(())
    }

    /// Mark every command still in `Started` as `Orphaned`. Only the command
    /// host runs this, once at startup, before anything new can start.
    pub fn orphan_started(&self) -> Result<usize, OperationError> {
        let builder = SqlBuilder::new::<CommandModel>()
            .equal(CommandFields::STATUS, CommandStatus::Started.code())?;
        let orphaned = self.set_fields_where(
            builder,
            &[
                (CommandFields::STATUS, CommandStatus::Orphaned.code().into()),
                (CommandFields::ENDED_AT, timestamp_value(&Utc::now())),
            ],
        )?;
        if orphaned > 0 {
            log::info!("Marked {} interrupted command(s) as orphaned", orphaned);
        }
        Ok(orphaned)
    }

    /// Delete commands that ended more than [`RETENTION_HOURS`] ago.
    pub fn trim(&self) -> Result<usize, OperationError> {
        self.trim_before(Utc::now() - TimeDelta::hours(RETENTION_HOURS))
    }

    /// Delete commands that ended before `cutoff`, whatever their status.
    pub fn trim_before(&self, cutoff: DateTime<Utc>) -> Result<usize, OperationError> {
        let builder = SqlBuilder::new::<CommandModel>()
            .less_than(CommandFields::ENDED_AT, timestamp_value(&cutoff))?;
        let removed = self.delete_where(builder)?;
        if removed > 0 {
            log::info!("Trimmed {} command(s) ended before {}", removed, cutoff);
        }
        Ok(removed)
    }

    pub fn find_commands(&self, name: &str) -> Result<Vec<CommandModel>, OperationError> {
        self.query(self.builder().equal(CommandFields::NAME, name.to_string())?)
    }

    pub fn find_queued_or_started(&self, name: &str) -> Result<Vec<CommandModel>, OperationError> {
        let builder = self
            .builder()
            .equal(CommandFields::NAME, name.to_string())?
            .in_set(
                CommandFields::STATUS,
                [CommandStatus::Queued.code(), CommandStatus::Started.code()],
            )?;
        self.query(builder)
    }

    pub fn queued(&self) -> Result<Vec<CommandModel>, OperationError> {
        self.with_status(CommandStatus::Queued)
    }

    pub fn started(&self) -> Result<Vec<CommandModel>, OperationError> {
        self.with_status(CommandStatus::Started)
    }

    fn with_status(&self, status: CommandStatus) -> Result<Vec<CommandModel>, OperationError> {
        self.query(self.builder().equal(CommandFields::STATUS, status.code())?)
    }
}
