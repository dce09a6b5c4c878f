use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use reelvault_catalog::*;
use reelvault_db::*;
use serde_json::json;

fn commands() -> CommandRepository {
    let db = Database::open_memory().unwrap();
    CommandRepository::new(db, Arc::new(NullSink))
}

fn ended(name: &str, hours_ago: i64) -> CommandModel {
    let ended_at = Utc::now() - TimeDelta::hours(hours_ago);
    let mut command = CommandModel::queued(name, json!({}), ended_at - TimeDelta::minutes(5));
    command.status = CommandStatus::Completed;
    command.started_at = Some(ended_at - TimeDelta::minutes(1));
    command.ended_at = Some(ended_at);
    command.duration = Some(TimeDelta::minutes(1));
    command
}

#[test]
fn lifecycle_is_persisted() {
    let repo = commands();
    let mut command = repo
        .enqueue(
            CommandModel::queued("RefreshMovie", json!({ "movieId": 7 }), Utc::now())
                .with_priority(CommandPriority::High)
                .with_trigger(CommandTrigger::Manual),
        )
        .unwrap();
    assert!(command.id > 0);
    assert_eq!(repo.queued().unwrap().len(), 1);

    repo.start(&mut command).unwrap();
    let stored = repo.get(command.id).unwrap();
    assert_eq!(stored.status, CommandStatus::Started);
    assert!(stored.started_at.is_some());
    assert_eq!(repo.started().unwrap().len(), 1);

    repo.end(&mut command, CommandOutcome::Failed("indexer offline".into()))
        .unwrap();
    let stored = repo.get(command.id).unwrap();
    assert_eq!(stored.status, CommandStatus::Failed);
    assert_eq!(stored.exception.as_deref(), Some("indexer offline"));
    assert!(stored.ended_at.is_some());
    assert!(stored.duration.is_some());
    assert_eq!(stored.body, json!({ "movieId": 7 }));
    assert_eq!(stored.priority, CommandPriority::High);
    assert_eq!(stored.trigger, CommandTrigger::Manual);
}

#[test]
fn enqueue_requires_a_queued_command() {
    let repo = commands();
    let err = repo.enqueue(ended("RssSync", 1)).unwrap_err();
    assert!(matches!(err, OperationError::Transition(_)));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn illegal_transitions_leave_the_row_alone() {
    let repo = commands();
    let mut command = repo
        .enqueue(CommandModel::queued("RssSync", json!({}), Utc::now()))
        .unwrap();

    // Queued commands cannot end as completed without starting.
    let err = repo.end(&mut command, CommandOutcome::Completed).unwrap_err();
    assert!(matches!(err, OperationError::Transition(_)));
    assert_eq!(repo.get(command.id).unwrap().status, CommandStatus::Queued);
}

#[test]
fn failed_writes_leave_the_model_unchanged() {
    let repo = commands();
    let mut command = repo
        .enqueue(CommandModel::queued("RssSync", json!({}), Utc::now()))
        .unwrap();
    let queued = command.clone();
    repo.delete(command.id).unwrap();

    let err = repo.start(&mut command).unwrap_err();
    assert!(matches!(err, OperationError::NotFound { .. }));
    assert_eq!(command, queued);

    let mut running = repo
        .enqueue(CommandModel::queued("RefreshMovie", json!({}), Utc::now()))
        .unwrap();
    repo.start(&mut running).unwrap();
    let started = running.clone();
    repo.delete(running.id).unwrap();

    let err = repo.end(&mut running, CommandOutcome::Completed).unwrap_err();
    assert!(matches!(err, OperationError::NotFound { .. }));
    assert_eq!(running, started);
    assert_eq!(running.status, CommandStatus::Started);
}

#[test]
fn started_commands_are_orphaned_on_recovery() {
    let repo = commands();
    let mut running = repo
        .enqueue(CommandModel::queued("RefreshMovie", json!({}), Utc::now()))
        .unwrap();
    repo.start(&mut running).unwrap();
    let waiting = repo
        .enqueue(CommandModel::queued("RssSync", json!({}), Utc::now()))
        .unwrap();
    let done = repo.insert(ended("Backup", 1)).unwrap();

    assert_eq!(repo.orphan_started().unwrap(), 1);

    let running = repo.get(running.id).unwrap();
    assert_eq!(running.status, CommandStatus::Orphaned);
    assert!(running.ended_at.is_some());
    assert_eq!(repo.get(waiting.id).unwrap().status, CommandStatus::Queued);
    assert_eq!(repo.get(done.id).unwrap().status, CommandStatus::Completed);

    // Nothing left to recover.
    assert_eq!(repo.orphan_started().unwrap(), 0);
}

#[test]
fn trim_keeps_recent_and_unfinished_commands() {
    let repo = commands();
    let old = repo.insert(ended("Backup", 25)).unwrap();
    let recent = repo.insert(ended("Backup", 1)).unwrap();
    let queued = repo
        .enqueue(CommandModel::queued("Backup", json!({}), Utc::now() - TimeDelta::days(3)))
        .unwrap();

    assert_eq!(repo.trim().unwrap(), 1);
    assert!(repo.find(old.id).unwrap().is_none());
    assert!(repo.find(recent.id).unwrap().is_some());
    assert!(repo.find(queued.id).unwrap().is_some());
}

#[test]
fn trim_before_applies_to_any_end_state() {
    let repo = commands();
    let mut failed = ended("RssSync", 48);
    failed.status = CommandStatus::Failed;
    failed.exception = Some("timeout".into());
    repo.insert(failed).unwrap();
    let mut orphaned = ended("RssSync", 48);
    orphaned.status = CommandStatus::Orphaned;
    repo.insert(orphaned).unwrap();

    assert_eq!(repo.trim_before(Utc::now() - TimeDelta::hours(2)).unwrap(), 2);
    assert!(!repo.has_items().unwrap());
}

#[test]
fn active_commands_by_name() {
    let repo = commands();
    let mut started = repo
        .enqueue(CommandModel::queued("RefreshMovie", json!({}), Utc::now()))
        .unwrap();
    repo.start(&mut started).unwrap();
    repo.enqueue(CommandModel::queued("RefreshMovie", json!({}), Utc::now()))
        .unwrap();
    repo.insert(ended("RefreshMovie", 1)).unwrap();
    repo.enqueue(CommandModel::queued("RssSync", json!({}), Utc::now()))
        .unwrap();

    assert_eq!(repo.find_commands("RefreshMovie").unwrap().len(), 3);
    let active = repo.find_queued_or_started("RefreshMovie").unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|c| !c.status.is_ended()));
}
