//! Key/value settings stored alongside the library.

use std::ops::Deref;
use std::sync::Arc;

use reelvault_catalog::ConfigEntry;

use crate::datastore::Database;
use crate::error::OperationError;
use crate::events::EventSink;
use crate::repository::BasicRepository;
use crate::tables::ConfigFields;

#[derive(Clone)]
pub struct ConfigRepository {
    repo: BasicRepository<ConfigEntry>,
}

impl Deref for ConfigRepository {
    type Target = BasicRepository<ConfigEntry>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl ConfigRepository {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        Self {
            repo: BasicRepository::new(db).with_events(events),
        }
    }

    pub fn find_by_key(&self, key: &str) -> Result<Option<ConfigEntry>, OperationError> {
        let builder = self
            .builder()
            .equal(ConfigFields::KEY, key.to_lowercase())?;
        Ok(self.query(builder)?.into_iter().next())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>, OperationError> {
        Ok(self.find_by_key(key)?.map(|entry| entry.value))
    }

    /// Set `key` to `value`, creating the entry if needed. Keys are case
    /// insensitive.
    ///
    /// Reads then writes without a lock: two writers racing on a new key can
    /// both try to insert, and the loser fails on the unique key.
    pub fn upsert(&self, key: &str, value: &str) -> Result<ConfigEntry, OperationError> {
        match self.find_by_key(key)? {
            Some(mut entry) => {
                entry.value = value.to_string();
                self.set_fields(&entry, &[ConfigFields::VALUE])?;
                Ok(entry)
            }
            None => self.insert(ConfigEntry {
                id: 0,
                key: key.to_lowercase(),
                value: value.to_string(),
            }),
        }
    }
}
