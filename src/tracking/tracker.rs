use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};

use crate::BatchError;

use super::store::{KeyValue, KeyValueStore};

/// How long processed files stay in the tracking table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Entries older than this many days are purged. `None` or `0` keeps
    /// entries forever.
    pub retention_days: Option<u32>,
}

impl ExpiryPolicy {
    pub fn keep_forever() -> Self {
        Self {
            retention_days: None,
        }
    }

    pub fn retain_days(days: u32) -> Self {
        Self {
            retention_days: Some(days),
        }
    }

    /// Instant before which an entry is expired, if expiry is enabled.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.retention_days {
            Some(days) if days > 0 => {
                now.checked_sub_signed(TimeDelta::try_days(i64::from(days))?)
            }
            _ => None,
        }
    }
}

/// Names of files that must not be read again in the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<String>);

impl ExclusionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.0.contains(filename)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Processed time of a file as stored in the table: big-endian milliseconds.
fn encode_timestamp(at: DateTime<Utc>) -> [u8; 8] {
    at.timestamp_millis().to_be_bytes()
}

fn decode_timestamp(value: &[u8]) -> Option<DateTime<Utc>> {
    let bytes: [u8; 8] = value.try_into().ok()?;
    DateTime::from_timestamp_millis(i64::from_be_bytes(bytes))
}

/// Table of processed files and the time they were last processed.
///
/// Only the run coordinator writes to it: once when a run is prepared, to
/// purge expired entries, and once when a successful run is finalized.
#[derive(Clone)]
pub struct ProcessedFileTracker {
    store: Arc<dyn KeyValueStore>,
}

impl ProcessedFileTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Computes the files to skip, purging expired entries on the way.
    ///
    /// An entry whose value is not a valid timestamp is purged as well.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::TrackerScan`] when the table cannot be scanned or
    /// an expired entry cannot be deleted.
    pub fn load_exclusion_set(
        &self,
        policy: &ExpiryPolicy,
        now: DateTime<Utc>,
    ) -> Result<ExclusionSet, BatchError> {
        let cutoff = policy.cutoff(now);
        let entries = self
            .store
            .scan()
            .map_err(|e| BatchError::TrackerScan(e.to_string()))?;

        let mut excluded = BTreeSet::new();
        let mut purged = Vec::new();

        for (key, value) in entries {
            let filename = String::from_utf8_lossy(&key).into_owned();

            let expired = match decode_timestamp(&value) {
                Some(processed_at) => cutoff.is_some_and(|cutoff| processed_at < cutoff),
                None => {
                    warn!("Invalid processed time for {}, purging entry", filename);
                    true
                }
            };

            if expired {
                debug!("Purging expired entry {}", filename);
                purged.push(key);
            } else {
                excluded.insert(filename);
            }
        }

        if !purged.is_empty() {
            self.store
                .delete_all(&purged)
                .map_err(|e| BatchError::TrackerScan(e.to_string()))?;
        }

        info!(
            "Processed file table: {} file(s) excluded, {} expired entries purged",
            excluded.len(),
            purged.len()
        );

        Ok(ExclusionSet(excluded))
    }

    /// Records `filenames` as processed at `at`, replacing earlier times.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::TrackerCommit`] when the batch cannot be written.
    /// The files are written in one `put_all` call, so with an atomic store
    /// none of them is committed after a failure.
    pub fn commit(&self, filenames: &BTreeSet<String>, at: DateTime<Utc>) -> Result<(), BatchError> {
        if filenames.is_empty() {
            return Ok(());
        }
        let value = encode_timestamp(at).to_vec();
        let entries: Vec<KeyValue> = filenames
            .iter()
            .map(|filename| (filename.as_bytes().to_vec(), value.clone()))
            .collect();
        self.store.put_all(&entries).map_err(|e| {
            BatchError::TrackerCommit(format!("{} file(s) not committed: {}", filenames.len(), e))
        })?;
        info!("Committed {} processed file(s)", filenames.len());
        Ok(())
    }

    /// Last processed time of `filename`, if tracked.
    pub fn processed_at(&self, filename: &str) -> Result<Option<DateTime<Utc>>, BatchError> {
        Ok(self
            .store
            .get(filename.as_bytes())?
            .as_deref()
            .and_then(decode_timestamp))
    }
}
