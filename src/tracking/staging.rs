use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, error, warn};
use uuid::Uuid;

use crate::BatchError;

use super::fs::FileSystem;

/// Extension of staging artifacts.
const ARTIFACT_EXTENSION: &str = "processed";

/// Encodes a staged filename: 2-byte big-endian length, then UTF-8 bytes.
fn encode_artifact(filename: &str) -> Result<Vec<u8>, BatchError> {
    let len = u16::try_from(filename.len()).map_err(|_| {
        BatchError::StagingWrite(format!("filename too long ({} bytes)", filename.len()))
    })?;
    let mut artifact = Vec::with_capacity(filename.len() + 2);
    artifact.extend_from_slice(&len.to_be_bytes());
    artifact.extend_from_slice(filename.as_bytes());
    Ok(artifact)
}

fn decode_artifact(artifact: &[u8]) -> Option<String> {
    let (len, rest) = artifact.split_first_chunk::<2>()?;
    let len = usize::from(u16::from_be_bytes(*len));
    let bytes = rest.get(..len)?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Creates run-scoped staging areas under a root folder.
#[derive(Clone)]
pub struct PendingCommitStaging {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl PendingCommitStaging {
    pub fn new<P: AsRef<Path>>(fs: Arc<dyn FileSystem>, root: P) -> Self {
        Self {
            fs,
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Creates the staging area of run `run_id`.
    ///
    /// The run id must be distinct across concurrent and retried runs; an
    /// area that already exists is reused.
    pub fn create_staging_area(&self, run_id: &str) -> Result<StagingArea, BatchError> {
        if run_id.is_empty() || run_id.contains(['/', '\\']) {
            return Err(BatchError::Configuration(format!(
                "Invalid staging run id: '{}'",
                run_id
            )));
        }
        let dir = self.root.join(run_id);
        self.fs.create_dir_all(&dir)?;
        debug!("Created staging area {}", dir.display());

        Ok(StagingArea {
            fs: Arc::clone(&self.fs),
            dir,
            deleted: false,
        })
    }
}

/// Staging area of one run.
///
/// The area is removed by [`StagingArea::delete`] or, failing that, when it
/// is dropped. It never outlives the run that created it.
pub struct StagingArea {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    deleted: bool,
}

impl StagingArea {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Handle given to workers to stage the files they processed.
    pub fn recorder(&self) -> StagingRecorder {
        StagingRecorder {
            fs: Arc::clone(&self.fs),
            dir: self.dir.clone(),
        }
    }

    /// Reads every staged filename.
    ///
    /// Must only be called once all workers are done. A missing or empty
    /// area yields an empty set; unreadable artifacts are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::FinalizeDrain`] when the area cannot be listed.
    pub fn drain(&self) -> Result<BTreeSet<String>, BatchError> {
        let mut filenames = BTreeSet::new();

        if !self.fs.exists(&self.dir) {
            warn!("Staging area {} is missing", self.dir.display());
            return Ok(filenames);
        }

        let artifacts = self
            .fs
            .list(&self.dir)
            .map_err(|e| BatchError::FinalizeDrain(format!("{}: {}", self.dir.display(), e)))?;

        for artifact in artifacts {
            let content = match self.fs.read(&artifact) {
                Ok(content) => content,
                Err(e) => {
                    error!("Unable to read staging artifact {}: {}", artifact.display(), e);
                    continue;
                }
            };
            match decode_artifact(&content) {
                Some(filename) => {
                    filenames.insert(filename);
                }
                None => error!("Invalid staging artifact {}", artifact.display()),
            }
        }

        debug!(
            "Drained {} processed file(s) from {}",
            filenames.len(),
            self.dir.display()
        );
        Ok(filenames)
    }

    /// Removes the area and everything staged in it.
    pub fn delete(&mut self) -> Result<(), BatchError> {
        self.fs.remove_dir_all(&self.dir)?;
        self.deleted = true;
        debug!("Deleted staging area {}", self.dir.display());
        Ok(())
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if !self.deleted {
            if let Err(e) = self.delete() {
                warn!(
                    "Unable to delete staging area {}: {}",
                    self.dir.display(),
                    e
                );
            }
        }
    }
}

/// Writes one artifact per processed file into a staging area.
///
/// Cloned freely across workers: every call writes a new, uniquely named
/// artifact, so workers never contend on a shared file.
#[derive(Clone)]
pub struct StagingRecorder {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl StagingRecorder {
    /// Stages `filename` as processed by this run.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::StagingWrite`] when the artifact cannot be written.
    /// The file is then simply not committed and will be read again next run.
    pub fn record_processed(&self, filename: &str) -> Result<(), BatchError> {
        let artifact = encode_artifact(filename)?;
        let path = self
            .dir
            .join(format!("{}.{}", Uuid::new_v4(), ARTIFACT_EXTENSION));

        self.fs
            .write(&path, &artifact)
            .map_err(|e| BatchError::StagingWrite(format!("{}: {}", filename, e)))?;

        debug!("Staged {} in {}", filename, path.display());
        Ok(())
    }
}
