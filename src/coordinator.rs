//! Lifecycle of a run: prepare, process, finalize.
//!
//! ```text
//! Preparing --> Processing --> Finalizing --> Committed
//!                                        \--> Failed
//! ```
//!
//! Preparing validates the configuration, opens the processed-file table,
//! creates the run's staging area and computes the files to skip. Workers
//! then read the eligible files, each one staging the names of the files it
//! fully consumed. Finalizing commits the staged names to the table when the
//! run succeeded, and always removes the staging area. A failed run therefore
//! leaves the table exactly as preparation left it.

use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::{
    BatchError,
    clock::{Clock, SystemClock},
    config::{ReaderSettings, XmlReaderConfig},
    core::{
        item::{ItemWriter, PassThroughProcessor},
        job::{Job, JobBuilder, JobExecution},
        step::{ChunkOrientedStep, StepBuilder},
    },
    item::xml::{FileRecordReader, FileRecordReaderBuilder, XmlRecord, discovery::resolve_input_files},
    tracking::{
        ExclusionSet, FileSystem, PendingCommitStaging, ProcessedFileTracker, StagingArea,
        StagingRecorder, TableProvider,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Preparing,
    Processing,
    Finalizing,
    Committed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Preparing => "PREPARING",
            RunState::Processing => "PROCESSING",
            RunState::Finalizing => "FINALIZING",
            RunState::Committed => "COMMITTED",
            RunState::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// A prepared run, ready for its workers.
pub struct PreparedRun {
    state: RunState,
    settings: ReaderSettings,
    exclusions: ExclusionSet,
    tracker: Option<ProcessedFileTracker>,
    staging: Option<StagingArea>,
}

impl PreparedRun {
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    /// Files skipped by this run because they were already processed.
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Staging area directory, when tracking is on.
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(StagingArea::dir)
    }

    /// Recorder workers stage processed files with, when tracking is on.
    pub fn recorder(&self) -> Option<StagingRecorder> {
        self.staging.as_ref().map(StagingArea::recorder)
    }

    /// Files this run reads, in reading order.
    pub fn eligible_files(&self) -> Result<Vec<PathBuf>, BatchError> {
        resolve_input_files(
            &self.settings.path,
            self.settings.pattern.as_ref(),
            &self.exclusions,
        )
    }

    fn reader_for(&self, files: Vec<PathBuf>) -> Result<FileRecordReader, BatchError> {
        FileRecordReaderBuilder::new()
            .node_path(&self.settings.node_path)
            .files(files)
            .action(self.settings.action.clone())
            .recorder(self.recorder())
            .build()
    }

    /// Single reader over every eligible file.
    pub fn reader(&self) -> Result<FileRecordReader, BatchError> {
        self.reader_for(self.eligible_files()?)
    }

    /// Splits the eligible files into `count` disjoint readers, one per worker.
    ///
    /// Files are dealt round-robin; some readers may get no file at all.
    pub fn partitions(&self, count: usize) -> Result<Vec<FileRecordReader>, BatchError> {
        if count == 0 {
            return Err(BatchError::Configuration(
                "Partition count must be greater than 0".to_string(),
            ));
        }

        let mut partitions = vec![Vec::new(); count];
        for (index, file) in self.eligible_files()?.into_iter().enumerate() {
            partitions[index % count].push(file);
        }

        partitions
            .into_iter()
            .map(|files| self.reader_for(files))
            .collect()
    }
}

/// Result of a finalized run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub state: RunState,
    /// Files written to the processed-file table by this run
    pub committed: BTreeSet<String>,
}

/// Drives runs of the XML file source.
///
/// # Examples
///
/// ```
/// use std::{fs, sync::Arc};
/// use chrono::Utc;
/// use xml_file_batch::{
///     config::XmlReaderConfig,
///     coordinator::{RunCoordinator, RunState},
///     item::json::JsonItemWriterBuilder,
///     tracking::{InMemoryTables, LocalFileSystem},
/// };
///
/// let dir = tempfile::TempDir::new().unwrap();
/// fs::create_dir(dir.path().join("in")).unwrap();
/// fs::write(dir.path().join("in/a.xml"), "<a><b>1</b><b>2</b></a>").unwrap();
///
/// let config = XmlReaderConfig {
///     path: dir.path().join("in").display().to_string(),
///     node_path: "/a/b".to_string(),
///     table_name: Some("processed".to_string()),
///     temporary_folder: dir.path().join("tmp").display().to_string(),
///     ..Default::default()
/// };
/// let coordinator = RunCoordinator::new(Arc::new(InMemoryTables::new()), Arc::new(LocalFileSystem));
/// let writer = JsonItemWriterBuilder::new().from_path(dir.path().join("out.jsonl")).unwrap();
///
/// let first = coordinator.run(&config, Utc::now(), &writer, 10).unwrap();
/// assert_eq!(first.state, RunState::Committed);
/// assert!(first.committed.contains("a.xml"));
///
/// // a.xml is tracked now, so the next run skips it
/// let second = coordinator.run(&config, Utc::now(), &writer, 10).unwrap();
/// assert!(second.committed.is_empty());
/// ```
pub struct RunCoordinator {
    tables: Arc<dyn TableProvider>,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
}

impl RunCoordinator {
    pub fn new(tables: Arc<dyn TableProvider>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            tables,
            fs,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Prepares a run started at `logical_start_time`.
    ///
    /// The staging area is named after the table and the logical start time,
    /// so retried runs need distinct start times. Nothing is left behind when
    /// preparation fails: the staging area is removed and the table is only
    /// changed by the purge of expired entries.
    ///
    /// # Errors
    ///
    /// - [`BatchError::Validation`] when the configuration is invalid
    /// - [`BatchError::TrackerScan`] when the table cannot be scanned
    /// - any error raised opening the table or creating the staging area
    pub fn prepare(
        &self,
        config: &XmlReaderConfig,
        logical_start_time: DateTime<Utc>,
    ) -> Result<PreparedRun, BatchError> {
        debug!("Run state: {}", RunState::Preparing);
        let settings = config.settings()?;

        let (tracker, staging, exclusions) = match &settings.tracking {
            Some(tracking) => {
                let tracker =
                    ProcessedFileTracker::new(self.tables.open_or_create(&tracking.table_name)?);

                let run_id = format!(
                    "{}{}",
                    tracking.table_name,
                    logical_start_time.timestamp_millis()
                );
                let staging = PendingCommitStaging::new(
                    Arc::clone(&self.fs),
                    &tracking.temporary_folder,
                )
                .create_staging_area(&run_id)?;

                let exclusions = if settings.reprocessing_required {
                    info!("Reprocessing required, no file is excluded");
                    ExclusionSet::empty()
                } else {
                    tracker.load_exclusion_set(&tracking.expiry, self.clock.now())?
                };

                (Some(tracker), Some(staging), exclusions)
            }
            None => (None, None, ExclusionSet::empty()),
        };

        info!(
            "Prepared run over {} ({} file(s) excluded)",
            settings.path,
            exclusions.len()
        );

        Ok(PreparedRun {
            state: RunState::Processing,
            settings,
            exclusions,
            tracker,
            staging,
        })
    }

    /// Ends a run once every worker is done.
    ///
    /// On success the staged files are committed with the current time.
    /// Draining and committing errors are logged and leave the state
    /// `Committed` with nothing reported as committed; the files will be read
    /// again by the next run. On failure nothing is committed. The staging
    /// area is removed in both cases.
    pub fn finalize(&self, mut run: PreparedRun, succeeded: bool) -> RunOutcome {
        run.state = RunState::Finalizing;
        debug!("Run state: {}", run.state);

        let mut committed = BTreeSet::new();

        if succeeded {
            if let (Some(tracker), Some(staging)) = (&run.tracker, &run.staging) {
                match staging.drain() {
                    Ok(staged) => match tracker.commit(&staged, self.clock.now()) {
                        Ok(()) => committed = staged,
                        Err(e) => error!("{}", e),
                    },
                    Err(e) => error!("{}", e),
                }
            }
            run.state = RunState::Committed;
        } else {
            warn!("Run failed, processed files are not committed");
            run.state = RunState::Failed;
        }

        if let Some(mut staging) = run.staging.take() {
            if let Err(e) = staging.delete() {
                warn!("Unable to delete staging area {}: {}", staging.dir().display(), e);
            }
        }

        info!("Run state: {}", run.state);
        RunOutcome {
            state: run.state,
            committed,
        }
    }

    /// Prepares, processes and finalizes a run, writing every record to
    /// `writer` through a chunk-oriented step.
    ///
    /// # Errors
    ///
    /// Only preparation errors are returned; a failing step ends the run as
    /// [`RunState::Failed`].
    pub fn run(
        &self,
        config: &XmlReaderConfig,
        logical_start_time: DateTime<Utc>,
        writer: &dyn ItemWriter<XmlRecord>,
        chunk_size: u16,
    ) -> Result<RunOutcome, BatchError> {
        let run = self.prepare(config, logical_start_time)?;

        let succeeded = match Self::process(&run, writer, chunk_size) {
            Ok(execution) => {
                info!(
                    "Read {} record(s), wrote {} in {:?}",
                    execution.read_count(),
                    execution.write_count(),
                    execution.duration
                );
                true
            }
            Err(e) => {
                error!("Processing failed: {}", e);
                false
            }
        };

        Ok(self.finalize(run, succeeded))
    }

    fn process(
        run: &PreparedRun,
        writer: &dyn ItemWriter<XmlRecord>,
        chunk_size: u16,
    ) -> Result<JobExecution, BatchError> {
        let reader = run.reader()?;
        let processor = PassThroughProcessor;

        let step: ChunkOrientedStep<XmlRecord, XmlRecord> = StepBuilder::new()
            .name("read-xml-files")
            .reader(&reader)
            .processor(&processor)
            .writer(writer)
            .chunk(chunk_size)
            .build()?;

        let job = JobBuilder::new().name("xml-file-batch").start(&step).build();
        job.run()
    }
}
