use std::time::{Duration, Instant};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    item::{ItemProcessor, ItemReader, ItemWriter},
};

/// Status of a chunk after a read.
#[derive(Debug, PartialEq)]
pub enum ChunkStatus {
    /// The chunk holds `chunk_size` items, more may follow
    Full,
    /// The reader is exhausted
    Finished,
}

/// Status of a step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Starting,
    Started,
    Success,
    ReadError,
    ProcessorError,
    WriteError,
}

/// Runtime information about one execution of a step.
#[derive(Debug, Clone)]
pub struct StepExecution {
    /// Unique identifier for this step execution
    pub id: Uuid,
    /// Human-readable name for the step
    pub name: String,
    /// Current status of the step execution
    pub status: StepStatus,
    pub start_time: Instant,
    pub end_time: Instant,
    pub duration: Duration,
    /// Number of items successfully read
    pub read_count: usize,
    /// Number of items successfully written
    pub write_count: usize,
    /// Number of errors encountered during reading
    pub read_error_count: usize,
    /// Number of errors encountered during processing
    pub process_error_count: usize,
    /// Number of errors encountered during writing
    pub write_error_count: usize,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: StepStatus::Starting,
            start_time: now,
            end_time: now,
            duration: Duration::ZERO,
            read_count: 0,
            write_count: 0,
            read_error_count: 0,
            process_error_count: 0,
            write_error_count: 0,
        }
    }
}

/// A phase of a job.
pub trait Step {
    /// Name of the step, used for logging and step executions.
    fn name(&self) -> &str;

    /// Executes the step.
    ///
    /// # Returns
    /// - `Ok(())`: The step completed successfully
    /// - `Err(BatchError)`: The step failed, `step_execution.status` tells why
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError>;
}

/// A step reading, processing and writing items chunk by chunk.
pub struct ChunkOrientedStep<'a, I, O> {
    name: String,
    /// Component responsible for reading items from the source
    reader: &'a dyn ItemReader<I>,
    /// Component responsible for processing items
    processor: &'a dyn ItemProcessor<I, O>,
    /// Component responsible for writing items to the destination
    writer: &'a dyn ItemWriter<O>,
    /// Number of items to process in each chunk
    chunk_size: u16,
    /// Maximum number of errors allowed before failing the step
    skip_limit: u16,
}

impl<I, O> Step for ChunkOrientedStep<'_, I, O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        let start_time = Instant::now();
        step_execution.status = StepStatus::Started;

        info!(
            "Start of step: {}, id: {}",
            step_execution.name, step_execution.id
        );

        Self::manage_error(self.writer.open());

        loop {
            let (read_items, chunk_status) = match self.read_chunk(step_execution) {
                Ok(chunk) => chunk,
                Err(_) => break,
            };

            let processed_items = match self.process_chunk(step_execution, &read_items) {
                Ok(items) => items,
                Err(_) => break,
            };

            if self.write_chunk(step_execution, &processed_items).is_err() {
                break;
            }

            if chunk_status == ChunkStatus::Finished {
                step_execution.status = StepStatus::Success;
                break;
            }
        }

        Self::manage_error(self.writer.close());

        info!(
            "End of step: {}, id: {}",
            step_execution.name, step_execution.id
        );

        step_execution.start_time = start_time;
        step_execution.end_time = Instant::now();
        step_execution.duration = start_time.elapsed();

        if step_execution.status == StepStatus::Success {
            Ok(())
        } else {
            Err(BatchError::Step(step_execution.name.clone()))
        }
    }
}

impl<I, O> ChunkOrientedStep<'_, I, O> {
    /// Reads up to `chunk_size` items.
    ///
    /// Read errors are counted and skipped until the skip limit is reached.
    fn read_chunk(
        &self,
        step_execution: &mut StepExecution,
    ) -> Result<(Vec<I>, ChunkStatus), BatchError> {
        debug!("Start reading chunk");

        let mut read_items = Vec::with_capacity(self.chunk_size as usize);

        loop {
            match self.reader.read() {
                Ok(Some(item)) => {
                    read_items.push(item);
                    step_execution.read_count += 1;

                    if read_items.len() >= self.chunk_size as usize {
                        return Ok((read_items, ChunkStatus::Full));
                    }
                }
                Ok(None) => {
                    debug!("End reading chunk: FINISHED");
                    return Ok((read_items, ChunkStatus::Finished));
                }
                Err(error) => {
                    warn!("Error reading item: {}", error);
                    step_execution.read_error_count += 1;

                    if self.is_skip_limit_reached(step_execution) {
                        step_execution.status = StepStatus::ReadError;
                        return Err(error);
                    }
                }
            }
        }
    }

    fn process_chunk(
        &self,
        step_execution: &mut StepExecution,
        read_items: &[I],
    ) -> Result<Vec<O>, BatchError> {
        debug!("Processing chunk of {} items", read_items.len());
        let mut result = Vec::with_capacity(read_items.len());

        for item in read_items {
            match self.processor.process(item) {
                Ok(processed_item) => result.push(processed_item),
                Err(error) => {
                    warn!("Error processing item: {}", error);
                    step_execution.process_error_count += 1;

                    if self.is_skip_limit_reached(step_execution) {
                        step_execution.status = StepStatus::ProcessorError;
                        return Err(error);
                    }
                }
            }
        }

        Ok(result)
    }

    fn write_chunk(
        &self,
        step_execution: &mut StepExecution,
        processed_items: &[O],
    ) -> Result<(), BatchError> {
        if processed_items.is_empty() {
            debug!("No items to write, skipping write call");
            return Ok(());
        }

        debug!("Writing chunk of {} items", processed_items.len());

        match self.writer.write(processed_items) {
            Ok(()) => {
                step_execution.write_count += processed_items.len();
                Self::manage_error(self.writer.flush());
                Ok(())
            }
            Err(error) => {
                warn!("Error writing items: {}", error);
                step_execution.write_error_count += processed_items.len();

                if self.is_skip_limit_reached(step_execution) {
                    step_execution.status = StepStatus::WriteError;
                    return Err(error);
                }
                Ok(())
            }
        }
    }

    fn is_skip_limit_reached(&self, step_execution: &StepExecution) -> bool {
        step_execution.read_error_count
            + step_execution.write_error_count
            + step_execution.process_error_count
            > self.skip_limit.into()
    }

    /// Logs errors from writer lifecycle calls without failing the step.
    fn manage_error(result: Result<(), BatchError>) {
        if let Err(error) = result {
            warn!("Non-fatal error: {}", error);
        }
    }
}

/// Builder for [`ChunkOrientedStep`].
pub struct StepBuilder<'a, I, O> {
    name: Option<String>,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ItemWriter<O>>,
    chunk_size: u16,
    skip_limit: u16,
}

impl<I, O> Default for StepBuilder<'_, I, O> {
    fn default() -> Self {
        Self {
            name: None,
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 10,
            skip_limit: 0,
        }
    }
}

impl<'a, I, O> StepBuilder<'a, I, O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn reader(mut self, reader: &'a dyn ItemReader<I>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a dyn ItemProcessor<I, O>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a dyn ItemWriter<O>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn chunk(mut self, chunk_size: u16) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn skip_limit(mut self, skip_limit: u16) -> Self {
        self.skip_limit = skip_limit;
        self
    }

    pub fn build(self) -> Result<ChunkOrientedStep<'a, I, O>, BatchError> {
        Ok(ChunkOrientedStep {
            name: self.name.unwrap_or_else(build_name),
            reader: self
                .reader
                .ok_or_else(|| BatchError::Configuration("Step reader is required".to_string()))?,
            processor: self.processor.ok_or_else(|| {
                BatchError::Configuration("Step processor is required".to_string())
            })?,
            writer: self
                .writer
                .ok_or_else(|| BatchError::Configuration("Step writer is required".to_string()))?,
            chunk_size: self.chunk_size,
            skip_limit: self.skip_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::core::item::{ItemReaderResult, ItemWriterResult, PassThroughProcessor};

    struct VecReader {
        items: RefCell<VecDeque<Result<String, String>>>,
    }

    impl VecReader {
        fn new(items: Vec<Result<&str, &str>>) -> Self {
            let items = items
                .into_iter()
                .map(|item| item.map(str::to_string).map_err(str::to_string))
                .collect();
            Self {
                items: RefCell::new(items),
            }
        }
    }

    impl ItemReader<String> for VecReader {
        fn read(&self) -> ItemReaderResult<String> {
            match self.items.borrow_mut().pop_front() {
                Some(Ok(item)) => Ok(Some(item)),
                Some(Err(error)) => Err(BatchError::ItemReader(error)),
                None => Ok(None),
            }
        }
    }

    #[derive(Default)]
    struct VecWriter {
        chunks: RefCell<Vec<Vec<String>>>,
    }

    impl ItemWriter<String> for VecWriter {
        fn write(&self, items: &[String]) -> ItemWriterResult {
            self.chunks.borrow_mut().push(items.to_vec());
            Ok(())
        }
    }

    #[test]
    fn step_should_write_items_by_chunk() {
        let reader = VecReader::new(vec![Ok("a"), Ok("b"), Ok("c")]);
        let writer = VecWriter::default();

        let step: ChunkOrientedStep<String, String> = StepBuilder::new()
            .name("chunked")
            .reader(&reader)
            .processor(&PassThroughProcessor)
            .writer(&writer)
            .chunk(2)
            .build()
            .unwrap();

        let mut execution = StepExecution::new(step.name());
        let result = step.execute(&mut execution);

        assert!(result.is_ok());
        assert_eq!(execution.status, StepStatus::Success);
        assert_eq!(execution.read_count, 3);
        assert_eq!(execution.write_count, 3);
        assert_eq!(writer.chunks.borrow().len(), 2);
    }

    #[test]
    fn step_should_succeed_on_empty_reader() {
        let reader = VecReader::new(vec![]);
        let writer = VecWriter::default();

        let step: ChunkOrientedStep<String, String> = StepBuilder::new()
            .reader(&reader)
            .processor(&PassThroughProcessor)
            .writer(&writer)
            .build()
            .unwrap();

        let mut execution = StepExecution::new(step.name());

        assert!(step.execute(&mut execution).is_ok());
        assert_eq!(execution.read_count, 0);
        assert!(writer.chunks.borrow().is_empty());
    }

    #[test]
    fn step_should_fail_when_skip_limit_is_reached() {
        let reader = VecReader::new(vec![Ok("a"), Err("broken"), Ok("c")]);
        let writer = VecWriter::default();

        let step: ChunkOrientedStep<String, String> = StepBuilder::new()
            .reader(&reader)
            .processor(&PassThroughProcessor)
            .writer(&writer)
            .build()
            .unwrap();

        let mut execution = StepExecution::new(step.name());

        assert!(step.execute(&mut execution).is_err());
        assert_eq!(execution.status, StepStatus::ReadError);
        assert_eq!(execution.read_error_count, 1);
    }

    #[test]
    fn step_should_skip_errors_below_skip_limit() {
        let reader = VecReader::new(vec![Ok("a"), Err("broken"), Ok("c")]);
        let writer = VecWriter::default();

        let step: ChunkOrientedStep<String, String> = StepBuilder::new()
            .reader(&reader)
            .processor(&PassThroughProcessor)
            .writer(&writer)
            .skip_limit(1)
            .build()
            .unwrap();

        let mut execution = StepExecution::new(step.name());

        assert!(step.execute(&mut execution).is_ok());
        assert_eq!(execution.read_count, 2);
        assert_eq!(execution.write_count, 2);
    }

    #[test]
    fn builder_should_require_a_reader() {
        let writer = VecWriter::default();

        let result = StepBuilder::<String, String>::new()
            .processor(&PassThroughProcessor)
            .writer(&writer)
            .build();

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }
}
