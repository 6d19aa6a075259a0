use crate::error::BatchError;

/// Represents the result of reading an item from the reader.
///
/// - `Ok(Some(item))` when an item was read
/// - `Ok(None)` when there are no more items to read
/// - `Err(BatchError)` when reading failed
pub type ItemReaderResult<I> = Result<Option<I>, BatchError>;

/// Represents the result of processing an item.
pub type ItemProcessorResult<O> = Result<O, BatchError>;

/// Represents the result of writing items.
pub type ItemWriterResult = Result<(), BatchError>;

/// A trait for reading items one at a time.
///
/// Readers use interior mutability so that a step can hold a shared
/// reference to them.
pub trait ItemReader<I> {
    fn read(&self) -> ItemReaderResult<I>;
}

/// A trait for transforming an item read into an item to write.
pub trait ItemProcessor<I, O> {
    fn process(&self, item: &I) -> ItemProcessorResult<O>;
}

/// A trait for writing a chunk of items.
pub trait ItemWriter<O> {
    fn write(&self, items: &[O]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}

/// Processor returning a clone of every item it receives.
#[derive(Default)]
pub struct PassThroughProcessor;

impl<I: Clone> ItemProcessor<I, I> for PassThroughProcessor {
    fn process(&self, item: &I) -> ItemProcessorResult<I> {
        Ok(item.clone())
    }
}
