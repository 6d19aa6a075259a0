use std::fmt::Debug;

use log::info;

use crate::core::item::{ItemWriter, ItemWriterResult};

/// Logs every item at info level.
#[derive(Default)]
pub struct LoggerWriter {
    prefix: Option<String>,
}

impl LoggerWriter {
    pub fn with_prefix<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl<T> ItemWriter<T> for LoggerWriter
where
    T: Debug,
{
    fn write(&self, items: &[T]) -> ItemWriterResult {
        let prefix = self.prefix.as_deref().unwrap_or("Record");
        items.iter().for_each(|item| info!("{}:{:?}", prefix, item));
        Ok(())
    }
}
