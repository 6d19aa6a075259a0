use std::{
    cell::RefCell,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::{
    BatchError,
    core::item::{ItemWriter, ItemWriterResult},
};

/// Writes items as JSON lines, one serialized item per line.
pub struct JsonItemWriter {
    stream: RefCell<BufWriter<File>>,
    use_pretty_formatter: bool,
}

impl<R: Serialize> ItemWriter<R> for JsonItemWriter {
    fn write(&self, items: &[R]) -> ItemWriterResult {
        let mut stream = self.stream.borrow_mut();

        for item in items {
            let json = if self.use_pretty_formatter {
                serde_json::to_string_pretty(item)
            } else {
                serde_json::to_string(item)
            }
            .map_err(|e| BatchError::ItemWriter(e.to_string()))?;

            stream
                .write_all(json.as_bytes())
                .and_then(|_| stream.write_all(b"\n"))
                .map_err(|e| BatchError::ItemWriter(e.to_string()))?;
        }
        Ok(())
    }

    fn flush(&self) -> ItemWriterResult {
        self.stream
            .borrow_mut()
            .flush()
            .map_err(|e| BatchError::ItemWriter(e.to_string()))
    }

    fn close(&self) -> ItemWriterResult {
        ItemWriter::<R>::flush(self)
    }
}

#[derive(Default)]
pub struct JsonItemWriterBuilder {
    pretty_formatter: bool,
    append: bool,
}

impl JsonItemWriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty_formatter(mut self, yes: bool) -> Self {
        self.pretty_formatter = yes;
        self
    }

    /// Appends to an existing file instead of truncating it.
    pub fn append(mut self, yes: bool) -> Self {
        self.append = yes;
        self
    }

    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<JsonItemWriter, BatchError> {
        let mut options = File::options();
        options.create(true);
        if self.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }

        let file = options.open(path.as_ref()).map_err(|e| {
            BatchError::ItemWriter(format!(
                "Unable to open {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Ok(JsonItemWriter {
            stream: RefCell::new(BufWriter::new(file)),
            use_pretty_formatter: self.pretty_formatter,
        })
    }
}
