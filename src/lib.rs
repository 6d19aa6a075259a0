#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # XML file batch source

 Reads XML files as a batch source and makes sure every file is ingested once.
 Each run emits one record per node found at a configured node path, then
 remembers the files it fully consumed in a processed-file table so the next
 run skips them.

 ## Core Concepts

- **ProcessedFileTracker:** durable table mapping a file name to the time it was last processed. Entries older than the retention period are purged when a run is prepared.
- **PendingCommitStaging:** run-scoped directory where workers drop one small artifact per file they fully consumed. Nothing reaches the table before the run succeeds.
- **RunCoordinator:** prepares a run (validation, exclusion set, staging area), hands readers to workers, then commits or discards what was staged.
- **FileRecordReader:** an `ItemReader` emitting `{offset, filename, record}` for every matching XML node, applying the post-process action (`NONE`, `DELETE`, `ARCHIVE`, `MOVE`) to each file once read.
- **Job / Step / ItemReader / ItemProcessor / ItemWriter:** the chunk-oriented batch model the records flow through.

 ## Features

| **Feature** | **Description**                                       |
|-------------|-------------------------------------------------------|
| zip         | Enables the `ARCHIVE` post-process action             |
| json        | Enables the JSON-lines `ItemWriter`                   |
| logger      | Enables a logger `ItemWriter`, useful for debugging   |
| full        | Enables all available features                        |

 ## Getting Started

```rust
# use std::{fs, sync::Arc};
# use chrono::Utc;
# use xml_file_batch::{
#     config::XmlReaderConfig,
#     coordinator::{RunCoordinator, RunState},
#     item::json::JsonItemWriterBuilder,
#     tracking::{JsonFileTables, LocalFileSystem},
# };
# fn main() -> Result<(), xml_file_batch::BatchError> {
# let dir = tempfile::TempDir::new()?;
# fs::create_dir(dir.path().join("in"))?;
# fs::write(dir.path().join("in/catalog.xml"), "<catalog><book id=\"1\"/></catalog>")?;
let config = XmlReaderConfig::from_json_str(&format!(
    r#"{{
        "path": "{root}/in",
        "nodePath": "/catalog/book",
        "tableName": "processed_catalogs",
        "tableExpiryPeriod": 30,
        "temporaryFolder": "{root}/tmp"
    }}"#,
    root = dir.path().display()
))?;

let coordinator = RunCoordinator::new(
    Arc::new(JsonFileTables::new(dir.path().join("tables"))),
    Arc::new(LocalFileSystem),
);
let writer = JsonItemWriterBuilder::new().from_path(dir.path().join("books.jsonl"))?;

let outcome = coordinator.run(&config, Utc::now(), &writer, 100)?;

assert_eq!(outcome.state, RunState::Committed);
assert!(outcome.committed.contains("catalog.xml"));
# Ok(())
# }
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Source of the current time
pub mod clock;

/// Configuration of the XML source and its validation
pub mod config;

/// Run lifecycle and exactly-once bookkeeping
pub mod coordinator;

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of items readers / writers
pub mod item;

/// Processed-file table and staging of processed files
pub mod tracking;
