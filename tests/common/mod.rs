#![allow(dead_code)]

pub mod mocks;

use std::{fs, path::PathBuf, sync::Arc};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tempfile::TempDir;
use xml_file_batch::{
    BatchError,
    config::XmlReaderConfig,
    core::item::{ItemWriter, ItemWriterResult},
    item::xml::XmlRecord,
    tracking::{KeyValueStore, TableProvider},
};

pub const TABLE: &str = "processed_files";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + TimeDelta::days(n)
}

/// Scratch directory with an `in` folder of XML files and a `tmp` folder.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn with_files(files: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("in")).unwrap();
        fs::create_dir(dir.path().join("tmp")).unwrap();
        let fixture = Fixture { dir };
        for (index, name) in files.iter().enumerate() {
            fixture.add_file(
                name,
                &format!(
                    "<catalog><book id=\"{0}\"><title>T{0}</title></book><book id=\"{0}b\"/></catalog>",
                    index
                ),
            );
        }
        fixture
    }

    pub fn add_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.input_dir().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn input_dir(&self) -> PathBuf {
        self.dir.path().join("in")
    }

    pub fn temporary_folder(&self) -> PathBuf {
        self.dir.path().join("tmp")
    }

    /// Staging areas left in the temporary folder.
    pub fn staging_areas(&self) -> usize {
        fs::read_dir(self.temporary_folder()).unwrap().count()
    }

    pub fn config(&self) -> XmlReaderConfig {
        XmlReaderConfig {
            path: format!("{}/*.xml", self.input_dir().display()),
            node_path: "/catalog/book".to_string(),
            table_name: Some(TABLE.to_string()),
            temporary_folder: self.temporary_folder().display().to_string(),
            ..Default::default()
        }
    }
}

/// Provider always handing out the same table.
pub struct SingleTable(pub Arc<dyn KeyValueStore>);

impl TableProvider for SingleTable {
    fn open_or_create(&self, _table_name: &str) -> Result<Arc<dyn KeyValueStore>, BatchError> {
        Ok(Arc::clone(&self.0))
    }
}

/// Writer rejecting every chunk.
pub struct FailingWriter;

impl ItemWriter<XmlRecord> for FailingWriter {
    fn write(&self, _items: &[XmlRecord]) -> ItemWriterResult {
        Err(BatchError::ItemWriter("sink unavailable".to_string()))
    }
}
