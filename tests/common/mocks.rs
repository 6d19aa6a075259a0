//! Mocks of the storage traits, used to simulate failing tables and filesystems.
use mockall::mock;

use std::path::{Path, PathBuf};

use xml_file_batch::{
    BatchError,
    tracking::{FileSystem, KeyValueStore, store::KeyValue},
};

mock! {
    pub Store {}
    impl KeyValueStore for Store {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BatchError>;
        fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BatchError>;
        fn delete(&self, key: &[u8]) -> Result<(), BatchError>;
        fn put_all(&self, entries: &[KeyValue]) -> Result<(), BatchError>;
        fn delete_all(&self, keys: &[Vec<u8>]) -> Result<(), BatchError>;
        fn scan(&self) -> Result<Vec<KeyValue>, BatchError>;
    }
}

mock! {
    pub Fs {}
    impl FileSystem for Fs {
        fn create_dir_all(&self, path: &Path) -> Result<(), BatchError>;
        fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, BatchError>;
        fn read(&self, path: &Path) -> Result<Vec<u8>, BatchError>;
        fn write(&self, path: &Path, contents: &[u8]) -> Result<(), BatchError>;
        fn remove_dir_all(&self, path: &Path) -> Result<(), BatchError>;
        fn exists(&self, path: &Path) -> bool;
    }
}
