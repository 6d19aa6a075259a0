/// XML file source.
///
/// Reads every node found at a node path (e.g. `/catalog/book`) in a set of
/// XML files and emits it as an [`XmlRecord`]: the byte offset of its start
/// tag, the name of its file and its XML text. Parsing relies on the
/// `quick-xml` pull parser, so files are never loaded whole in memory.
///
/// # Examples
///
/// ```
/// use std::fs;
/// use xml_file_batch::core::item::ItemReader;
/// use xml_file_batch::item::xml::{FileRecordReaderBuilder, PostProcessAction};
/// use xml_file_batch::tracking::ExclusionSet;
/// use xml_file_batch::item::xml::discovery::resolve_input_files;
///
/// let dir = tempfile::TempDir::new().unwrap();
/// fs::write(dir.path().join("a.xml"), "<orders><order id=\"1\"/></orders>").unwrap();
/// fs::write(dir.path().join("b.xml"), "<orders><order id=\"2\"/></orders>").unwrap();
///
/// let excluded: ExclusionSet = ["a.xml"].into_iter().collect();
/// let path = format!("{}/*.xml", dir.path().display());
/// let files = resolve_input_files(&path, None, &excluded).unwrap();
///
/// let reader = FileRecordReaderBuilder::new()
///     .node_path("/orders/order")
///     .files(files)
///     .action(PostProcessAction::Delete)
///     .build()
///     .unwrap();
///
/// let record = reader.read().unwrap().unwrap();
/// assert_eq!(record.filename, "b.xml");
/// assert_eq!(record.record, "<order id=\"2\"/>");
/// assert!(reader.read().unwrap().is_none());
/// assert!(!dir.path().join("b.xml").exists());
/// ```
pub mod discovery;

pub mod file_record_reader;

/// What to do with a file once it has been fully read.
pub mod post_process;

pub mod record;

pub use file_record_reader::{FileRecordReader, FileRecordReaderBuilder};
pub use post_process::PostProcessAction;
pub use record::{XML_RECORD_SCHEMA, XmlRecord};
