/// JSON-lines output.
///
/// [`JsonItemWriter`] serializes every item with `serde_json` and writes it
/// on its own line, which suits records emitted by the XML source since each
/// one can be consumed independently.
///
/// # Examples
///
/// ```
/// use xml_file_batch::core::item::ItemWriter;
/// use xml_file_batch::item::json::JsonItemWriterBuilder;
/// use xml_file_batch::item::xml::XmlRecord;
///
/// let dir = tempfile::TempDir::new().unwrap();
/// let path = dir.path().join("records.jsonl");
///
/// let writer = JsonItemWriterBuilder::new().from_path(&path).unwrap();
/// let record = XmlRecord {
///     offset: 9,
///     filename: "catalog.xml".to_string(),
///     record: "<book/>".to_string(),
/// };
/// writer.write(&[record]).unwrap();
/// ItemWriter::<XmlRecord>::flush(&writer).unwrap();
///
/// let content = std::fs::read_to_string(&path).unwrap();
/// assert_eq!(
///     content,
///     "{\"offset\":9,\"filename\":\"catalog.xml\",\"record\":\"<book/>\"}\n"
/// );
/// ```
pub mod json_writer;

pub use json_writer::{JsonItemWriter, JsonItemWriterBuilder};
