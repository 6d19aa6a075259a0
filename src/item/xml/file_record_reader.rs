use std::{
    borrow::Cow,
    cell::RefCell,
    collections::VecDeque,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use log::{debug, error, info};
use quick_xml::{
    events::{BytesStart, Event},
    reader::Reader as XmlReader,
};

use crate::{
    BatchError,
    core::item::{ItemReader, ItemReaderResult},
    tracking::StagingRecorder,
};

use super::{post_process::PostProcessAction, record::XmlRecord};

/// Splits `/catalog/book` into its element names.
fn parse_node_path(node_path: &str) -> Vec<Vec<u8>> {
    node_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.as_bytes().to_vec())
        .collect()
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Appends `<name attr="value">` (or `<name/>` when `empty`) to `xml`.
fn push_start_tag(xml: &mut String, start: &BytesStart, empty: bool) {
    xml.push('<');
    xml.push_str(&lossy(start.name().as_ref()));
    for attr in start.attributes().flatten() {
        xml.push(' ');
        xml.push_str(&lossy(attr.key.as_ref()));
        xml.push_str("=\"");
        xml.push_str(&lossy(attr.value.as_ref()).replace('"', "&quot;"));
        xml.push('"');
    }
    xml.push_str(if empty { "/>" } else { ">" });
}

/// File currently being read.
struct OpenFile {
    path: PathBuf,
    filename: String,
    reader: XmlReader<BufReader<File>>,
    /// Names of the elements enclosing the current position
    stack: Vec<Vec<u8>>,
}

/// Reads the nodes found at a node path in a list of XML files.
///
/// Files are read one after the other. Once a file has been read to the
/// end, the post-process action is applied to it and, when tracking is on,
/// its name is staged as processed. A file that fails to parse is abandoned:
/// it is neither post-processed nor staged, and reading resumes with the next
/// file.
///
/// # Examples
///
/// ```
/// use std::fs;
/// use xml_file_batch::core::item::ItemReader;
/// use xml_file_batch::item::xml::FileRecordReaderBuilder;
///
/// let dir = tempfile::TempDir::new().unwrap();
/// let file = dir.path().join("catalog.xml");
/// fs::write(&file, "<catalog><book><price>10</price></book></catalog>").unwrap();
///
/// let reader = FileRecordReaderBuilder::new()
///     .node_path("/catalog/book/price")
///     .files(vec![file])
///     .build()
///     .unwrap();
///
/// let record = reader.read().unwrap().unwrap();
/// assert_eq!(record.filename, "catalog.xml");
/// assert_eq!(record.record, "<price>10</price>");
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct FileRecordReader {
    node_path: Vec<Vec<u8>>,
    capacity: usize,
    action: PostProcessAction,
    recorder: Option<StagingRecorder>,
    pending: RefCell<VecDeque<PathBuf>>,
    current: RefCell<Option<OpenFile>>,
    buffer: RefCell<Vec<u8>>,
}

impl FileRecordReader {
    /// Number of files not opened yet.
    pub fn remaining_files(&self) -> usize {
        self.pending.borrow().len()
    }

    fn open(&self, path: PathBuf) -> Result<OpenFile, BatchError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                BatchError::ItemReader(format!("{} has no file name", path.display()))
            })?;

        let file = File::open(&path).map_err(|e| {
            error!("Failed to open XML file {}: {}", path.display(), e);
            BatchError::ItemReader(format!(
                "Failed to open XML file {}: {}",
                path.display(),
                e
            ))
        })?;

        info!("Reading {}", path.display());

        Ok(OpenFile {
            path,
            filename,
            reader: XmlReader::from_reader(BufReader::with_capacity(self.capacity, file)),
            stack: Vec::new(),
        })
    }

    /// Applies the post-process action and stages the file as processed.
    fn finish(&self, file: OpenFile) -> Result<(), BatchError> {
        let OpenFile {
            path,
            filename,
            reader,
            ..
        } = file;
        // release the file handle before moving or deleting the file
        drop(reader);

        self.action.apply(&path)?;

        if let Some(recorder) = &self.recorder {
            if let Err(e) = recorder.record_processed(&filename) {
                error!("{}", e);
            }
        }

        debug!("Finished reading {}", path.display());
        Ok(())
    }

    /// Reads the next node matching the node path, or `None` at end of file.
    fn next_record(&self, file: &mut OpenFile) -> Result<Option<XmlRecord>, BatchError> {
        let mut buffer = self.buffer.borrow_mut();

        loop {
            buffer.clear();
            let event = file.reader.read_event_into(&mut buffer).map_err(|e| {
                BatchError::ItemReader(format!(
                    "XML parsing error in {} at {}: {}",
                    file.filename,
                    file.reader.error_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(ref start) => {
                    file.stack.push(start.name().as_ref().to_vec());
                    if file.stack == self.node_path {
                        let end = file.reader.buffer_position() as u64;
                        let offset = end.saturating_sub(start.len() as u64 + 2);

                        let mut xml = String::new();
                        push_start_tag(&mut xml, start, false);
                        Self::read_node_content(file, &mut xml)?;
                        file.stack.pop();

                        return Ok(Some(XmlRecord {
                            offset: i64::try_from(offset).unwrap_or(i64::MAX),
                            filename: file.filename.clone(),
                            record: xml,
                        }));
                    }
                }
                Event::Empty(ref start) => {
                    file.stack.push(start.name().as_ref().to_vec());
                    let matched = file.stack == self.node_path;
                    file.stack.pop();

                    if matched {
                        let end = file.reader.buffer_position() as u64;
                        let offset = end.saturating_sub(start.len() as u64 + 3);

                        let mut xml = String::new();
                        push_start_tag(&mut xml, start, true);

                        return Ok(Some(XmlRecord {
                            offset: i64::try_from(offset).unwrap_or(i64::MAX),
                            filename: file.filename.clone(),
                            record: xml,
                        }));
                    }
                }
                Event::End(_) => {
                    file.stack.pop();
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Appends everything up to and including the end tag of the node whose
    /// start tag was just read.
    fn read_node_content(file: &mut OpenFile, xml: &mut String) -> Result<(), BatchError> {
        let mut buffer = Vec::new();
        let mut depth = 1;

        while depth > 0 {
            buffer.clear();
            match file.reader.read_event_into(&mut buffer) {
                Ok(Event::Start(ref start)) => {
                    depth += 1;
                    push_start_tag(xml, start, false);
                }
                Ok(Event::Empty(ref start)) => push_start_tag(xml, start, true),
                Ok(Event::End(ref end)) => {
                    depth -= 1;
                    xml.push_str("</");
                    xml.push_str(&lossy(end.name().as_ref()));
                    xml.push('>');
                }
                Ok(Event::Text(ref text)) => xml.push_str(&lossy(text)),
                Ok(Event::GeneralRef(ref reference)) => {
                    xml.push('&');
                    xml.push_str(&lossy(reference));
                    xml.push(';');
                }
                Ok(Event::CData(ref cdata)) => {
                    xml.push_str("<![CDATA[");
                    xml.push_str(&lossy(cdata));
                    xml.push_str("]]>");
                }
                Ok(Event::Comment(ref comment)) => {
                    xml.push_str("<!--");
                    xml.push_str(&lossy(comment));
                    xml.push_str("-->");
                }
                Ok(Event::PI(ref instruction)) => {
                    xml.push_str("<?");
                    xml.push_str(&lossy(instruction));
                    xml.push_str("?>");
                }
                Ok(Event::DocType(ref doctype)) => {
                    xml.push_str("<!DOCTYPE ");
                    xml.push_str(&lossy(doctype));
                    xml.push('>');
                }
                Ok(Event::Eof) => {
                    return Err(BatchError::ItemReader(format!(
                        "Unexpected end of file in {}",
                        file.filename
                    )));
                }
                Err(e) => {
                    return Err(BatchError::ItemReader(format!(
                        "XML parsing error in {} at {}: {}",
                        file.filename,
                        file.reader.error_position(),
                        e
                    )));
                }
                // declarations only appear before the root element
                Ok(_) => {}
            }
        }
        Ok(())
    }
}

impl ItemReader<XmlRecord> for FileRecordReader {
    fn read(&self) -> ItemReaderResult<XmlRecord> {
        let mut current = self.current.borrow_mut();

        loop {
            if current.is_none() {
                match self.pending.borrow_mut().pop_front() {
                    Some(path) => *current = Some(self.open(path)?),
                    None => return Ok(None),
                }
            }

            let Some(file) = current.as_mut() else {
                return Ok(None);
            };

            match self.next_record(file) {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => {
                    if let Some(done) = current.take() {
                        self.finish(done)?;
                    }
                }
                Err(e) => {
                    if let Some(abandoned) = current.take() {
                        error!("Abandoning {}: {}", abandoned.path.display(), e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Builder for [`FileRecordReader`].
pub struct FileRecordReaderBuilder {
    node_path: Option<String>,
    files: Vec<PathBuf>,
    action: PostProcessAction,
    recorder: Option<StagingRecorder>,
    capacity: usize,
}

impl Default for FileRecordReaderBuilder {
    fn default() -> Self {
        Self {
            node_path: None,
            files: Vec::new(),
            action: PostProcessAction::None,
            recorder: None,
            capacity: 8 * 1024,
        }
    }
}

impl FileRecordReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the nodes to emit, from the document root, e.g. `/catalog/book`.
    pub fn node_path<S: AsRef<str>>(mut self, node_path: S) -> Self {
        self.node_path = Some(node_path.as_ref().to_string());
        self
    }

    /// Files to read, in reading order.
    pub fn files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.files = files.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        self
    }

    pub fn action(mut self, action: PostProcessAction) -> Self {
        self.action = action;
        self
    }

    /// Stages every fully read file through `recorder`.
    pub fn recorder(mut self, recorder: Option<StagingRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Sets the read buffer capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> Result<FileRecordReader, BatchError> {
        let node_path = self
            .node_path
            .map(|path| parse_node_path(&path))
            .filter(|segments| !segments.is_empty())
            .ok_or_else(|| BatchError::Configuration("Node path is required".to_string()))?;

        Ok(FileRecordReader {
            node_path,
            capacity: self.capacity,
            action: self.action,
            recorder: self.recorder,
            pending: RefCell::new(self.files.into()),
            current: RefCell::new(None),
            buffer: RefCell::new(Vec::with_capacity(1024)),
        })
    }
}
