use serde::{Deserialize, Serialize};

/// Type of a field of the output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Long,
    String,
}

/// A named, typed field of the output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
}

/// Schema of the records emitted by the XML source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Output schema of [`XmlRecord`].
pub static XML_RECORD_SCHEMA: RecordSchema = RecordSchema {
    name: "xmlSchema",
    fields: &[
        Field {
            name: "offset",
            field_type: FieldType::Long,
        },
        Field {
            name: "filename",
            field_type: FieldType::String,
        },
        Field {
            name: "record",
            field_type: FieldType::String,
        },
    ],
};

/// One XML node read from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlRecord {
    /// Byte offset of the node's start tag in its file
    pub offset: i64,
    /// Name of the file the node was read from
    pub filename: String,
    /// XML text of the node
    pub record: String,
}
