#[cfg(feature = "logger")]
/// This module provides a logger item writer, useful to inspect emitted records.
pub mod logger;

#[cfg(feature = "json")]
/// This module provides a JSON-lines item writer.
pub mod json;

/// This module provides the XML file source and its post-process actions.
pub mod xml;
