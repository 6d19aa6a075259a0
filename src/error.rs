use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemWriter error: {0}")]
    ItemWriter(String),

    #[error("ItemProcessor error: {0}")]
    ItemProcessor(String),

    #[error("ItemReader error: {0}")]
    ItemReader(String),

    #[error("Step error: {0}")]
    Step(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {0}")]
    Validation(ValidationErrors),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key-value store error: {0}")]
    Store(String),

    /// Reading the processed-file table failed while computing the exclusion set.
    #[error("Unable to scan processed file table: {0}")]
    TrackerScan(String),

    /// A worker could not stage the name of a file it processed.
    #[error("Unable to stage processed file: {0}")]
    StagingWrite(String),

    /// The staging area could not be enumerated at finalization.
    #[error("Unable to drain staging area: {0}")]
    FinalizeDrain(String),

    /// Processed files could not be written back to the table.
    #[error("Unable to commit processed files: {0}")]
    TrackerCommit(String),
}

/// A single configuration failure tied to one or more config properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFailure {
    /// Human-readable description of the failure
    pub message: String,
    /// Optional hint on how to fix the failure
    pub corrective_action: Option<String>,
    /// Names of the config properties the failure is tied to
    pub properties: Vec<&'static str>,
}

impl ConfigFailure {
    /// Ties the failure to one more config property.
    pub fn with_config_property(&mut self, property: &'static str) -> &mut Self {
        self.properties.push(property);
        self
    }

    pub fn is_for(&self, property: &str) -> bool {
        self.properties.contains(&property)
    }
}

impl fmt::Display for ConfigFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(action) = &self.corrective_action {
            write!(f, " {}", action)?;
        }
        if !self.properties.is_empty() {
            write!(f, " [{}]", self.properties.join(", "))?;
        }
        Ok(())
    }
}

/// Every failure found while validating a configuration.
///
/// Failures are aggregated so that all problems are reported at once instead
/// of stopping at the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    failures: Vec<ConfigFailure>,
}

impl ValidationErrors {
    pub fn new(failures: Vec<ConfigFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[ConfigFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns the failures tied to the given config property.
    pub fn for_property<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a ConfigFailure> {
        self.failures.iter().filter(move |failure| failure.is_for(property))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.failures.iter().map(|f| f.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_should_join_all_failures() {
        let errors = ValidationErrors::new(vec![
            ConfigFailure {
                message: "Path cannot be empty.".to_string(),
                corrective_action: None,
                properties: vec!["path"],
            },
            ConfigFailure {
                message: "Node path cannot be empty.".to_string(),
                corrective_action: Some("Use '/catalog/book'.".to_string()),
                properties: vec!["nodePath"],
            },
        ]);

        assert_eq!(errors.len(), 2);
        assert_eq!(
            BatchError::Validation(errors.clone()).to_string(),
            "Invalid configuration: Path cannot be empty. [path]; \
             Node path cannot be empty. Use '/catalog/book'. [nodePath]"
        );
        assert_eq!(errors.for_property("nodePath").count(), 1);
        assert_eq!(errors.for_property("pattern").count(), 0);
    }
}
