//! Configuration of the XML file source.
//!
//! [`XmlReaderConfig`] mirrors the JSON properties of the source. It is
//! validated twice: once when the pipeline is deployed ([`XmlReaderConfig::validate`]),
//! where values still holding `${...}` macros are skipped, and once when a run
//! is prepared ([`XmlReaderConfig::settings`]), where every macro must have
//! been resolved. Every failure found is reported at once.

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::LazyLock,
};

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    BatchError,
    error::{ConfigFailure, ValidationErrors},
    item::xml::{PostProcessAction, discovery::has_glob},
    tracking::ExpiryPolicy,
};

pub const PATH: &str = "path";
pub const PATTERN: &str = "pattern";
pub const NODE_PATH: &str = "nodePath";
pub const TABLE_NAME: &str = "tableName";
pub const TABLE_EXPIRY_PERIOD: &str = "tableExpiryPeriod";
pub const TARGET_FOLDER: &str = "targetFolder";
pub const TEMPORARY_FOLDER: &str = "temporaryFolder";
pub const ACTION_AFTER_PROCESS: &str = "actionAfterProcess";
pub const REPROCESSING_REQUIRED: &str = "reprocessingRequired";

/// Matches `${name}` macros.
static MACRO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid macro pattern"));

/// Returns true when `value` still holds a `${...}` macro.
pub fn contains_macro(value: &str) -> bool {
    MACRO_PATTERN.is_match(value)
}

/// Accumulates configuration failures.
#[derive(Debug, Default)]
pub struct FailureCollector {
    failures: Vec<ConfigFailure>,
}

impl FailureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure; tie it to properties with
    /// [`ConfigFailure::with_config_property`].
    pub fn add_failure<S: Into<String>>(
        &mut self,
        message: S,
        corrective_action: Option<&str>,
    ) -> &mut ConfigFailure {
        self.failures.push(ConfigFailure {
            message: message.into(),
            corrective_action: corrective_action.map(str::to_string),
            properties: Vec::new(),
        });
        let last = self.failures.len() - 1;
        &mut self.failures[last]
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fails with every collected failure, if any.
    pub fn into_result(self) -> Result<(), BatchError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(BatchError::Validation(ValidationErrors::new(self.failures)))
        }
    }
}

/// Action selected by `actionAfterProcess`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionAfterProcess {
    #[default]
    None,
    Delete,
    Archive,
    Move,
}

impl ActionAfterProcess {
    pub fn needs_target_folder(&self) -> bool {
        matches!(self, ActionAfterProcess::Archive | ActionAfterProcess::Move)
    }
}

impl FromStr for ActionAfterProcess {
    type Err = BatchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "" | "NONE" => Ok(ActionAfterProcess::None),
            "DELETE" => Ok(ActionAfterProcess::Delete),
            "ARCHIVE" => Ok(ActionAfterProcess::Archive),
            "MOVE" => Ok(ActionAfterProcess::Move),
            _ => Err(BatchError::Configuration(format!(
                "Unknown action after process: '{}'",
                value
            ))),
        }
    }
}

impl fmt::Display for ActionAfterProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionAfterProcess::None => "NONE",
            ActionAfterProcess::Delete => "DELETE",
            ActionAfterProcess::Archive => "ARCHIVE",
            ActionAfterProcess::Move => "MOVE",
        };
        write!(f, "{}", name)
    }
}

/// Value of `tableExpiryPeriod`: a number of days, or a string that may
/// still hold a macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpiryPeriod {
    Days(i64),
    Text(String),
}

impl ExpiryPeriod {
    /// Number of days, `Ok(None)` for an empty string.
    ///
    /// # Errors
    ///
    /// Returns the raw text when it is not an integer.
    pub fn days(&self) -> Result<Option<i64>, &str> {
        match self {
            ExpiryPeriod::Days(days) => Ok(Some(*days)),
            ExpiryPeriod::Text(text) if text.trim().is_empty() => Ok(None),
            ExpiryPeriod::Text(text) => text.trim().parse().map(Some).map_err(|_| text.as_str()),
        }
    }
}

impl From<i64> for ExpiryPeriod {
    fn from(days: i64) -> Self {
        ExpiryPeriod::Days(days)
    }
}

/// Properties of the XML file source.
///
/// # Examples
///
/// ```
/// use xml_file_batch::config::XmlReaderConfig;
///
/// let config = XmlReaderConfig::from_json_str(r#"{
///     "path": "/data/in/*.xml",
///     "pattern": "^catalog",
///     "nodePath": "/catalog/book",
///     "actionAfterProcess": "archive",
///     "targetFolder": "/data/archive",
///     "tableName": "processed_catalogs",
///     "tableExpiryPeriod": 30,
///     "temporaryFolder": "/tmp"
/// }"#).unwrap();
///
/// assert!(config.validate().is_ok());
/// assert!(!config.is_reprocessing_required());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XmlReaderConfig {
    /// File, directory or glob of the files to read
    pub path: String,
    /// Regular expression file names must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Path of the nodes to emit, e.g. `/catalog/book`
    pub node_path: String,
    /// `NONE`, `DELETE`, `ARCHIVE` or `MOVE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_after_process: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_folder: Option<String>,
    /// `YES` (or `TRUE`) to read files again even when already processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprocessing_required: Option<String>,
    /// Processed-file table; tracking is off without it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Days a processed file stays excluded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_expiry_period: Option<ExpiryPeriod>,
    /// Folder holding the staging areas of runs
    pub temporary_folder: String,
}

/// Tracking part of [`ReaderSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSettings {
    pub table_name: String,
    pub expiry: ExpiryPolicy,
    pub temporary_folder: PathBuf,
}

/// Validated, macro-free view of a [`XmlReaderConfig`] used by a run.
#[derive(Debug, Clone)]
pub struct ReaderSettings {
    pub path: String,
    pub pattern: Option<Regex>,
    pub node_path: String,
    pub action: PostProcessAction,
    pub reprocessing_required: bool,
    /// `None` when tracking is disabled
    pub tracking: Option<TrackingSettings>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl XmlReaderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, BatchError> {
        serde_json::from_str(json)
            .map_err(|e| BatchError::Configuration(format!("Invalid XML reader config: {}", e)))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BatchError> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| {
            BatchError::Configuration(format!(
                "Unable to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&json)
    }

    fn property(&self, property: &str) -> Option<&str> {
        match property {
            PATH => Some(&self.path),
            PATTERN => self.pattern.as_deref(),
            NODE_PATH => Some(&self.node_path),
            ACTION_AFTER_PROCESS => self.action_after_process.as_deref(),
            TARGET_FOLDER => self.target_folder.as_deref(),
            REPROCESSING_REQUIRED => self.reprocessing_required.as_deref(),
            TABLE_NAME => self.table_name.as_deref(),
            TABLE_EXPIRY_PERIOD => match &self.table_expiry_period {
                Some(ExpiryPeriod::Text(text)) => Some(text),
                _ => None,
            },
            TEMPORARY_FOLDER => Some(&self.temporary_folder),
            _ => None,
        }
    }

    /// Returns true when `property` still holds a macro.
    pub fn contains_macro(&self, property: &str) -> bool {
        self.property(property).is_some_and(contains_macro)
    }

    pub fn is_reprocessing_required(&self) -> bool {
        self.reprocessing_required.as_deref().is_some_and(|value| {
            value.eq_ignore_ascii_case("YES") || value.eq_ignore_ascii_case("TRUE")
        })
    }

    /// True when a usable table name is set.
    pub fn is_tracking_enabled(&self) -> bool {
        non_empty(&self.table_name).is_some_and(|name| !contains_macro(name))
    }

    pub fn action(&self) -> Result<ActionAfterProcess, BatchError> {
        self.action_after_process
            .as_deref()
            .map_or(Ok(ActionAfterProcess::None), ActionAfterProcess::from_str)
    }

    /// Returns a copy where every `${key}` with a value in `values` is
    /// substituted. Unknown macros are left as they are.
    pub fn resolve_macros(&self, values: &HashMap<String, String>) -> Self {
        let resolve = |value: &str| -> String {
            MACRO_PATTERN
                .replace_all(value, |caps: &regex::Captures| {
                    let name = caps.get(1).map_or("", |m| m.as_str());
                    match values.get(name) {
                        Some(resolved) => resolved.clone(),
                        None => caps.get(0).map_or("", |m| m.as_str()).to_string(),
                    }
                })
                .into_owned()
        };
        let resolve_opt = |value: &Option<String>| value.as_deref().map(resolve);

        Self {
            path: resolve(&self.path),
            pattern: resolve_opt(&self.pattern),
            node_path: resolve(&self.node_path),
            action_after_process: resolve_opt(&self.action_after_process),
            target_folder: resolve_opt(&self.target_folder),
            reprocessing_required: resolve_opt(&self.reprocessing_required),
            table_name: resolve_opt(&self.table_name),
            table_expiry_period: self.table_expiry_period.as_ref().map(|period| match period {
                ExpiryPeriod::Days(days) => ExpiryPeriod::Days(*days),
                ExpiryPeriod::Text(text) => ExpiryPeriod::Text(resolve(text)),
            }),
            temporary_folder: resolve(&self.temporary_folder),
        }
    }

    /// Deploy-time validation; properties holding macros are not checked.
    pub fn validate(&self) -> Result<(), BatchError> {
        let mut collector = FailureCollector::new();
        self.collect_failures(&mut collector);
        collector.into_result()
    }

    fn collect_failures(&self, collector: &mut FailureCollector) {
        if !self.contains_macro(PATH) && self.path.is_empty() {
            collector
                .add_failure("Path cannot be empty.", None)
                .with_config_property(PATH);
        }
        if !self.contains_macro(NODE_PATH) && self.node_path.is_empty() {
            collector
                .add_failure("Node path cannot be empty.", None)
                .with_config_property(NODE_PATH);
        }

        if let Some(period) = self.table_expiry_period.as_ref() {
            let invalid = match period.days() {
                _ if self.contains_macro(TABLE_EXPIRY_PERIOD) => None,
                Ok(Some(days)) if days < 0 => Some(days.to_string()),
                Ok(_) => None,
                Err(text) => Some(text.to_string()),
            };
            if let Some(value) = invalid {
                collector
                    .add_failure(
                        format!("Invalid value: {}.", value),
                        Some("Value for 'Table Expiry Period' should either be empty or greater than 0"),
                    )
                    .with_config_property(TABLE_EXPIRY_PERIOD);
            }
        }

        if !self.contains_macro(TEMPORARY_FOLDER) && self.temporary_folder.is_empty() {
            collector
                .add_failure("Temporary folder cannot be empty.", None)
                .with_config_property(TEMPORARY_FOLDER);
        }

        if !self.contains_macro(ACTION_AFTER_PROCESS) {
            match self.action() {
                Ok(action) => {
                    if action != ActionAfterProcess::None && self.is_reprocessing_required() {
                        collector
                            .add_failure(
                                "Only one of 'After Processing Action' or 'Reprocessing Required' \
                                 may be selected at a time.",
                                None,
                            )
                            .with_config_property(ACTION_AFTER_PROCESS)
                            .with_config_property(REPROCESSING_REQUIRED);
                    }
                    if action.needs_target_folder() && non_empty(&self.target_folder).is_none() {
                        collector
                            .add_failure(
                                format!(
                                    "Target folder cannot be empty for Action = '{}'.",
                                    self.action_after_process.as_deref().unwrap_or_default()
                                ),
                                None,
                            )
                            .with_config_property(TARGET_FOLDER);
                    }
                }
                Err(_) => {
                    collector
                        .add_failure(
                            format!(
                                "Invalid action after process: '{}'.",
                                self.action_after_process.as_deref().unwrap_or_default()
                            ),
                            Some("Use one of NONE, DELETE, ARCHIVE or MOVE."),
                        )
                        .with_config_property(ACTION_AFTER_PROCESS);
                }
            }
        }

        if let Some(pattern) = non_empty(&self.pattern).filter(|p| !contains_macro(p)) {
            if Regex::new(pattern).is_err() {
                collector
                    .add_failure(format!("Invalid regular expression: '{}'.", pattern), None)
                    .with_config_property(PATTERN);
            }
            if !self.contains_macro(PATH) && (self.path.ends_with('/') || !has_glob(&self.path)) {
                collector
                    .add_failure(
                        "When filtering with regular expressions, the path must \
                         be a directory and leverage glob syntax.",
                        Some("Usually the folder path needs to end with '/*'."),
                    )
                    .with_config_property(PATH)
                    .with_config_property(PATTERN);
            }
        }
    }

    /// Run-time validation: macros must be resolved, then every deploy-time
    /// rule applies. Returns the settings the run works with.
    pub fn settings(&self) -> Result<ReaderSettings, BatchError> {
        let mut collector = FailureCollector::new();
        for property in [
            PATH,
            NODE_PATH,
            PATTERN,
            TARGET_FOLDER,
            TEMPORARY_FOLDER,
            TABLE_EXPIRY_PERIOD,
        ] {
            if let Some(value) = self.property(property).filter(|v| contains_macro(v)) {
                collector
                    .add_failure(
                        format!("Unresolved macro in '{}': '{}'.", property, value),
                        Some("Provide a value for every macro before running."),
                    )
                    .with_config_property(property);
            }
        }
        self.collect_failures(&mut collector);
        collector.into_result()?;

        let pattern = match non_empty(&self.pattern) {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                BatchError::Configuration(format!("Invalid regular expression: {}", e))
            })?),
            None => None,
        };

        let target = || PathBuf::from(self.target_folder.as_deref().unwrap_or_default());
        let action = match self.action()? {
            ActionAfterProcess::None => PostProcessAction::None,
            ActionAfterProcess::Delete => PostProcessAction::Delete,
            ActionAfterProcess::Archive => PostProcessAction::Archive(target()),
            ActionAfterProcess::Move => PostProcessAction::Move(target()),
        };

        let tracking = if self.is_tracking_enabled() {
            let days = self
                .table_expiry_period
                .as_ref()
                .and_then(|period| period.days().ok().flatten());
            let expiry = match days {
                Some(days) if days > 0 => {
                    ExpiryPolicy::retain_days(u32::try_from(days).unwrap_or(u32::MAX))
                }
                _ => ExpiryPolicy::keep_forever(),
            };
            Some(TrackingSettings {
                table_name: self.table_name.clone().unwrap_or_default(),
                expiry,
                temporary_folder: PathBuf::from(&self.temporary_folder),
            })
        } else {
            debug!("File tracking disabled");
            None
        };

        Ok(ReaderSettings {
            path: self.path.clone(),
            pattern,
            node_path: self.node_path.clone(),
            action,
            reprocessing_required: self.is_reprocessing_required(),
            tracking,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> XmlReaderConfig {
        XmlReaderConfig {
            path: "/data/in/*.xml".to_string(),
            node_path: "/catalog/book".to_string(),
            table_name: Some("processed".to_string()),
            temporary_folder: "/tmp".to_string(),
            ..Default::default()
        }
    }

    fn failures(result: Result<(), BatchError>) -> ValidationErrors {
        match result {
            Err(BatchError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn json_should_use_camel_case_properties() {
        let config = XmlReaderConfig::from_json_str(
            r#"{"path":"/in","nodePath":"/a","reprocessingRequired":"yes","tableExpiryPeriod":2,"temporaryFolder":"/tmp"}"#,
        )
        .unwrap();

        assert_eq!(config.node_path, "/a");
        assert_eq!(config.table_expiry_period, Some(ExpiryPeriod::Days(2)));
        assert!(config.is_reprocessing_required());
        assert_eq!(config.action().unwrap(), ActionAfterProcess::None);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["nodePath"], "/a");
        assert!(json.get("targetFolder").is_none());
    }

    #[test]
    fn reprocessing_should_accept_yes_and_true() {
        for (value, expected) in [("YES", true), ("true", true), ("no", false), ("1", false)] {
            let config = XmlReaderConfig {
                reprocessing_required: Some(value.to_string()),
                ..config()
            };
            assert_eq!(config.is_reprocessing_required(), expected, "{}", value);
        }
        assert!(!config().is_reprocessing_required());
    }

    #[test]
    fn validation_should_aggregate_failures() {
        let config = XmlReaderConfig {
            path: String::new(),
            node_path: String::new(),
            table_expiry_period: Some(ExpiryPeriod::Days(-1)),
            temporary_folder: String::new(),
            ..config()
        };

        let errors = failures(config.validate());

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.for_property(PATH).count(), 1);
        assert_eq!(errors.for_property(NODE_PATH).count(), 1);
        assert_eq!(errors.for_property(TEMPORARY_FOLDER).count(), 1);
        let expiry = errors.for_property(TABLE_EXPIRY_PERIOD).next().unwrap();
        assert_eq!(expiry.message, "Invalid value: -1.");
        assert_eq!(
            expiry.corrective_action.as_deref(),
            Some("Value for 'Table Expiry Period' should either be empty or greater than 0")
        );
    }

    #[test]
    fn archive_without_target_folder_should_fail_on_target_folder() {
        let config = XmlReaderConfig {
            action_after_process: Some("ARCHIVE".to_string()),
            ..config()
        };

        let errors = failures(config.validate());

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.failures()[0].properties, vec![TARGET_FOLDER]);
        assert_eq!(
            errors.failures()[0].message,
            "Target folder cannot be empty for Action = 'ARCHIVE'."
        );
    }

    #[test]
    fn action_with_reprocessing_should_fail_on_both_properties() {
        let config = XmlReaderConfig {
            action_after_process: Some("delete".to_string()),
            reprocessing_required: Some("YES".to_string()),
            ..config()
        };

        let errors = failures(config.validate());

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.failures()[0].properties,
            vec![ACTION_AFTER_PROCESS, REPROCESSING_REQUIRED]
        );
    }

    #[test]
    fn unknown_action_should_fail() {
        let config = XmlReaderConfig {
            action_after_process: Some("SHRED".to_string()),
            ..config()
        };

        let errors = failures(config.validate());

        assert_eq!(errors.for_property(ACTION_AFTER_PROCESS).count(), 1);
    }

    #[test]
    fn pattern_should_require_glob_path() {
        let config = XmlReaderConfig {
            path: "/data/in/".to_string(),
            pattern: Some("(unclosed".to_string()),
            ..config()
        };

        let errors = failures(config.validate());

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.failures()[0].message,
            "Invalid regular expression: '(unclosed'."
        );
        assert_eq!(errors.failures()[1].properties, vec![PATH, PATTERN]);
        assert_eq!(
            errors.failures()[1].corrective_action.as_deref(),
            Some("Usually the folder path needs to end with '/*'.")
        );
    }

    #[test]
    fn deploy_validation_should_skip_macros_and_run_validation_should_not() {
        let config = XmlReaderConfig {
            path: "${input}".to_string(),
            pattern: Some("${filter}".to_string()),
            ..config()
        };

        assert!(config.validate().is_ok());

        let errors = match config.settings() {
            Err(BatchError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        };
        assert_eq!(errors.for_property(PATH).count(), 1);
        assert_eq!(errors.for_property(PATTERN).count(), 1);
    }

    #[test]
    fn resolve_macros_should_substitute_known_keys() {
        let config = XmlReaderConfig {
            path: "${root}/in/*.xml".to_string(),
            table_name: Some("${table}".to_string()),
            temporary_folder: "${missing}".to_string(),
            ..config()
        };
        let values = HashMap::from([
            ("root".to_string(), "/data".to_string()),
            ("table".to_string(), "processed".to_string()),
        ]);

        let resolved = config.resolve_macros(&values);

        assert_eq!(resolved.path, "/data/in/*.xml");
        assert_eq!(resolved.table_name.as_deref(), Some("processed"));
        assert_eq!(resolved.temporary_folder, "${missing}");
        assert!(resolved.contains_macro(TEMPORARY_FOLDER));
        assert!(!resolved.contains_macro(PATH));
    }

    #[test]
    fn settings_should_build_action_and_tracking() {
        let config = XmlReaderConfig {
            action_after_process: Some("move".to_string()),
            target_folder: Some("/data/done".to_string()),
            table_expiry_period: Some(ExpiryPeriod::Days(7)),
            ..config()
        };

        let settings = config.settings().unwrap();

        assert_eq!(settings.action, PostProcessAction::Move(PathBuf::from("/data/done")));
        let tracking = settings.tracking.unwrap();
        assert_eq!(tracking.table_name, "processed");
        assert_eq!(tracking.expiry, ExpiryPolicy::retain_days(7));
        assert_eq!(tracking.temporary_folder, PathBuf::from("/tmp"));
    }

    #[test]
    fn macro_table_name_should_disable_tracking() {
        let config = XmlReaderConfig {
            table_name: Some("${table}".to_string()),
            table_expiry_period: Some(ExpiryPeriod::Days(0)),
            ..config()
        };

        assert!(!config.is_tracking_enabled());
        assert!(config.settings().unwrap().tracking.is_none());
    }

    #[test]
    fn expiry_period_should_accept_a_macro_until_the_run() {
        let config = XmlReaderConfig::from_json_str(
            r#"{"path":"/in","nodePath":"/a","tableName":"processed","tableExpiryPeriod":"${days}","temporaryFolder":"/tmp"}"#,
        )
        .unwrap();

        assert_eq!(
            config.table_expiry_period,
            Some(ExpiryPeriod::Text("${days}".to_string()))
        );
        assert!(config.contains_macro(TABLE_EXPIRY_PERIOD));
        assert!(config.validate().is_ok());

        let errors = match config.settings() {
            Err(BatchError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.for_property(TABLE_EXPIRY_PERIOD).count(), 1);

        let values = HashMap::from([("days".to_string(), "5".to_string())]);
        let settings = config.resolve_macros(&values).settings().unwrap();
        assert_eq!(settings.tracking.unwrap().expiry, ExpiryPolicy::retain_days(5));
    }

    #[test]
    fn non_integer_expiry_period_should_fail() {
        let config = XmlReaderConfig {
            table_expiry_period: Some(ExpiryPeriod::Text("weekly".to_string())),
            ..config()
        };

        let errors = failures(config.validate());

        assert_eq!(errors.len(), 1);
        let expiry = errors.for_property(TABLE_EXPIRY_PERIOD).next().unwrap();
        assert_eq!(expiry.message, "Invalid value: weekly.");
        assert!(config.settings().is_err());

        let empty = XmlReaderConfig {
            table_expiry_period: Some(ExpiryPeriod::Text(String::new())),
            ..self::config()
        };
        assert_eq!(
            empty.settings().unwrap().tracking.unwrap().expiry,
            ExpiryPolicy::keep_forever()
        );
    }
}
