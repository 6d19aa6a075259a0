use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use regex::Regex;

use crate::{BatchError, tracking::ExclusionSet};

/// Characters that turn a path component into a glob.
const GLOB_CHARS: [char; 4] = ['*', '?', '[', '{'];

pub fn has_glob(path: &str) -> bool {
    path.contains(GLOB_CHARS)
}

/// Translates a file name glob into an anchored regular expression.
///
/// Supports `*`, `?`, `[...]` (with `!` negation) and `{a,b}` alternatives.
pub fn glob_to_regex(glob: &str) -> Result<Regex, BatchError> {
    let mut regex = String::from("^");
    let mut chars = glob.chars().peekable();
    let mut brace_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push_str("[^/]"),
            '[' => {
                regex.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    regex.push('^');
                }
                for class_char in chars.by_ref() {
                    if class_char == ']' {
                        break;
                    }
                    if class_char == '\\' || class_char == '[' {
                        regex.push('\\');
                    }
                    regex.push(class_char);
                }
                regex.push(']');
            }
            '{' => {
                brace_depth += 1;
                regex.push_str("(?:");
            }
            '}' if brace_depth > 0 => {
                brace_depth -= 1;
                regex.push(')');
            }
            ',' if brace_depth > 0 => regex.push('|'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');

    Regex::new(&regex)
        .map_err(|e| BatchError::Configuration(format!("Invalid glob '{}': {}", glob, e)))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        BatchError::ItemReader(format!("Unable to list {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Resolves the files to read for `path`.
///
/// `path` may be a single file, a directory (its files, not recursive) or a
/// glob in its last component. Files whose name does not match `pattern` or
/// that are in `exclusions` are left out. The result is sorted.
pub fn resolve_input_files(
    path: &str,
    pattern: Option<&Regex>,
    exclusions: &ExclusionSet,
) -> Result<Vec<PathBuf>, BatchError> {
    let input = Path::new(path);
    let last_component = input.file_name().and_then(|name| name.to_str());

    let candidates = match last_component {
        Some(component) if has_glob(component) => {
            let dir = match input.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let glob = glob_to_regex(component)?;
            list_files(dir)?
                .into_iter()
                .filter(|file| file_name(file).is_some_and(|name| glob.is_match(name)))
                .collect()
        }
        _ if input.is_dir() => list_files(input)?,
        _ if input.is_file() => vec![input.to_path_buf()],
        _ => {
            return Err(BatchError::ItemReader(format!(
                "Input path {} does not exist",
                path
            )));
        }
    };

    let mut files: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|file| {
            let Some(name) = file_name(file) else {
                return false;
            };
            if pattern.is_some_and(|pattern| !pattern.is_match(name)) {
                return false;
            }
            if exclusions.contains(name) {
                debug!("Skipping already processed file {}", name);
                return false;
            }
            true
        })
        .collect();
    files.sort();

    debug!("Resolved {} input file(s) for {}", files.len(), path);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(files: &[PathBuf]) -> Vec<&str> {
        files.iter().filter_map(|f| file_name(f)).collect()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in ["catalog1.xml", "catalog2.xml", "books.xml", "notes.txt"] {
            fs::write(dir.path().join(name), "<catalog/>").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        dir
    }

    #[test]
    fn glob_should_translate_to_anchored_regex() -> Result<(), BatchError> {
        assert!(glob_to_regex("*.xml")?.is_match("catalog.xml"));
        assert!(!glob_to_regex("*.xml")?.is_match("catalog.xml.bak"));
        assert!(glob_to_regex("catalog?.xml")?.is_match("catalog1.xml"));
        assert!(glob_to_regex("{books,notes}.*")?.is_match("notes.txt"));
        assert!(glob_to_regex("catalog[!2].xml")?.is_match("catalog1.xml"));
        assert!(!glob_to_regex("catalog[!2].xml")?.is_match("catalog2.xml"));
        assert!(!glob_to_regex("a+b.xml")?.is_match("aab.xml"));
        Ok(())
    }

    #[test]
    fn directory_should_list_files_only() -> Result<(), BatchError> {
        let dir = fixture();

        let files = resolve_input_files(
            dir.path().to_str().unwrap(),
            None,
            &ExclusionSet::empty(),
        )?;

        assert_eq!(
            names(&files),
            vec!["books.xml", "catalog1.xml", "catalog2.xml", "notes.txt"]
        );
        Ok(())
    }

    #[test]
    fn glob_pattern_and_exclusions_should_filter_files() -> Result<(), BatchError> {
        let dir = fixture();
        let path = format!("{}/*.xml", dir.path().display());
        let pattern = Regex::new("^catalog").unwrap();
        let exclusions: ExclusionSet = ["catalog2.xml"].into_iter().collect();

        let files = resolve_input_files(&path, Some(&pattern), &exclusions)?;

        assert_eq!(names(&files), vec!["catalog1.xml"]);
        Ok(())
    }

    #[test]
    fn single_file_should_resolve_to_itself() -> Result<(), BatchError> {
        let dir = fixture();
        let path = dir.path().join("books.xml");

        let files = resolve_input_files(path.to_str().unwrap(), None, &ExclusionSet::empty())?;

        assert_eq!(files, vec![path]);
        Ok(())
    }

    #[test]
    fn missing_path_should_fail() {
        let result = resolve_input_files("/definitely/not/here.xml", None, &ExclusionSet::empty());

        assert!(matches!(result, Err(BatchError::ItemReader(_))));
    }
}
