use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::BatchError;

/// What happens to a file once every record of it has been read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PostProcessAction {
    /// Leave the file in place
    #[default]
    None,
    /// Remove the file
    Delete,
    /// Compress the file into `<target>/<name>.zip`, then remove it
    Archive(PathBuf),
    /// Move the file into the target folder
    Move(PathBuf),
}

impl fmt::Display for PostProcessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostProcessAction::None => write!(f, "NONE"),
            PostProcessAction::Delete => write!(f, "DELETE"),
            PostProcessAction::Archive(target) => write!(f, "ARCHIVE({})", target.display()),
            PostProcessAction::Move(target) => write!(f, "MOVE({})", target.display()),
        }
    }
}

fn file_name(file: &Path) -> Result<&str, BatchError> {
    file.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            BatchError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no valid file name", file.display()),
            ))
        })
}

fn ensure_target_folder(target: &Path) -> Result<(), BatchError> {
    if target.is_dir() {
        Ok(())
    } else {
        Err(BatchError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Target folder {} does not exist", target.display()),
        )))
    }
}

impl PostProcessAction {
    /// Applies the action to a fully consumed file.
    pub fn apply(&self, file: &Path) -> Result<(), BatchError> {
        match self {
            PostProcessAction::None => Ok(()),
            PostProcessAction::Delete => {
                fs::remove_file(file)?;
                info!("Deleted {}", file.display());
                Ok(())
            }
            PostProcessAction::Move(target) => move_file(file, target),
            PostProcessAction::Archive(target) => archive_file(file, target),
        }
    }
}

fn move_file(file: &Path, target: &Path) -> Result<(), BatchError> {
    ensure_target_folder(target)?;
    let destination = target.join(file_name(file)?);

    if let Err(e) = fs::rename(file, &destination) {
        // rename does not cross filesystems
        debug!("Rename of {} failed ({}), copying instead", file.display(), e);
        fs::copy(file, &destination)?;
        fs::remove_file(file)?;
    }

    info!("Moved {} to {}", file.display(), destination.display());
    Ok(())
}

#[cfg(feature = "zip")]
fn archive_file(file: &Path, target: &Path) -> Result<(), BatchError> {
    use std::fs::File;
    use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

    ensure_target_folder(target)?;
    let name = file_name(file)?;
    let archive_path = target.join(format!("{}.zip", name));

    let mut zip_writer = ZipWriter::new(File::create(&archive_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip_writer
        .start_file(name, options)
        .map_err(|e| BatchError::Io(io::Error::other(format!("Failed to start zip entry: {}", e))))?;

    let mut source = File::open(file)?;
    io::copy(&mut source, &mut zip_writer)?;
    zip_writer
        .finish()
        .map_err(|e| BatchError::Io(io::Error::other(format!("Failed to finish archive: {}", e))))?;

    fs::remove_file(file)?;
    info!("Archived {} to {}", file.display(), archive_path.display());
    Ok(())
}

#[cfg(not(feature = "zip"))]
fn archive_file(file: &Path, _target: &Path) -> Result<(), BatchError> {
    Err(BatchError::Configuration(format!(
        "Cannot archive {}: the `zip` feature is disabled",
        file.display()
    )))
}
