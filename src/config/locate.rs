//! rc-file discovery
//!
//! An explicit directory + file name is checked as-is and must exist.
//! Otherwise the search walks from the start directory up to the filesystem
//! root; the first directory holding any recognized name wins, and within a
//! directory [`RC_FILE_NAMES`] order decides.

use std::path::{Path, PathBuf};

use log::debug;

use super::effective::ConfigError;

/// Recognized rc file names, in per-directory precedence order.
pub const RC_FILE_NAMES: &[&str] = &[
    ".ncurc.json",
    ".ncurc.cjs",
    ".ncurc.js",
    ".ncurc.yaml",
    ".ncurc.yml",
    ".ncurc",
];

/// Find the rc file for an invocation.
///
/// * `start_dir` - directory to search from when no explicit directory is given
/// * `explicit_dir` - `--configFilePath`
/// * `explicit_name` - `--configFileName`; when set the file must exist
pub fn locate(
    start_dir: &Path,
    explicit_dir: Option<&Path>,
    explicit_name: Option<&str>,
) -> Result<Option<PathBuf>, ConfigError> {
    let dir = explicit_dir.unwrap_or(start_dir);

    if let Some(name) = explicit_name {
        let candidate = dir.join(name);
        debug!("checking explicit config file {}", candidate.display());
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
        return Err(ConfigError::NotFound {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        });
    }

    Ok(discover(dir))
}

/// Walk `start` and its ancestors looking for a recognized rc file.
pub fn discover(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        for name in RC_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!("found config file {}", candidate.display());
                return Some(candidate);
            }
        }
    }
    debug!("no config file found above {}", start.display());
    None
}
