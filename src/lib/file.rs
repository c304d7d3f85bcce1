use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Expands filenames with ~ and env variables.  Does not turn
/// relative paths into absolute.
pub fn expand(filename: &str) -> Result<String> {
    shellexpand::full(filename)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| Error::Configuration(format!("cannot expand `{filename}`: {e}")))
}

/// Writes `contents` to the specified file, returning the expanded path.
///
/// Filenames support ~ and env variables
pub fn write(filename: &str, contents: &str) -> Result<String> {
    let expanded = expand(filename)?;
    fs::write(Path::new(expanded.as_str()), contents).map_err(|source| Error::Io {
        path: expanded.clone(),
        source,
    })?;
    Ok(expanded)
}
