//! File-backed cache of the last API responses.
//!
//! Each persisted endpoint has one plain JSON file inside the cache
//! directory. Failures never propagate: a failed write is logged and dropped,
//! a failed read is logged and yields an empty value.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};
use ufm_streamer_types::EndpointKind;

/// Serialize `value` and overwrite the file at `path`.
///
/// The parent directory is created if missing. Errors are logged and
/// swallowed.
pub fn save(path: &Path, value: &Value) {
    match write_file(path, value) {
        Ok(()) => info!(path = %path.display(), "finished writing json file"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to write json file"),
    }
}

/// Read and parse the JSON file at `path`.
///
/// Any read or parse error is logged and `Value::Null` is returned.
pub fn load(path: &Path) -> Value {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(value) => {
                info!(path = %path.display(), "finished reading json file");
                value
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "parse error in json file");
                Value::Null
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "read error on json file");
            Value::Null
        }
    }
}

fn write_file(path: &Path, value: &Value) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string(value)?;
    fs::write(path, content)
}

/// Maps endpoints to their result files inside one directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `dir`. Nothing is touched on disk until the
    /// first save.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the result file for an endpoint.
    pub fn path_for(&self, kind: EndpointKind) -> PathBuf {
        self.dir.join(kind.descriptor().result_file)
    }

    /// Whether a result file exists for an endpoint.
    pub fn contains(&self, kind: EndpointKind) -> bool {
        self.path_for(kind).is_file()
    }

    /// Persist an endpoint's value.
    pub fn save_endpoint(&self, kind: EndpointKind, value: &Value) {
        save(&self.path_for(kind), value);
    }

    /// Load an endpoint's value, empty on any failure.
    pub fn load_endpoint(&self, kind: EndpointKind) -> Value {
        load(&self.path_for(kind))
    }
}
