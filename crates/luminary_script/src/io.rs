use std::path::Path;

use crate::error::LinkError;

/// Write `contents` beside `path` and rename it into place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), LinkError> {
    let staging = path.with_extension("tmp");
    let result = std::fs::write(&staging, contents).and_then(|()| std::fs::rename(&staging, path));
    result.map_err(|source| {
        let _ = std::fs::remove_file(&staging);
        LinkError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}
