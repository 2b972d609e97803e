//! Target path resolution for file requests.
//!
//! The target is the base directory with the request name appended verbatim,
//! so a leading `/` in the name stays under the base directory while `..`
//! segments are not normalized away.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Append `name` to `base_dir` by plain concatenation.
pub fn target_path(base_dir: &Path, name: &str) -> PathBuf {
    let mut raw = OsString::from(base_dir.as_os_str());
    let has_separator = raw
        .to_str()
        .map(|s| s.ends_with(std::path::MAIN_SEPARATOR) || s.ends_with('/'))
        .unwrap_or(false);
    if !raw.is_empty() && !has_separator {
        raw.push(std::path::MAIN_SEPARATOR_STR);
    }
    raw.push(name);
    PathBuf::from(raw)
}

/// Whether `name` lexically climbs above the directory it is appended to.
pub fn escapes_base_dir(name: &str) -> bool {
    let mut depth: i64 = 0;
    for component in Path::new(name).components() {
        match component {
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            Component::Normal(_) => depth += 1,
            // Root and `.` are absorbed by the concatenation.
            Component::RootDir | Component::CurDir => {}
            Component::Prefix(_) => return true,
        }
    }
    false
}
