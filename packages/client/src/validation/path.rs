//! Download destination path validation
//!
//! Rejects traversal, control bytes and writes into system directories
//! before the download subsystem touches the filesystem.

use std::path::{Component, Path, PathBuf};

use super::{fail, ValidationError};

/// Longest accepted path, in bytes.
pub const MAX_PATH_LEN: usize = 4096;

/// Absolute prefixes that downloads must never write under. Compared
/// case-insensitively against the normalized input.
pub const BLOCKED_PREFIXES: [&str; 18] = [
    "/etc/",
    "/sys/",
    "/proc/",
    "/dev/",
    "/boot/",
    "/root/",
    "/usr/bin/",
    "/usr/sbin/",
    "/bin/",
    "/sbin/",
    "c:\\windows\\",
    "c:\\system32\\",
    "c:\\program files\\",
    "c:\\programdata\\",
    "c:\\boot\\",
    "/library/",
    "/system/",
    "/applications/",
];

/// Validate a download destination path.
///
/// Pure: parent directories are created later by the download subsystem,
/// after this check passes.
pub fn validate_download_path(raw: &str) -> Result<PathBuf, ValidationError> {
    if raw.trim().is_empty() {
        return fail("file path", "must not be empty");
    }
    if raw.len() > MAX_PATH_LEN {
        return fail("file path", format!("longer than {MAX_PATH_LEN} bytes"));
    }
    if raw.bytes().any(|b| matches!(b, 0x00 | b'\r' | b'\n')) {
        return fail("file path", "contains NUL, CR or LF");
    }
    #[cfg(not(windows))]
    if raw.starts_with("\\\\") {
        return fail("file path", "UNC paths are not supported on this platform");
    }

    let path = Path::new(raw);
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return fail("file path", "must not contain '..' segments");
        }
    }

    let lowered = raw.to_ascii_lowercase();
    for prefix in BLOCKED_PREFIXES {
        if lowered.starts_with(prefix) || lowered == prefix.trim_end_matches(['/', '\\']) {
            return fail(
                "file path",
                format!("writes under {prefix:?} are not allowed"),
            );
        }
    }

    Ok(path.to_path_buf())
}
