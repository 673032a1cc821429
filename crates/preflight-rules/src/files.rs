//! File access checks

use directories::BaseDirs;
use preflight_core::{ArgumentError, Outcome, RuleArgs, RuleInput, RuleResult};
use serde_json::Value;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Access mode bits, numbered like POSIX `access(2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessMode(u8);

impl AccessMode {
    /// Path exists
    pub const EXISTS: Self = Self(0);
    /// Path is executable
    pub const EXECUTE: Self = Self(1);
    /// Path is writable
    pub const WRITE: Self = Self(2);
    /// Path is readable
    pub const READ: Self = Self(4);

    /// Build from raw bits
    ///
    /// # Errors
    /// Returns error for bits outside `0..=7`
    pub fn from_bits(bits: u64) -> Result<Self, ArgumentError> {
        u8::try_from(bits)
            .ok()
            .filter(|b| *b <= 7)
            .map(Self)
            .ok_or_else(|| ArgumentError::invalid("mode", format!("unknown access mode {bits}")))
    }

    /// Raw bits
    #[inline]
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Check if every bit of `other` is set
    #[inline]
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for AccessMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Expand a leading `~` to the current user's home directory
///
/// `~user` forms and paths on hosts without a resolvable home are returned
/// unchanged.
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    let rest = match rest.strip_prefix('/') {
        Some(rest) => rest,
        None if rest.is_empty() => rest,
        None => return PathBuf::from(path),
    };
    match BaseDirs::new() {
        Some(dirs) if rest.is_empty() => dirs.home_dir().to_path_buf(),
        Some(dirs) => dirs.home_dir().join(rest),
        None => {
            tracing::debug!(path, "no home directory; leaving path unexpanded");
            PathBuf::from(path)
        }
    }
}

/// Check if `path` can be accessed with every bit of `mode`
#[must_use]
pub fn is_accessible(path: &Path, mode: AccessMode) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if mode.contains(AccessMode::READ) && !metadata.is_dir() && File::open(path).is_err() {
        return false;
    }
    if mode.contains(AccessMode::WRITE)
        && (metadata.permissions().readonly()
            || (!metadata.is_dir() && OpenOptions::new().append(true).open(path).is_err()))
    {
        return false;
    }
    if mode.contains(AccessMode::EXECUTE) && !is_executable(&metadata) {
        return false;
    }
    true
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

/// Outcome of an access check on an optional path argument
#[must_use]
pub fn file_access_ok(
    filename: Option<&str>,
    mode: AccessMode,
    param_name: &str,
    required: bool,
) -> Outcome {
    let Some(filename) = filename.filter(|f| !f.is_empty()) else {
        return Outcome::check(!required, || format!("Parameter {param_name} required"));
    };
    Outcome::check(is_accessible(&expand_home(filename), mode), || {
        format!("Could not open {filename} with mode {mode} for parameter {param_name}")
    })
}

/// `file_exists(param_name, mode = READ, required = true)`
pub(crate) fn file_exists(input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
    let param_name = args.require_str("param_name", 0)?;
    let mode = match args.get("mode", 1) {
        None => AccessMode::READ,
        Some(Value::Number(n)) => {
            let bits = n
                .as_u64()
                .ok_or_else(|| ArgumentError::invalid("mode", format!("expected bits, got {n}")))?;
            AccessMode::from_bits(bits)?
        }
        Some(other) => {
            return Err(ArgumentError::invalid("mode", format!("expected bits, got {other}")).into())
        }
    };
    let required = args.bool_or("required", 2, true)?;

    let filename = input.config.arg(param_name).and_then(Value::as_str);
    Ok(file_access_ok(filename, mode, param_name, required))
}
