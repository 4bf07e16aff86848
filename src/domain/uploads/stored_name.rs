use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static UNSAFE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

pub const MAX_NAME_LEN: usize = 255;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("file name is empty")]
    Empty,
    #[error("file name has no usable characters")]
    Unusable,
    #[error("file name must be a single path component")]
    NotSingleComponent,
    #[error("file name exceeds {MAX_NAME_LEN} bytes")]
    TooLong,
}

/// A single path component that is safe to join onto the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredName(String);

impl StoredName {
    /// Turns an untrusted client filename into a safe one.
    ///
    /// Accents are folded (NFKD) before anything outside ASCII is dropped.
    /// Separators and whitespace become `_`, anything outside `[A-Za-z0-9_.-]`
    /// is removed and leading/trailing dots and underscores are trimmed, so
    /// `../../etc/passwd` ends up as `etc_passwd`.
    pub fn sanitize(original: &str) -> Result<Self, NameError> {
        if original.trim().is_empty() {
            return Err(NameError::Empty);
        }
        let ascii: String = original
            .nfkd()
            .filter(char::is_ascii)
            .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
            .collect();
        let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
        let cleaned = UNSAFE_CHARS_RE.replace_all(&joined, "");
        let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
        if trimmed.is_empty() {
            return Err(NameError::Unusable);
        }

        let mut name = trimmed.to_string();
        if is_device_name(&name) {
            name.insert(0, '_');
        }
        Ok(Self(truncate_keeping_extension(name)))
    }

    /// Accepts a caller-chosen name verbatim, or rejects it. Never rewrites.
    pub fn from_segment(segment: &str) -> Result<Self, NameError> {
        if segment.is_empty() {
            return Err(NameError::Empty);
        }
        if segment == "." || segment == ".." {
            return Err(NameError::NotSingleComponent);
        }
        // ':' would let a drive prefix replace the root on Windows.
        if segment
            .chars()
            .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control())
        {
            return Err(NameError::NotSingleComponent);
        }
        if segment.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong);
        }
        Ok(Self(segment.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_device_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    WINDOWS_DEVICE_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

// Only called on ASCII input, so byte offsets are char boundaries.
fn truncate_keeping_extension(mut name: String) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() + 1 < MAX_NAME_LEN => {
            let keep = MAX_NAME_LEN - ext.len() - 1;
            format!("{}.{}", &stem[..keep.min(stem.len())], ext)
        }
        _ => {
            name.truncate(MAX_NAME_LEN);
            name
        }
    }
}
