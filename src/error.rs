use std::{io, path::PathBuf, result};
use thiserror::Error;
use zip::result::ZipError;
pub type Result<T, E = XlReplaceError> = result::Result<T, E>;
#[derive(Debug, Error)]
pub enum XlReplaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Error reading Excel file: {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("An error occurred: {0}")]
    Other(String),
}
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields (missing: {0})")]
    MissingField(&'static str),
    #[error("Invalid range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },
    #[error("Invalid replacement rules format: expected find,replace pairs but got {tokens} tokens")]
    InvalidRules { tokens: usize },
    #[error("Sheet '{name}' not found (available: {})", available.join(", "))]
    UnknownSheet { name: String, available: Vec<String> },
}
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found")]
    NotFound,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid xlsx container: {0}")]
    Zip(#[from] ZipError),
    #[error("required part is missing: {0}")]
    MissingPart(String),
    #[error("part is not valid UTF-8: {0}")]
    NotUtf8(String),
    #[error("malformed worksheet XML in {part}: {reason}")]
    MalformedXml { part: String, reason: String },
    #[error("no sheets found in workbook")]
    NoSheets,
    #[error("legacy .xls (BIFF) workbooks cannot be rewritten; save the file as .xlsx first")]
    LegacyXls,
}
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Permission denied: {}: {source}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to save {}: {reason}", path.display())]
    Other { path: PathBuf, reason: String },
}
#[derive(Debug, Error)]
pub enum SubstitutionError {
    #[error("shared string index {index} is out of range ({len} strings)")]
    SharedStringOutOfRange { index: usize, len: usize },
    #[error("cell value is not a valid shared string index: {0}")]
    BadSharedStringIndex(String),
    #[error("cell XML is malformed: {0}")]
    MalformedCell(String),
    #[error("cell anchors a shared formula used by other cells")]
    SharedFormulaAnchor,
}
impl XlReplaceError {
    pub fn load<P, S>(path: P, source: S) -> Self
    where
        P: Into<PathBuf>,
        S: Into<LoadError>,
    {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Load { .. } => 3,
            Self::Persist(_) => 4,
            Self::Other(_) => 1,
        }
    }
}
impl PersistError {
    pub fn from_io<P: Into<PathBuf>>(path: P, context: &str, source: io::Error) -> Self {
        let path = path.into();
        if is_permission_error(&source) {
            Self::PermissionDenied { path, source }
        } else {
            Self::Other {
                path,
                reason: format!("{context} ({source})"),
            }
        }
    }
}
fn is_permission_error(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    cfg!(windows) && matches!(e.raw_os_error(), Some(32 | 33))
}
