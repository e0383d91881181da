use std::fmt;

/// Hard-failure kinds that abort a run, each mapped to a distinct process
/// exit code by `main`. Per-query soft failures never become one of these:
/// they are logged via `log::warn!` and the run continues.
#[derive(Debug)]
pub enum RunError {
    InvalidArguments(String),
    MaskFileUnreadable(String),
    TaxonomyFileUnreadable(String),
    TreeFileMalformed(String),
    ReferenceSequenceFileUnreadable(String),
    MissingReferenceSequences(String),
    NoQuerySequences,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::InvalidArguments(msg) => write!(f, "invalid arguments: {msg}"),
            RunError::MaskFileUnreadable(msg) => write!(f, "mask file unreadable: {msg}"),
            RunError::TaxonomyFileUnreadable(msg) => write!(f, "taxonomy file unreadable: {msg}"),
            RunError::TreeFileMalformed(msg) => write!(f, "tree file unreadable or malformed: {msg}"),
            RunError::ReferenceSequenceFileUnreadable(msg) => {
                write!(f, "reference sequence file unreadable: {msg}")
            }
            RunError::MissingReferenceSequences(msg) => {
                write!(f, "one or more reference leaves lack sequence data: {msg}")
            }
            RunError::NoQuerySequences => write!(f, "zero query sequences provided"),
        }
    }
}

impl std::error::Error for RunError {}

impl RunError {
    /// Process exit code the driver reports for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::InvalidArguments(_) => 2,
            RunError::MaskFileUnreadable(_) => 3,
            RunError::TaxonomyFileUnreadable(_) => 4,
            RunError::TreeFileMalformed(_) => 5,
            RunError::ReferenceSequenceFileUnreadable(_) => 6,
            RunError::MissingReferenceSequences(_) => 7,
            RunError::NoQuerySequences => 8,
        }
    }
}

/// Exit code used for any error anyhow carries that does not downcast to a
/// [`RunError`].
pub const GENERIC_EXIT_CODE: i32 = 1;
