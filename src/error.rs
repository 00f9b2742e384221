//! Error type shared by the parser, file discovery and CSV output.
use std::io;
use std::path::PathBuf;

use quick_xml::events::attributes::AttrError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can make a single report, or a single output file, fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The reader hit ill-formed markup, a bad escape or an I/O error
    /// while pulling events.
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be tokenized.
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    /// The event stream ended while elements were still open.
    #[error("document ended with {open} unclosed element(s), innermost <{innermost}>")]
    Truncated {
        /// Number of elements left open.
        open: usize,
        /// Name of the innermost open element.
        innermost: String,
    },

    /// A file or directory could not be read or created.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An input path is neither a file nor a directory.
    #[error("invalid file or directory path: {}", .0.display())]
    InvalidInput(PathBuf),

    /// Walking an input directory failed.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// A CSV record could not be written.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
