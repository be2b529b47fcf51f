//! Error types for DIDL-Lite fragment processing.

use thiserror::Error;

/// Result type alias for parse-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing XML trees.
#[derive(Error, Debug)]
pub enum Error {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Result of a fragment apply operation.
///
/// `Ok(())` means every fragment pair was accepted and the object was
/// patched. Any failure aborts the whole operation and leaves the object
/// untouched.
pub type FragmentResult = std::result::Result<(), FragmentError>;

/// The closed set of ways a fragment apply operation can fail.
///
/// The first failure at any step is returned verbatim; there is no partial
/// success and no retry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentError {
    /// A current fragment is not well-formed XML.
    #[error("current fragment is not well-formed XML")]
    CurrentBadXml,

    /// A new fragment is not well-formed XML.
    #[error("new fragment is not well-formed XML")]
    NewBadXml,

    /// A current fragment does not reflect the object's actual state, or the
    /// fragment arrays were empty.
    #[error("current fragment does not match the object's state")]
    CurrentInvalid,

    /// A new fragment changes an element's tag, or a staged edit left the
    /// document invalid.
    #[error("new fragment is not valid against the object")]
    NewInvalid,

    /// A fragment pair would remove or empty a required property.
    #[error("fragment touches a required tag")]
    RequiredTag,

    /// A fragment pair would modify a read-only property.
    #[error("fragment touches a read-only tag")]
    ReadonlyTag,

    /// The current and new fragment arrays have different lengths.
    #[error("current and new fragment counts differ")]
    Mismatch,

    /// Internal structural inconsistency; signals a logic or data-integrity
    /// problem rather than bad caller input.
    #[error("internal inconsistency while applying fragments")]
    UnknownError,
}
