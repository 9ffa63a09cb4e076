//! Profile error types.

/// Errors that can occur when loading or saving a profile file.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Failed to read the profile file from disk.
    #[error("failed to read profile: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to write the profile file to disk.
    #[error("failed to write profile: {0}")]
    Write(#[source] std::io::Error),

    /// A line that is neither a section header, a property, a comment, nor
    /// blank.
    #[error("profile syntax error on line {line}: {text:?}")]
    Syntax { line: usize, text: String },
}
