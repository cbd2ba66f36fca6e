use std::borrow::Cow;

/// A specialized [`StorageError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid pack{}: {message}", format_context(.context))]
    InvalidPack { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Pack mounting is disabled{}: {message}", format_context(.context))]
    PacksDisabled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Decompression failure{}: {source}", format_context(.context))]
    Decompress { source: lz4_flex::block::DecompressError, context: Option<Cow<'static, str>> },
}

impl StorageError {
    /// `true` when the target simply does not exist, so callers can fall back.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }

    pub(crate) fn not_found(path: impl std::fmt::Display) -> Self {
        Self::FileNotFound { message: path.to_string().into(), context: None }
    }
}

/// Adds a human-readable context to storage results.
pub trait StorageErrorExt<T> {
    /// Attaches `context` to the error, if any.
    ///
    /// # Errors
    /// Propagates the original error with the context attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError>;
}

impl<T> StorageErrorExt<T> for Result<T, StorageError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                StorageError::FileNotFound { context: c, .. }
                | StorageError::PathTraversalAttempt { context: c, .. }
                | StorageError::Io { context: c, .. }
                | StorageError::InvalidPack { context: c, .. }
                | StorageError::PacksDisabled { context: c, .. }
                | StorageError::Decompress { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl From<std::io::Error> for StorageError {
    #[inline]
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, context: None }
    }
}

impl<T> StorageErrorExt<T> for Result<T, std::io::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError> {
        self.map_err(|source| StorageError::Io { source, context: Some(context.into()) })
    }
}

impl From<lz4_flex::block::DecompressError> for StorageError {
    #[inline]
    fn from(source: lz4_flex::block::DecompressError) -> Self {
        Self::Decompress { source, context: None }
    }
}

impl<T> StorageErrorExt<T> for Result<T, lz4_flex::block::DecompressError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError> {
        self.map_err(|source| StorageError::Decompress { source, context: Some(context.into()) })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
