use lattice_storage::StorageError;
use std::borrow::Cow;

/// A specialized [`SettingsError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file does not exist; setup falls through to the next candidate.
    #[error("Settings file not found{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Setting not found{}: {message}", format_context(.context))]
    KeyNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Bad magic, truncated frame, or an unparsable text document.
    #[error("Corrupt settings data{}: {message}", format_context(.context))]
    CorruptData { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The file was saved by a newer layout version than this build understands.
    #[error(
        "Incompatible config version{}: file declares {found}, newest supported is {supported}",
        format_context(.context)
    )]
    IncompatibleVersion { found: i64, supported: i64, context: Option<Cow<'static, str>> },

    /// The destination could not be written; only the failing save is affected.
    #[error("Settings write failed{}: {source}", format_context(.context))]
    WriteFailure { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Storage failure{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Value encoding failed{}: {source}", format_context(.context))]
    Encode { source: postcard::Error, context: Option<Cow<'static, str>> },

    #[error("Unrecognized settings format{}: {message}", format_context(.context))]
    UnrecognizedFormat { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Resource pack unavailable{}: {message}", format_context(.context))]
    PackUnavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid parameter{}: {message}", format_context(.context))]
    InvalidParameter { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl SettingsError {
    /// `true` for a missing file, so discovery can silently try the next candidate.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }

    pub(crate) fn key_not_found(key: &str) -> Self {
        Self::KeyNotFound { message: key.to_owned().into(), context: None }
    }

    pub(crate) fn corrupt(message: impl Into<Cow<'static, str>>) -> Self {
        Self::CorruptData { message: message.into(), context: None }
    }
}

pub trait SettingsErrorExt<T> {
    /// Attaches `context` to the error, if any.
    ///
    /// # Errors
    /// Propagates the original error with the context attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SettingsError>;
}

impl<T> SettingsErrorExt<T> for Result<T, SettingsError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                SettingsError::FileNotFound { context: c, .. }
                | SettingsError::KeyNotFound { context: c, .. }
                | SettingsError::CorruptData { context: c, .. }
                | SettingsError::IncompatibleVersion { context: c, .. }
                | SettingsError::WriteFailure { context: c, .. }
                | SettingsError::Storage { context: c, .. }
                | SettingsError::Encode { context: c, .. }
                | SettingsError::UnrecognizedFormat { context: c, .. }
                | SettingsError::PackUnavailable { context: c, .. }
                | SettingsError::InvalidParameter { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

/// Missing files keep their own variant so callers can fall back without matching on storage.
impl From<StorageError> for SettingsError {
    #[inline]
    fn from(source: StorageError) -> Self {
        if source.is_not_found() {
            Self::FileNotFound { message: source.to_string().into(), context: None }
        } else {
            Self::Storage { source, context: None }
        }
    }
}

impl<T> SettingsErrorExt<T> for Result<T, StorageError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SettingsError> {
        self.map_err(SettingsError::from).context(context)
    }
}

impl From<postcard::Error> for SettingsError {
    #[inline]
    fn from(source: postcard::Error) -> Self {
        Self::Encode { source, context: None }
    }
}

impl<T> SettingsErrorExt<T> for Result<T, postcard::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SettingsError> {
        self.map_err(|source| SettingsError::Encode { source, context: Some(context.into()) })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
