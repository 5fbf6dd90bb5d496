//! Error handling for the NVRTC bindings
//!
//! Every native call reports its outcome as a [`ResultCode`]. Non-success
//! codes are never recovered from locally; they surface unchanged inside
//! [`NvrtcError::Api`] together with the entry point that produced them.
//! The remaining variants cover failures detected on the Rust side of the
//! boundary before a native call is made.

use crate::result::ResultCode;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = NvrtcError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum NvrtcError {
    /// None of the candidate library names could be opened
    #[error("NVRTC library not found (tried: {})", tried.join(", "))]
    LibraryNotFound { tried: Vec<String> },

    /// An explicitly configured library failed to load
    #[error("Failed to load NVRTC library {}: {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The loaded library does not export a required entry point
    #[error("NVRTC library does not export {symbol}: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// An optional entry point is absent from the loaded library
    #[error("Loaded NVRTC library does not provide {symbol}")]
    Unsupported { symbol: &'static str },

    /// A native call returned a non-success code
    #[error("{call} failed: {code}")]
    Api {
        call: &'static str,
        code: ResultCode,
    },

    /// A string handed to the native side contains an interior NUL
    #[error("Invalid {what}: {source}")]
    InvalidString {
        what: &'static str,
        #[source]
        source: std::ffi::NulError,
    },

    #[error("Header count ({headers}) does not match include name count ({include_names})")]
    HeaderMismatch { headers: usize, include_names: usize },

    #[error("Too many {what} for the native int count: {count}")]
    TooManyEntries { what: &'static str, count: usize },

    #[error("Output buffer too small: {required} bytes required, {provided} provided")]
    BufferTooSmall { required: usize, provided: usize },

    /// Output was requested before any compile attempt
    #[error("Program has not been compiled")]
    NotCompiled,

    /// PTX was requested after the last compile attempt failed
    #[error("Last compilation attempt failed ({code}); only the log is available")]
    CompilationFailed { code: ResultCode },

    /// Compilation failed; carries the diagnostic log
    #[error("Compilation failed ({code}):\n{log}")]
    Compilation { code: ResultCode, log: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl NvrtcError {
    /// Native result code behind this error, if it came from the library.
    pub fn code(&self) -> Option<ResultCode> {
        match self {
            NvrtcError::Api { code, .. }
            | NvrtcError::CompilationFailed { code }
            | NvrtcError::Compilation { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn invalid_string(what: &'static str) -> impl FnOnce(std::ffi::NulError) -> Self {
        move |source| NvrtcError::InvalidString { what, source }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    #[error("Invalid configuration value for {key}: {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
