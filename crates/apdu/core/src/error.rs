//! Core error type for buffer, APDU and transport operations
//!
//! Buffer underruns, malformed responses and transport failures all surface
//! through [`Error`] so that higher layers can bubble them up with `?`.

use crate::response::ResponseError;
use crate::transport::TransportError;

/// Result type for core operations
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read asked for more bytes than the buffer holds past its cursor
    #[error("Insufficient data: needed {needed} bytes, {remaining} remaining")]
    InsufficientData {
        /// Bytes requested by the read
        needed: usize,
        /// Bytes left after the cursor
        remaining: usize,
    },

    /// Command data does not fit a short APDU
    #[error("Invalid command length: {0}")]
    InvalidCommandLength(usize),

    /// Response could not be parsed
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Context error with message and source error
    #[error("{context}: {source}")]
    Context {
        /// Contextual message
        context: String,
        /// Source error
        source: Box<Self>,
    },
}

impl Error {
    /// Create a new error with context information
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an insufficient data error
    pub const fn insufficient(needed: usize, remaining: usize) -> Self {
        Self::InsufficientData { needed, remaining }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Extension trait for Result with core errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for core::result::Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
