use std::fmt;

/// Convenience result type used across the crate.
pub type TvgResult<T> = Result<T, TvgError>;

/// Failure category derived from an engine result code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The call received an argument the engine refuses.
    InvalidArguments,
    /// The engine was not in a state that allows the call.
    PreconditionNotMet,
    /// The engine could not allocate memory.
    AllocationFailure,
    /// The engine detected corrupted internal state.
    InternalCorruption,
    /// The operation or payload format is not supported by this engine build.
    Unsupported,
    /// Unknown failure, including result codes this crate does not recognize.
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidArguments => "invalid arguments",
            Self::PreconditionNotMet => "precondition not met",
            Self::AllocationFailure => "allocation failure",
            Self::InternalCorruption => "internal corruption",
            Self::Unsupported => "unsupported",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Raw result codes returned by the engine's C-style API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    InvalidArguments = 1,
    InsufficientCondition = 2,
    FailedAllocation = 3,
    MemoryCorruption = 4,
    NonSupport = 5,
    Unknown = 255,
}

impl ResultCode {
    /// Decode a raw integer result. Codes outside the known set decode as [`ResultCode::Unknown`].
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::InvalidArguments,
            2 => Self::InsufficientCondition,
            3 => Self::FailedAllocation,
            4 => Self::MemoryCorruption,
            5 => Self::NonSupport,
            _ => Self::Unknown,
        }
    }

    /// Return the failure category, or `None` for [`ResultCode::Success`].
    pub fn category(self) -> Option<ErrorCategory> {
        match self {
            Self::Success => None,
            Self::InvalidArguments => Some(ErrorCategory::InvalidArguments),
            Self::InsufficientCondition => Some(ErrorCategory::PreconditionNotMet),
            Self::FailedAllocation => Some(ErrorCategory::AllocationFailure),
            Self::MemoryCorruption => Some(ErrorCategory::InternalCorruption),
            Self::NonSupport => Some(ErrorCategory::Unsupported),
            Self::Unknown => Some(ErrorCategory::Unknown),
        }
    }
}

/// Top-level error taxonomy used by engine bindings and the playback core.
#[derive(thiserror::Error, Debug)]
pub enum TvgError {
    /// A binding call returned a non-success result code.
    #[error("engine error: {op} failed: {category} (code {code})")]
    Engine {
        /// Name of the failing engine operation.
        op: &'static str,
        /// Category of the failure.
        category: ErrorCategory,
        /// Raw result code as returned by the engine.
        code: i32,
    },

    /// The engine refused to create an animation from the payload.
    #[error("creation error: {0}")]
    Creation(String),

    /// Loading an animation instance failed; the partially-created state was released.
    #[error("load error: {op}: {source}")]
    Load {
        /// Step of the load sequence that failed.
        op: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<TvgError>,
    },

    /// Engine lifecycle misuse (not initialized, not ready, instances still alive).
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Invalid caller-provided values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TvgError {
    /// Build a [`TvgError::Engine`] value from a category.
    pub fn engine(op: &'static str, category: ErrorCategory) -> Self {
        let code = match category {
            ErrorCategory::InvalidArguments => ResultCode::InvalidArguments,
            ErrorCategory::PreconditionNotMet => ResultCode::InsufficientCondition,
            ErrorCategory::AllocationFailure => ResultCode::FailedAllocation,
            ErrorCategory::InternalCorruption => ResultCode::MemoryCorruption,
            ErrorCategory::Unsupported => ResultCode::NonSupport,
            ErrorCategory::Unknown => ResultCode::Unknown,
        };
        Self::Engine {
            op,
            category,
            code: code as i32,
        }
    }

    /// Build a [`TvgError::Creation`] value.
    pub fn creation(msg: impl Into<String>) -> Self {
        Self::Creation(msg.into())
    }

    /// Wrap `source` as a [`TvgError::Load`] failure of step `op`.
    pub fn load(op: &'static str, source: TvgError) -> Self {
        Self::Load {
            op,
            source: Box::new(source),
        }
    }

    /// Build a [`TvgError::Lifecycle`] value.
    pub fn lifecycle(msg: impl Into<String>) -> Self {
        Self::Lifecycle(msg.into())
    }

    /// Build a [`TvgError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Native failure category, looking through [`TvgError::Load`] wrappers.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Engine { category, .. } => Some(*category),
            Self::Load { source, .. } => source.category(),
            _ => None,
        }
    }
}

/// Translate a raw engine result into `Ok(())` or a [`TvgError::Engine`] naming `op`.
pub fn check(code: i32, op: &'static str) -> TvgResult<()> {
    match ResultCode::from_raw(code).category() {
        None => Ok(()),
        Some(category) => Err(TvgError::Engine { op, category, code }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            TvgError::creation("x")
                .to_string()
                .contains("creation error:")
        );
        assert!(
            TvgError::lifecycle("x")
                .to_string()
                .contains("lifecycle error:")
        );
        assert!(
            TvgError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        let e = TvgError::engine("Canvas Draw", ErrorCategory::AllocationFailure);
        assert_eq!(
            e.to_string(),
            "engine error: Canvas Draw failed: allocation failure (code 3)"
        );
    }

    #[test]
    fn check_maps_every_code() {
        assert!(check(0, "op").is_ok());
        let cases = [
            (1, ErrorCategory::InvalidArguments),
            (2, ErrorCategory::PreconditionNotMet),
            (3, ErrorCategory::AllocationFailure),
            (4, ErrorCategory::InternalCorruption),
            (5, ErrorCategory::Unsupported),
            (255, ErrorCategory::Unknown),
            (42, ErrorCategory::Unknown),
            (-1, ErrorCategory::Unknown),
        ];
        for (code, want) in cases {
            let err = check(code, "Picture Load").unwrap_err();
            assert_eq!(err.category(), Some(want), "code {code}");
            assert!(err.to_string().contains("Picture Load"));
        }
    }

    #[test]
    fn load_keeps_category_and_source() {
        let inner = TvgError::engine("Picture Get Size", ErrorCategory::InvalidArguments);
        let err = TvgError::load("read metadata", inner);
        assert_eq!(err.category(), Some(ErrorCategory::InvalidArguments));
        let msg = err.to_string();
        assert!(msg.contains("read metadata"));
        assert!(msg.contains("Picture Get Size"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = TvgError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
        assert_eq!(err.category(), None);
    }
}
