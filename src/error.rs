//! Error handling for Anchora
//!
//! Every initialization precondition maps onto one category of this
//! taxonomy, and every category carries a user-facing recovery hint so
//! the surrounding application can show a titled banner with a retry
//! action without inspecting the error itself.

use thiserror::Error;

/// Result type alias for Anchora operations
pub type Result<T> = std::result::Result<T, ArError>;

/// Main error type for Anchora operations
#[derive(Error, Debug)]
pub enum ArError {
    // Precondition failures, in the order initialize() checks them
    #[error("this device cannot create a graphics context")]
    Capability,

    #[error("required asset is missing: {resource}")]
    Validation { resource: String },

    #[error("tracking engine never became ready (waited {waited_ms} ms)")]
    Library { waited_ms: u64 },

    #[error("camera access was denied")]
    Permission,

    #[error("no camera device was found")]
    CameraNotFound,

    #[error("the camera is already in use by another application")]
    CameraInUse,

    #[error("tracking engine initialization failed: {reason}")]
    Initialization { reason: String },

    #[error("{reason}")]
    Unknown { reason: String },
}

/// Stable category tags for the error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Capability,
    Validation,
    Library,
    Permission,
    NotFound,
    InUse,
    Initialization,
    Unknown,
}

impl ErrorKind {
    /// Stable string tag for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Capability => "capability",
            ErrorKind::Validation => "validation",
            ErrorKind::Library => "library",
            ErrorKind::Permission => "permission",
            ErrorKind::NotFound => "not-found",
            ErrorKind::InUse => "in-use",
            ErrorKind::Initialization => "initialization",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ArError {
    /// Get the taxonomy category for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArError::Capability => ErrorKind::Capability,
            ArError::Validation { .. } => ErrorKind::Validation,
            ArError::Library { .. } => ErrorKind::Library,
            ArError::Permission => ErrorKind::Permission,
            ArError::CameraNotFound => ErrorKind::NotFound,
            ArError::CameraInUse => ErrorKind::InUse,
            ArError::Initialization { .. } => ErrorKind::Initialization,
            ArError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Title for the error banner shown by the host application
    pub fn banner_title(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Capability => "Device Not Supported",
            ErrorKind::Validation => "Missing Content",
            ErrorKind::Library => "Tracking Unavailable",
            ErrorKind::Permission => "Camera Access Needed",
            ErrorKind::NotFound => "No Camera Found",
            ErrorKind::InUse => "Camera Busy",
            ErrorKind::Initialization => "Could Not Start AR",
            ErrorKind::Unknown => "Something Went Wrong",
        }
    }

    /// Category-specific recovery hint shown next to the retry action
    pub fn recovery_hint(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Capability => "Try a device or browser with 3D graphics support.",
            ErrorKind::Validation => {
                "The experience content did not load. Check your connection and retry."
            }
            ErrorKind::Library => {
                "The tracking engine took too long to load. Reload and try again."
            }
            ErrorKind::Permission => "Allow camera access in your browser settings, then retry.",
            ErrorKind::NotFound => "Connect a camera, or try a device that has one.",
            ErrorKind::InUse => "Close other apps using the camera, then retry.",
            ErrorKind::Initialization => {
                "Starting the AR engine failed. Reload the page and try again."
            }
            ErrorKind::Unknown => "An unexpected error occurred. Please retry.",
        }
    }
}

/// Typed outcome of session initialization
///
/// Initialization never propagates an `Err` across the controller
/// boundary; failures are carried here so the caller can decide how to
/// present them.
#[derive(Debug)]
pub struct InitOutcome {
    /// Whether all preconditions passed and the session is ready
    pub success: bool,

    /// The failure that short-circuited the chain, if any
    pub error: Option<ArError>,
}

impl InitOutcome {
    /// Successful outcome
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Failed outcome carrying the classified error
    pub fn failed(error: ArError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }

    /// Category of the carried error, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(ArError::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_tags() {
        assert_eq!(ArError::Capability.kind().as_str(), "capability");
        assert_eq!(
            ArError::Validation {
                resource: "assets/targets/postcard.mind".to_string()
            }
            .kind()
            .as_str(),
            "validation"
        );
        assert_eq!(
            ArError::Library { waited_ms: 5000 }.kind().as_str(),
            "library"
        );
        assert_eq!(ArError::Permission.kind().as_str(), "permission");
        assert_eq!(ArError::CameraNotFound.kind().as_str(), "not-found");
        assert_eq!(ArError::CameraInUse.kind().as_str(), "in-use");
    }

    #[test]
    fn test_every_category_has_a_hint() {
        let errors = [
            ArError::Capability,
            ArError::Validation {
                resource: "x".to_string(),
            },
            ArError::Library { waited_ms: 0 },
            ArError::Permission,
            ArError::CameraNotFound,
            ArError::CameraInUse,
            ArError::Initialization {
                reason: "bad target".to_string(),
            },
            ArError::Unknown {
                reason: "?".to_string(),
            },
        ];
        for err in errors {
            assert!(!err.recovery_hint().is_empty());
            assert!(!err.banner_title().is_empty());
        }
    }

    #[test]
    fn test_init_outcome() {
        let ok = InitOutcome::ok();
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = InitOutcome::failed(ArError::Permission);
        assert!(!failed.success);
        assert_eq!(failed.error_kind(), Some(ErrorKind::Permission));
    }
}
