//! Registration errors

use contracts::PlatformError;
use thiserror::Error;

/// Why an adapter could not be registered
///
/// Never fatal to a session: the adapter stays unregistered and its header
/// is marked disabled.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// Sensor or radio not present on the device
    #[error("{tag}: capability absent: {what}")]
    CapabilityAbsent { tag: String, what: String },

    /// The OS denied access
    #[error("{tag}: permission denied: {permission}")]
    PermissionDenied { tag: String, permission: String },

    /// The platform subscription call failed
    #[error("{tag}: subscription failed: {message}")]
    SubscriptionFailed { tag: String, message: String },
}

impl RegistrationError {
    pub fn capability_absent(tag: impl Into<String>, what: impl Into<String>) -> Self {
        Self::CapabilityAbsent {
            tag: tag.into(),
            what: what.into(),
        }
    }

    /// Map a platform subscription error for the adapter `tag`
    pub fn from_platform(tag: impl Into<String>, err: PlatformError) -> Self {
        let tag = tag.into();
        match err {
            PlatformError::PermissionDenied { permission } => {
                Self::PermissionDenied { tag, permission }
            }
            PlatformError::Unsupported { what } => Self::CapabilityAbsent { tag, what },
            PlatformError::Failed { message } => Self::SubscriptionFailed { tag, message },
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Short label used in metrics and status output
    pub fn label(&self) -> &'static str {
        match self {
            Self::CapabilityAbsent { .. } => "capability_absent",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::SubscriptionFailed { .. } => "subscription_failed",
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, RegistrationError>;
