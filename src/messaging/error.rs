use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadinessErrorCode {
    PermissionQueryFailed,
    PermissionRequestFailed,
    SettingsUnavailable,
    TokenFetchFailed,
    ChannelSetupFailed,
    PresentationFailed,
    SubscribeFailed,
    UnsubscribeFailed,
    ClipboardFailed,
    InvalidArgument,
}

impl ReadinessErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessErrorCode::PermissionQueryFailed => "readiness/permission-query-failed",
            ReadinessErrorCode::PermissionRequestFailed => "readiness/permission-request-failed",
            ReadinessErrorCode::SettingsUnavailable => "readiness/settings-unavailable",
            ReadinessErrorCode::TokenFetchFailed => "readiness/token-fetch-failed",
            ReadinessErrorCode::ChannelSetupFailed => "readiness/channel-setup-failed",
            ReadinessErrorCode::PresentationFailed => "readiness/presentation-failed",
            ReadinessErrorCode::SubscribeFailed => "readiness/subscribe-failed",
            ReadinessErrorCode::UnsubscribeFailed => "readiness/unsubscribe-failed",
            ReadinessErrorCode::ClipboardFailed => "readiness/clipboard-failed",
            ReadinessErrorCode::InvalidArgument => "readiness/invalid-argument",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReadinessError {
    pub code: ReadinessErrorCode,
    message: String,
}

impl ReadinessError {
    pub fn new(code: ReadinessErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ReadinessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for ReadinessError {}

pub type ReadinessResult<T> = Result<T, ReadinessError>;

pub fn permission_query_failed(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::PermissionQueryFailed, message)
}

pub fn permission_request_failed(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::PermissionRequestFailed, message)
}

pub fn settings_unavailable(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::SettingsUnavailable, message)
}

pub fn token_fetch_failed(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::TokenFetchFailed, message)
}

pub fn channel_setup_failed(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::ChannelSetupFailed, message)
}

pub fn presentation_failed(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::PresentationFailed, message)
}

pub fn subscribe_failed(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::SubscribeFailed, message)
}

pub fn unsubscribe_failed(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::UnsubscribeFailed, message)
}

pub fn clipboard_failed(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::ClipboardFailed, message)
}

pub fn invalid_argument(message: impl Into<String>) -> ReadinessError {
    ReadinessError::new(ReadinessErrorCode::InvalidArgument, message)
}
