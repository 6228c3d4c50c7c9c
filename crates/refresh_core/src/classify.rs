//! Maps caught failures to the short strings shown next to a job or list.

/// A failure as it reached a continuation.
///
/// `Error` carries the message of a proper error value, which may be empty.
/// `Thrown` is anything else that surfaced as a failure, such as a panic payload;
/// `None` stands for a value with no usable content at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caught {
    Error { message: String },
    Thrown(Option<String>),
}

impl Caught {
    pub fn error(message: impl Into<String>) -> Self {
        Caught::Error {
            message: message.into(),
        }
    }

    pub fn thrown(value: impl Into<String>) -> Self {
        Caught::Thrown(Some(value.into()))
    }
}

/// Which operation failed; selects the generic fallback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    StartingRefresh,
    RefreshStatus,
    LoadingMore,
}

impl ErrorContext {
    pub fn generic_message(self) -> &'static str {
        match self {
            ErrorContext::StartingRefresh => "Failed to start refresh",
            ErrorContext::RefreshStatus => "Refresh status failed",
            ErrorContext::LoadingMore => "Failed to load more",
        }
    }
}

pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed - check refresh token";
pub const SERVER_ERROR_MESSAGE: &str = "Server error - please try again later";

/// Produces the user-facing message for a failure.
///
/// Status substrings are matched anywhere in the message, so "processed 500 items"
/// also reads as a server error. Callers rely on this exact matching.
pub fn classify(caught: &Caught, context: ErrorContext) -> String {
    let message = match caught {
        Caught::Error { message } if !message.is_empty() => message,
        Caught::Error { .. } | Caught::Thrown(_) => {
            return context.generic_message().to_string();
        }
    };

    if message.contains("401") {
        AUTH_FAILED_MESSAGE.to_string()
    } else if message.contains("500") {
        SERVER_ERROR_MESSAGE.to_string()
    } else {
        message.clone()
    }
}
