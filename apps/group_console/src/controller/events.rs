//! Backend events and error modeling for the group controller.

use client_core::ClientError;
use shared::{
    domain::{GroupPage, SearchDescriptor},
    error::ApiError,
};

use crate::backend_bridge::commands::MutationOp;

#[derive(Debug, Clone)]
pub enum UiEvent {
    Info(String),
    PageLoaded {
        generation: u64,
        page: GroupPage,
    },
    PageFailed {
        generation: u64,
        error: UiError,
    },
    MutationSettled {
        op: MutationOp,
        refresh: SearchDescriptor,
        result: Result<(), UiError>,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    /// The remote answered with a non-success status.
    Rejected,
    Auth,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    FetchPage,
    Mutation,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
        {
            UiErrorCategory::Auth
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("network")
            || lower.contains("transport")
            || lower.contains("unavailable")
            || lower.contains("runtime")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Rejected(rejection) => {
                let api_error = ApiError::from(rejection.clone());
                return Self::rejected(context, &api_error);
            }
            ClientError::Http(status) if status.as_u16() == 401 || status.as_u16() == 403 => {
                UiErrorCategory::Auth
            }
            ClientError::Transport(_) | ClientError::Http(_) => UiErrorCategory::Transport,
            ClientError::Decode(_)
            | ClientError::InvalidUrl(_)
            | ClientError::OpaqueBaseUrl(_)
            | ClientError::InvalidGroupId(_) => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn rejected(context: UiErrorContext, api_error: &ApiError) -> Self {
        Self {
            category: UiErrorCategory::Rejected,
            context,
            message: api_error.message.clone(),
        }
    }

    /// Rejections leave the last good state in place without a user-facing
    /// error; everything else gets a generic failure notice.
    pub fn is_rejection(&self) -> bool {
        self.category == UiErrorCategory::Rejected
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::{ApiException, ErrorCode};

    #[test]
    fn rejection_keeps_remote_message() {
        let err = ClientError::Rejected(ApiException::new(ErrorCode::Internal, 500, "in use"));
        let ui = UiError::from_client_error(UiErrorContext::Mutation, &err);
        assert!(ui.is_rejection());
        assert_eq!(ui.message(), "in use");
        assert_eq!(ui.context(), UiErrorContext::Mutation);
    }

    #[test]
    fn gateway_status_is_transport() {
        let err = ClientError::Http(reqwest_status(502));
        let ui = UiError::from_client_error(UiErrorContext::FetchPage, &err);
        assert_eq!(ui.category(), UiErrorCategory::Transport);
        assert!(!ui.is_rejection());
    }

    #[test]
    fn unauthorized_http_status_is_auth() {
        let err = ClientError::Http(reqwest_status(401));
        let ui = UiError::from_client_error(UiErrorContext::FetchPage, &err);
        assert_eq!(ui.category(), UiErrorCategory::Auth);
    }

    #[test]
    fn startup_message_is_classified_as_transport() {
        let ui = UiError::from_message(
            UiErrorContext::BackendStartup,
            "backend worker startup failure: failed to build runtime: os error",
        );
        assert_eq!(ui.category(), UiErrorCategory::Transport);
    }

    fn reqwest_status(code: u16) -> client_core::StatusCode {
        client_core::StatusCode::from_u16(code).expect("status")
    }
}
