use serde::{Deserialize, Serialize};

use crate::{
    domain::SearchDescriptor,
    error::{ApiException, ErrorCode},
};

/// Status code the remote uses to report success inside the envelope.
pub const SUCCESS_STATUS: u16 = 200;

/// Column name the remote understands as "name contains".
pub const NAME_LIKE_COLUMN: &str = "name$LIKE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub status: u16,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(result: T) -> Self {
        Self {
            status: SUCCESS_STATUS,
            result: Some(result),
            message: None,
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            result: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Success without a payload is accepted for mutation endpoints.
    pub fn into_status(self) -> Result<(), ApiException> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self.rejection())
        }
    }

    /// Success must carry a payload; a missing one is a rejection.
    pub fn into_result(self) -> Result<T, ApiException> {
        if !self.is_success() {
            return Err(self.rejection());
        }
        let status = self.status;
        self.result.ok_or_else(|| {
            ApiException::new(
                ErrorCode::Internal,
                status,
                "success response did not carry a result",
            )
        })
    }

    fn rejection(&self) -> ApiException {
        ApiException::new(
            ErrorCode::from_status(self.status),
            self.status,
            self.message
                .clone()
                .unwrap_or_else(|| format!("remote reported status {}", self.status)),
        )
    }
}

/// Flattens a descriptor into the query parameters of the collection endpoint.
pub fn encode_query(descriptor: &SearchDescriptor) -> Vec<(String, String)> {
    let mut params = vec![
        ("pageIndex".to_string(), descriptor.page_index.to_string()),
        ("pageSize".to_string(), descriptor.page_size.to_string()),
    ];

    // Whitespace-only filters are dropped; anything else goes out verbatim.
    if let Some(filter) = descriptor.terms.as_ref().filter(|f| !f.is_blank()) {
        let text = filter.name_contains.as_str();
        let value = if text.contains('%') {
            text.to_string()
        } else {
            format!("%{text}%")
        };
        params.push(("terms[0].column".to_string(), NAME_LIKE_COLUMN.to_string()));
        params.push(("terms[0].value".to_string(), value));
    }

    params
}
