use async_trait::async_trait;
pub use reqwest::StatusCode;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{DeviceId, GroupDraft, GroupId, GroupPage, SearchDescriptor},
    error::ApiException,
    protocol::{encode_query, ResponseEnvelope},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Header the remote reads the session token from.
pub const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("remote rejected request: {0}")]
    Rejected(#[from] ApiException),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Http(StatusCode),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base url '{0}' cannot carry a path")]
    OpaqueBaseUrl(Url),
    #[error("group id {0:?} cannot be used as a path segment")]
    InvalidGroupId(String),
}

impl ClientError {
    /// True when the remote answered and said no, as opposed to the request
    /// never completing.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Remote collection and mutation endpoints for device groups.
#[async_trait]
pub trait GroupApi: Send + Sync {
    async fn list(&self, descriptor: &SearchDescriptor) -> Result<GroupPage, ClientError>;
    async fn save(&self, draft: &GroupDraft) -> Result<(), ClientError>;
    async fn remove(&self, group_id: &GroupId) -> Result<(), ClientError>;
    async fn unbind(&self, group_id: &GroupId, device_ids: &[DeviceId])
        -> Result<(), ClientError>;
    async fn unbind_all(&self, group_id: &GroupId) -> Result<(), ClientError>;
}

pub struct HttpGroupApi {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpGroupApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(&format!("{trimmed}/"))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::OpaqueBaseUrl(base_url));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            access_token: None,
        })
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// `device/group/{id}/{suffix..}` with the id escaped as a single segment.
    fn group_endpoint(&self, group_id: &GroupId, suffix: &[&str]) -> Result<Url, ClientError> {
        let id = group_id.as_str();
        // The url crate silently drops "." and ".." segments.
        if id.is_empty() || id == "." || id == ".." {
            return Err(ClientError::InvalidGroupId(id.to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::OpaqueBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["device", "group", id])
            .extend(suffix);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.header(ACCESS_TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn read_envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ResponseEnvelope<T>, ClientError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        match serde_json::from_slice::<ResponseEnvelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            // Gateways in front of the remote answer errors without an envelope.
            Err(_) if !status.is_success() => Err(ClientError::Http(status)),
            Err(err) => Err(ClientError::Decode(err)),
        }
    }

    async fn expect_status(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let envelope: ResponseEnvelope<serde_json::Value> = self.read_envelope(request).await?;
        envelope.into_status()?;
        Ok(())
    }
}

#[async_trait]
impl GroupApi for HttpGroupApi {
    async fn list(&self, descriptor: &SearchDescriptor) -> Result<GroupPage, ClientError> {
        let url = self.endpoint("device/group/_query")?;
        let query = encode_query(descriptor);
        debug!(%url, page_index = descriptor.page_index, page_size = descriptor.page_size, "listing device groups");
        let envelope: ResponseEnvelope<GroupPage> =
            self.read_envelope(self.http.get(url).query(&query)).await?;
        Ok(envelope.into_result()?)
    }

    async fn save(&self, draft: &GroupDraft) -> Result<(), ClientError> {
        let url = self.endpoint("device/group")?;
        debug!(%url, create = draft.is_create(), "saving device group");
        self.expect_status(self.http.patch(url).json(draft)).await
    }

    async fn remove(&self, group_id: &GroupId) -> Result<(), ClientError> {
        let url = self.group_endpoint(group_id, &[])?;
        debug!(%url, "removing device group");
        self.expect_status(self.http.delete(url)).await
    }

    async fn unbind(
        &self,
        group_id: &GroupId,
        device_ids: &[DeviceId],
    ) -> Result<(), ClientError> {
        let url = self.group_endpoint(group_id, &["_unbind"])?;
        debug!(%url, devices = device_ids.len(), "unbinding devices from group");
        self.expect_status(self.http.post(url).json(device_ids)).await
    }

    async fn unbind_all(&self, group_id: &GroupId) -> Result<(), ClientError> {
        let url = self.group_endpoint(group_id, &["_unbind", "all"])?;
        debug!(%url, "unbinding all devices from group");
        self.expect_status(self.http.post(url)).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
