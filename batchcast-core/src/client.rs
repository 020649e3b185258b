use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{AuthError, TokenCache};
use crate::config::{Credentials, PlatformSection};
use crate::container::{ContainerError, RemoteRegistration};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} rejected with {status}: {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error(transparent)]
    Container(#[from] ContainerError),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Metadata posted when creating a media object.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    pub name: String,
    pub description: String,
    pub long_description: String,
    pub tags: Vec<String>,
}

/// Platform-assigned identity of a created media object.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaObject {
    pub id: String,
}

/// Identity of an accepted asset registration or ingest request.
#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSource {
    pub url: String,
}

/// Body for the ingest-requests endpoint: a named profile plus either a
/// master file to transcode or poster/thumbnail images to pull.
#[derive(Debug, Clone, Serialize)]
pub struct IngestRequest {
    pub profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<IngestSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<IngestSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<IngestSource>,
}

impl IngestRequest {
    pub fn master(profile: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            master: Some(IngestSource { url: url.into() }),
            poster: None,
            thumbnail: None,
        }
    }

    pub fn images(
        profile: impl Into<String>,
        poster: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            master: None,
            poster: Some(IngestSource { url: poster.into() }),
            thumbnail: Some(IngestSource {
                url: thumbnail.into(),
            }),
        }
    }
}

/// The three platform operations a row can need. The orchestrator only
/// talks to this trait, so tests run the full per-row workflow against a
/// recording mock.
#[async_trait]
pub trait VideoPlatform {
    async fn create_video(&mut self, metadata: &VideoMetadata) -> ApiResult<MediaObject>;

    async fn register_remote_asset(
        &mut self,
        video_id: &str,
        registration: &RemoteRegistration,
    ) -> ApiResult<Receipt>;

    async fn submit_ingest_request(
        &mut self,
        video_id: &str,
        request: &IngestRequest,
    ) -> ApiResult<Receipt>;
}

/// Bearer-authenticated client for the account-scoped CMS and Ingest APIs.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: Client,
    account_id: String,
    cms_base: String,
    ingest_base: String,
    tokens: TokenCache,
}

impl PlatformClient {
    pub fn new(platform: &PlatformSection, credentials: Credentials) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent("batchcast/0.1")
            .build()?;
        let tokens = TokenCache::new(http.clone(), platform.token_url.clone(), credentials);
        Ok(Self {
            http,
            account_id: platform.account_id.clone(),
            cms_base: trim_base(&platform.cms_base),
            ingest_base: trim_base(&platform.ingest_base),
            tokens,
        })
    }

    fn video_url(&self, base: &str, suffix: &str) -> String {
        format!("{base}/v1/accounts/{account}/videos{suffix}", account = self.account_id)
    }

    async fn post_json<T>(
        &mut self,
        operation: &'static str,
        url: String,
        body: &impl Serialize,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let authorization = self.tokens.authorization().await?;
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                operation,
                status,
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl VideoPlatform for PlatformClient {
    async fn create_video(&mut self, metadata: &VideoMetadata) -> ApiResult<MediaObject> {
        let url = self.video_url(&self.cms_base, "");
        self.post_json("create media object", url, metadata).await
    }

    async fn register_remote_asset(
        &mut self,
        video_id: &str,
        registration: &RemoteRegistration,
    ) -> ApiResult<Receipt> {
        let url = self.video_url(
            &self.cms_base,
            &format!("/{video_id}/{}", registration.asset_path),
        );
        self.post_json("register remote source", url, &registration.payload)
            .await
    }

    async fn submit_ingest_request(
        &mut self,
        video_id: &str,
        request: &IngestRequest,
    ) -> ApiResult<Receipt> {
        let url = self.video_url(&self.ingest_base, &format!("/{video_id}/ingest-requests"));
        self.post_json("ingest request", url, request).await
    }
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}
