//! HTTP wrapper around the story API with a cached progress copy.

use crate::{ClientError, Result, SessionIdentity};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use starheart_types::{
    ErrorResponse, InitRequest, ProgressPatch, SessionProgress, VerifyRequest, VerifyResponse,
};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. "http://localhost:5000".
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Issues story API calls for one session.
///
/// Every successful init, fetch or update replaces the cached progress with
/// the server's response; nothing is merged locally.
pub struct StoryClient {
    http: reqwest::Client,
    base_url: Url,
    identity: SessionIdentity,
    cache: Option<SessionProgress>,
}

impl StoryClient {
    pub fn new(config: ClientConfig, identity: SessionIdentity) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url,
            identity,
            cache: None,
        })
    }

    pub fn session_id(&self) -> &str {
        self.identity.session_id()
    }

    /// Last progress received from the server.
    pub fn progress(&self) -> Option<&SessionProgress> {
        self.cache.as_ref()
    }

    /// `<base>/api/story/<segment>`, with the segment percent-encoded.
    fn url(&self, segment: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "story", segment]);
        Ok(url)
    }

    fn session_url(&self) -> Result<Url> {
        self.url(self.identity.session_id())
    }

    fn remember(&mut self, progress: SessionProgress) -> &SessionProgress {
        self.cache.insert(progress)
    }

    /// Create the session on the server, or load it if it already exists.
    pub async fn init(&mut self) -> Result<&SessionProgress> {
        let request = InitRequest {
            session_id: self.identity.session_id().to_string(),
        };
        let response = self.http.post(self.url("init")?).json(&request).send().await?;
        let progress: SessionProgress = parse(response).await?;
        Ok(self.remember(progress))
    }

    /// Load the session's progress. Returns `None` if the server has not
    /// seen this session yet.
    pub async fn fetch(&mut self) -> Result<Option<&SessionProgress>> {
        let response = self.http.get(self.session_url()?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(target: "starheart::client", "Session {} not on server yet", self.session_id());
            self.cache = None;
            return Ok(None);
        }
        let progress: SessionProgress = parse(response).await?;
        Ok(Some(self.remember(progress)))
    }

    /// Fetch the session, initializing it when the server does not know it.
    pub async fn ensure_session(&mut self) -> Result<&SessionProgress> {
        if self.fetch().await?.is_none() {
            self.init().await?;
        }
        self.cache
            .as_ref()
            .ok_or_else(|| ClientError::SessionNotFound(self.identity.session_id().to_string()))
    }

    /// Send a partial update. An unknown session is an error here, not a
    /// reason to init.
    pub async fn update(&mut self, patch: &ProgressPatch) -> Result<&SessionProgress> {
        let response = self.http.patch(self.session_url()?).json(patch).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::SessionNotFound(self.session_id().to_string()));
        }
        let progress: SessionProgress = parse(response).await?;
        Ok(self.remember(progress))
    }

    /// Ask the server whether `password` opens the final lock.
    pub async fn verify(&self, password: &str) -> Result<VerifyResponse> {
        let request = VerifyRequest {
            password: password.to_string(),
        };
        let response = self.http.post(self.url("verify")?).json(&request).send().await?;
        parse(response).await
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await?;
    let message = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(ErrorResponse {
            message,
            details: Some(details),
        }) => format!("{message}: {details}"),
        Ok(ErrorResponse { message, .. }) => message,
        Err(_) => text,
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
