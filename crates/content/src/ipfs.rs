//! IPFS HTTP API client.

use crate::errors::{ContentError, Result};
use crate::store::ContentStore;
use async_trait::async_trait;
use fileguard_types::Fingerprint;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_IPFS_API: &str = "http://127.0.0.1:5001";

/// Content store backed by an IPFS node's `/api/v0` endpoints.
#[derive(Clone, Debug)]
pub struct IpfsContentStore {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsContentStore {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ContentError::Transport(format!("build http client: {err}")))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/v0/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Check that the node answers `/api/v0/version`.
    pub async fn ping(&self) -> Result<()> {
        let response = self.client.post(self.endpoint("version")).send().await?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ContentError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ContentStore for IpfsContentStore {
    async fn store(&self, bytes: &[u8]) -> Result<Fingerprint> {
        let form = Form::new().part("file", Part::bytes(bytes.to_vec()).file_name("upload"));
        let response = self
            .client
            .post(self.endpoint("add?pin=true"))
            .multipart(form)
            .send()
            .await?;
        let added: AddResponse = check_status(response).await?.json().await?;

        let fingerprint = Fingerprint::new(added.hash)
            .map_err(|err| ContentError::InvalidResponse(format!("add returned {err}")))?;
        debug!("ipfs add -> {}", fingerprint);
        Ok(fingerprint)
    }

    async fn fetch(&self, fingerprint: &Fingerprint) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint("cat"))
            .query(&[("arg", fingerprint.as_str())])
            .send()
            .await?;
        let response = match check_status(response).await {
            Err(ContentError::Status { status: 404, .. }) => {
                return Err(ContentError::NotFound(fingerprint.to_string()))
            }
            other => other?,
        };
        Ok(response.bytes().await?.to_vec())
    }
}
