//! Client for a hosted IPFS pinning service (Pinata-compatible API). NFT
//! images and metadata JSON are pinned here; the marketplace only ever stores
//! the resulting CIDs and gateway URLs.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PinningError {
    #[error("pinning transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("pinning service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid pinning response: {0}")]
    InvalidResponse(String),
}

/// Pinning capability, injected into the API so tests can stub the network.
#[async_trait]
pub trait PinningService: Send + Sync {
    /// Pin raw file bytes; returns the CID.
    async fn pin_file(&self, bytes: Vec<u8>, filename: &str) -> Result<String, PinningError>;
    /// Pin a JSON document; returns the CID.
    async fn pin_json(&self, value: &Value) -> Result<String, PinningError>;
    /// Re-pin an existing CID to guarantee persistence.
    async fn pin_by_hash(&self, cid: &str) -> Result<(), PinningError>;
    /// Public gateway URL for a CID.
    fn gateway_url(&self, cid: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct PinningConfig {
    pub api_url: String,
    pub jwt: String,
    pub gateway: String,
}

pub struct HttpPinningClient {
    http: Client,
    config: PinningConfig,
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl HttpPinningClient {
    pub fn new(config: PinningConfig) -> Result<Self, PinningError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, config })
    }

    async fn parse_pin_response(response: reqwest::Response) -> Result<String, PinningError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PinningError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|err| PinningError::InvalidResponse(err.to_string()))?;
        Ok(pinned.ipfs_hash)
    }
}

#[async_trait]
impl PinningService for HttpPinningClient {
    async fn pin_file(&self, bytes: Vec<u8>, filename: &str) -> Result<String, PinningError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.config.api_url))
            .bearer_auth(&self.config.jwt)
            .multipart(form)
            .send()
            .await?;
        Self::parse_pin_response(response).await
    }

    async fn pin_json(&self, value: &Value) -> Result<String, PinningError> {
        let response = self
            .http
            .post(format!("{}/pinning/pinJSONToIPFS", self.config.api_url))
            .bearer_auth(&self.config.jwt)
            .json(value)
            .send()
            .await?;
        Self::parse_pin_response(response).await
    }

    async fn pin_by_hash(&self, cid: &str) -> Result<(), PinningError> {
        let response = self
            .http
            .post(format!("{}/pinning/pinByHash", self.config.api_url))
            .bearer_auth(&self.config.jwt)
            .json(&serde_json::json!({ "hashesToPin": [cid] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PinningError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn gateway_url(&self, cid: &str) -> String {
        gateway_url(&self.config.gateway, cid)
    }
}

pub fn gateway_url(gateway: &str, cid: &str) -> String {
    format!("{}/ipfs/{cid}", gateway.trim_end_matches('/'))
}

/// SHA-256 of the uploaded content, used for duplicate/fraud detection.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}
