use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{AreaRecord, LotId},
    error::ApiError,
    protocol::{AreaListResponse, CommandEnvelope},
};
use url::Url;

use crate::{AreaQuery, AreaUpdater, CommandTransport};

/// JSON-over-HTTP backend for area listing, area updates and lot commands.
pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Self::with_client(http, server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(server_url.trim())
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        // Relative joins drop the last path segment unless it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("failed to build url for '{path}'"))
    }
}

async fn ensure_success(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => Err(api_error.into()),
        Err(_) => Err(anyhow!("server returned {status}: {body}")),
    }
}

#[async_trait]
impl AreaQuery for HttpBackend {
    async fn get_areas_by_lot(&self, lot_id: LotId) -> Result<AreaListResponse> {
        let res = self
            .http
            .get(self.endpoint("areas")?)
            .query(&[("car_park_id", lot_id.0)])
            .send()
            .await?;
        let body = ensure_success(res)
            .await?
            .json::<AreaListResponse>()
            .await
            .context("malformed area list response")?;
        Ok(body)
    }
}

#[async_trait]
impl AreaUpdater for HttpBackend {
    async fn update_area(&self, record: AreaRecord) -> Result<()> {
        let res = self
            .http
            .put(self.endpoint(&format!("areas/{}", record.id.0))?)
            .json(&record)
            .send()
            .await?;
        ensure_success(res).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandTransport for HttpBackend {
    async fn deliver(&self, envelope: CommandEnvelope) -> Result<()> {
        let res = self
            .http
            .post(self.endpoint("commands")?)
            .json(&envelope)
            .send()
            .await?;
        ensure_success(res).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
