use anyhow::{bail, Context, Result};
use rand::Rng;
use serde::Deserialize;

/// One accelerometer-style sample
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    pub fn random(rng: &mut impl Rng) -> Self {
        let spread = if rng.gen_bool(0.05) {
            100.0 // 5% outliers
        } else {
            2.0
        };

        Self {
            x: rng.gen_range(-spread..spread),
            y: rng.gen_range(-spread..spread),
            // gravity on z
            z: 9.81 + rng.gen_range(-spread..spread),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
}

/// Thin HTTP client for the ingestor API
#[derive(Debug, Clone)]
pub struct IngestorClient {
    http: reqwest::Client,
    base_url: String,
}

impl IngestorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn register(&self, name: &str) -> Result<Device> {
        let response = self
            .http
            .post(format!("{}/device", self.base_url))
            .query(&[("name", name)])
            .send()
            .await
            .context("register request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("registering {} returned {}: {}", name, status, body);
        }

        Ok(response.json().await?)
    }

    pub async fn post_sample(&self, device_id: i64, sample: Sample) -> Result<()> {
        self.http
            .post(format!("{}/device/{}/data", self.base_url, device_id))
            .query(&[("x", sample.x), ("y", sample.y), ("z", sample.z)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn analytics(&self, device_id: i64) -> Result<serde_json::Value> {
        let body = self
            .http
            .get(format!("{}/device/{}/analytics", self.base_url, device_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }
}
