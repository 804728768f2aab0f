//! Permission-gated, one-shot location reads.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{error::LocationError, model::Coordinate};

/// Requested fix quality. Providers that cannot honor it use their best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Accuracy {
    Lowest,
    Low,
    Balanced,
    High,
    #[default]
    Highest,
    BestForNavigation,
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// Ask for foreground location access. `false` means denied.
    async fn request_permission(&self) -> bool;

    /// Read the current position once.
    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinate, LocationError>;
}

/// Source of the user's answer to "may we use your location?".
#[async_trait]
pub trait PermissionPrompt: Send + Sync + Debug {
    async fn ask(&self) -> bool;
}

/// An answer given ahead of time, e.g. remembered in config.
#[derive(Debug, Clone, Copy)]
pub struct StaticConsent(pub bool);

#[async_trait]
impl PermissionPrompt for StaticConsent {
    async fn ask(&self) -> bool {
        self.0
    }
}

/// Wraps a provider: permission first, then a single position read.
#[derive(Debug)]
pub struct LocationAcquirer {
    provider: Box<dyn LocationProvider>,
    accuracy: Accuracy,
}

impl LocationAcquirer {
    pub fn new(provider: Box<dyn LocationProvider>) -> Self {
        Self { provider, accuracy: Accuracy::default() }
    }

    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub async fn acquire(&self) -> Result<Coordinate, LocationError> {
        if !self.provider.request_permission().await {
            tracing::info!("location permission denied");
            return Err(LocationError::PermissionDenied);
        }

        let coordinate = self.provider.current_position(self.accuracy).await?;
        tracing::debug!(%coordinate, "location acquired");
        Ok(coordinate)
    }
}

/// A coordinate the user typed in. Asking for it is consent enough.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    coordinate: Coordinate,
}

impl FixedLocationProvider {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn request_permission(&self) -> bool {
        true
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<Coordinate, LocationError> {
        Ok(self.coordinate)
    }
}

pub const IP_API_BASE_URL: &str = "http://ip-api.com";

/// City-level position from the public IP address.
#[derive(Debug)]
pub struct IpLocationProvider {
    http: Client,
    base_url: String,
    prompt: Box<dyn PermissionPrompt>,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocationProvider {
    pub fn new(prompt: Box<dyn PermissionPrompt>) -> Self {
        Self::with_base_url(prompt, IP_API_BASE_URL)
    }

    pub fn with_base_url(prompt: Box<dyn PermissionPrompt>, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            prompt,
        }
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn request_permission(&self) -> bool {
        self.prompt.ask().await
    }

    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinate, LocationError> {
        if accuracy > Accuracy::Low {
            tracing::debug!(?accuracy, "IP geolocation is city-level only");
        }

        let url = format!("{}/json", self.base_url);
        let res = self
            .http
            .get(&url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        if !res.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "IP geolocation returned status {}",
                res.status()
            )));
        }

        let body: IpApiResponse =
            res.json().await.map_err(|e| LocationError::Unavailable(e.to_string()))?;

        match body {
            IpApiResponse { status, lat: Some(lat), lon: Some(lon), .. } if status == "success" => {
                Ok(Coordinate::new(lat, lon))
            }
            IpApiResponse { message, .. } => Err(LocationError::Unavailable(
                message.unwrap_or_else(|| "IP geolocation failed".to_string()),
            )),
        }
    }
}
