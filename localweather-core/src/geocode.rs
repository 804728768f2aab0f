//! Reverse geocoding: coordinates to a human-readable place.
//! The default backend is Nominatim (OpenStreetMap), which needs no API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{
    error::{GeocodeError, truncate_body},
    model::{Coordinate, PlaceDescriptor},
};

pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("localweather/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Zero or more candidates for a coordinate, best first.
    async fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<PlaceDescriptor>, GeocodeError>;
}

/// Picks the first candidate the backend returns.
#[derive(Debug)]
pub struct ReverseGeocoder {
    backend: Box<dyn Geocoder>,
}

impl ReverseGeocoder {
    pub fn new(backend: Box<dyn Geocoder>) -> Self {
        Self { backend }
    }

    pub async fn resolve(&self, coordinate: Coordinate) -> Result<PlaceDescriptor, GeocodeError> {
        let place = self
            .backend
            .reverse_geocode(coordinate)
            .await?
            .into_iter()
            .next()
            .ok_or(GeocodeError::Empty)?;

        tracing::debug!(?place, "reverse geocoded");
        Ok(place)
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    name: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    house_number: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl From<NominatimResponse> for PlaceDescriptor {
    fn from(res: NominatimResponse) -> Self {
        let name = res.name.filter(|n| !n.is_empty());
        let Some(addr) = res.address else {
            return PlaceDescriptor { name, ..PlaceDescriptor::default() };
        };

        PlaceDescriptor {
            name,
            street: addr.road,
            street_number: addr.house_number,
            district: addr.suburb,
            city: addr.city.or(addr.town).or(addr.village),
            subregion: addr.county,
            region: addr.state,
            postal_code: addr.postcode,
            country: addr.country,
            iso_country_code: addr.country_code.map(|c| c.to_uppercase()),
            timezone: None,
        }
    }
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_base_url(NOMINATIM_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<PlaceDescriptor>, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        // Nominatim answers `{"error": "Unable to geocode"}` for open sea and the like.
        let value: serde_json::Value = serde_json::from_str(&body)?;
        if value.get("error").is_some() {
            return Ok(Vec::new());
        }

        let parsed: NominatimResponse = serde_json::from_value(value)?;
        Ok(vec![parsed.into()])
    }
}
