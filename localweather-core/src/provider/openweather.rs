use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{FetchError, truncate_body},
    model::{Coordinate, WeatherSnapshot},
};

use super::{WeatherFetcher, round_temperature};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn fetch_forecast(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();

        tracing::debug!(%lat, %lon, "requesting OpenWeather forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("cnt", "1"),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: OwForecastResponse = serde_json::from_str(&body)?;
        parsed.into_snapshot()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    grnd_level: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: Option<i64>,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    coord: OwCoord,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

impl OwForecastResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, FetchError> {
        let entry = self.list.into_iter().next().ok_or(FetchError::NoEntries)?;

        let (category, description) = entry
            .weather
            .into_iter()
            .next()
            .map(|w| (w.main, w.description))
            .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));

        let forecast_time = entry
            .dt
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);

        Ok(WeatherSnapshot {
            temperature: round_temperature(entry.main.temp),
            min_temperature: round_temperature(entry.main.temp_min),
            max_temperature: round_temperature(entry.main.temp_max),
            ground_level: entry.main.grnd_level.map(|level| level.round() as i32),
            category,
            description,
            coordinate: Coordinate::new(self.city.coord.lat, self.city.coord.lon),
            forecast_time,
        })
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherProvider {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError> {
        self.fetch_forecast(coordinate).await
    }
}
