use crate::{
    Config,
    error::FetchError,
    model::{Coordinate, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Fetches the nearest forecast entry for a coordinate.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError>;
}

/// Round to the nearest whole degree, halves away from zero (21.5 → 22, -3.5 → -4).
pub fn round_temperature(raw: f64) -> i32 {
    raw.round() as i32
}

/// Construct the weather fetcher from config, failing when no API key is available.
pub fn fetcher_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherFetcher>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: set WEATHER_KEY or run `localweather configure` and enter your API key."
        )
    })?;

    Ok(Box::new(OpenWeatherProvider::new(api_key.to_owned())))
}
