//! Core library for the `localweather` screen.
//!
//! This crate defines:
//! - Location acquisition behind a permission check
//! - Reverse geocoding of the device coordinate to a place label
//! - Fetching the nearest forecast entry from OpenWeather
//! - The static weather-category → icon/gradient table
//! - A screen controller sequencing all of the above into display state
//! - Configuration & credentials handling
//!
//! It is used by `localweather-cli`, but any other front end can drive the
//! [`ScreenController`] and render its [`ScreenState`].

pub mod condition;
pub mod config;
pub mod error;
pub mod geocode;
pub mod location;
pub mod model;
pub mod provider;
pub mod screen;

pub use condition::ConditionDescriptor;
pub use config::Config;
pub use error::{FetchError, GeocodeError, LocationError};
pub use geocode::{Geocoder, NominatimGeocoder, ReverseGeocoder};
pub use location::{
    Accuracy, FixedLocationProvider, IpLocationProvider, LocationAcquirer, LocationProvider,
    PermissionPrompt, StaticConsent,
};
pub use model::{
    Coordinate, DisplayMode, MapRegion, PlaceDescriptor, PlaceLabelStyle, WeatherSnapshot,
};
pub use provider::{WeatherFetcher, openweather::OpenWeatherProvider};
pub use screen::{
    CycleOutcome, CyclePhase, DisplayState, ScreenController, ScreenState, ScreenView,
};
