use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} * {}", self.latitude, self.longitude)
    }
}

/// One reverse-geocoding candidate. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDescriptor {
    pub name: Option<String>,
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub subregion: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub iso_country_code: Option<String>,
    pub timezone: Option<String>,
}

/// How absent street/region fields show up in the place label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceLabelStyle {
    /// `"{street}, {region}"` with missing parts rendered as `null`.
    #[default]
    Verbatim,
    /// Missing parts become empty and the separator is dropped.
    Guarded,
}

impl PlaceDescriptor {
    pub fn label(&self, style: PlaceLabelStyle) -> String {
        match style {
            PlaceLabelStyle::Verbatim => format!(
                "{}, {}",
                self.street.as_deref().unwrap_or("null"),
                self.region.as_deref().unwrap_or("null"),
            ),
            PlaceLabelStyle::Guarded => [self.street.as_deref(), self.region.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// The nearest forecast entry for a coordinate, as reported by the weather API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// °C, rounded to the nearest integer.
    pub temperature: i32,
    pub min_temperature: i32,
    pub max_temperature: i32,
    /// Ground level in meters, when the API reports it.
    pub ground_level: Option<i32>,
    /// Coarse category such as `Clear` or `Rain`. Not guaranteed to be a known one.
    pub category: String,
    pub description: String,
    /// Canonical coordinate from the API's city metadata.
    pub coordinate: Coordinate,
    pub forecast_time: DateTime<Utc>,
}

/// Which set of fields the screen shows besides the temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// Description plus ground-level altitude.
    #[default]
    GroundLevel,
    /// Category, description and the category's icon/gradient.
    Condition,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DisplayMode::GroundLevel => "ground level",
            DisplayMode::Condition => "condition icon",
        })
    }
}

/// Region handed to a map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    pub const LATITUDE_DELTA: f64 = 0.0922;
    pub const LONGITUDE_DELTA: f64 = 0.0421;

    pub const fn centered_on(center: Coordinate) -> Self {
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
            latitude_delta: Self::LATITUDE_DELTA,
            longitude_delta: Self::LONGITUDE_DELTA,
        }
    }

    /// Region shown before anything has been fetched.
    pub const fn initial() -> Self {
        Self::centered_on(Coordinate::new(37.78825, -122.4324))
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
