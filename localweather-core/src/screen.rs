//! Drives one acquisition cycle and owns the state the view renders.
//!
//! A cycle walks `Idle → AcquiringLocation → LocationAcquired → FetchingWeather`
//! and ends in `WeatherReady` or `FetchFailed`, or stops early at
//! `PermissionDenied`/`LocationUnavailable`. Once the coordinate is known the
//! place lookup and the weather fetch run concurrently and each writes only its
//! own fields. A failed step leaves whatever was displayed before untouched.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::{
    condition::{self, ConditionDescriptor},
    error::{GeocodeError, LocationError},
    geocode::ReverseGeocoder,
    location::LocationAcquirer,
    model::{Coordinate, DisplayMode, MapRegion, PlaceDescriptor, PlaceLabelStyle, WeatherSnapshot},
    provider::WeatherFetcher,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    AcquiringLocation,
    PermissionDenied,
    LocationUnavailable,
    LocationAcquired,
    FetchingWeather,
    WeatherReady,
    FetchFailed,
}

impl CyclePhase {
    /// Whether a cycle in this phase has finished.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CyclePhase::Idle
                | CyclePhase::PermissionDenied
                | CyclePhase::LocationUnavailable
                | CyclePhase::WeatherReady
                | CyclePhase::FetchFailed
        )
    }
}

/// How a call to [`ScreenController::run_cycle`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was in flight; nothing was done.
    AlreadyRunning,
    PermissionDenied,
    LocationUnavailable,
    WeatherReady,
    FetchFailed,
}

/// Fields bound to the view. Starts out as placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    pub place: String,
    /// Where the device is, once known.
    pub device_coordinate: Option<Coordinate>,
    /// Where the weather API says the forecast is for.
    pub coordinate: Coordinate,
    pub temperature: i32,
    pub min_temperature: i32,
    pub max_temperature: i32,
    pub description: String,
    /// Meters. Only filled in [`DisplayMode::GroundLevel`].
    pub ground_level: i32,
    /// Only filled in [`DisplayMode::Condition`].
    pub category: Option<String>,
    pub forecast_time: Option<DateTime<Utc>>,
}

impl DisplayState {
    pub const PLACEHOLDER_PLACE: &'static str = "collecting..";

    /// Icon and gradient for the current category. `None` means render a neutral look.
    pub fn condition(&self) -> Option<&'static ConditionDescriptor> {
        self.category.as_deref().and_then(condition::lookup)
    }

    pub fn map_region(&self) -> MapRegion {
        if self.forecast_time.is_some() {
            MapRegion::centered_on(self.coordinate)
        } else {
            MapRegion::initial()
        }
    }

    fn apply_snapshot(&mut self, snapshot: WeatherSnapshot, mode: DisplayMode) {
        self.temperature = snapshot.temperature;
        self.min_temperature = snapshot.min_temperature;
        self.max_temperature = snapshot.max_temperature;
        self.description = snapshot.description;
        self.coordinate = snapshot.coordinate;
        self.forecast_time = Some(snapshot.forecast_time);

        match mode {
            DisplayMode::GroundLevel => {
                if let Some(level) = snapshot.ground_level {
                    self.ground_level = level;
                }
            }
            DisplayMode::Condition => self.category = Some(snapshot.category),
        }
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            place: Self::PLACEHOLDER_PLACE.to_string(),
            device_coordinate: None,
            coordinate: Coordinate::default(),
            temperature: 0,
            min_temperature: 0,
            max_temperature: 0,
            description: String::new(),
            ground_level: 0,
            category: None,
            forecast_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenState {
    pub phase: CyclePhase,
    pub display: DisplayState,
    /// Short message for the user about the last failed step, if any.
    pub last_error: Option<String>,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self { phase: CyclePhase::Idle, display: DisplayState::default(), last_error: None }
    }
}

/// Everything a view binds to, including values derived from the display state.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenView<'a> {
    #[serde(flatten)]
    pub state: &'a ScreenState,
    pub map_region: MapRegion,
    pub condition: Option<&'static ConditionDescriptor>,
}

impl ScreenState {
    pub fn view(&self) -> ScreenView<'_> {
        ScreenView {
            state: self,
            map_region: self.display.map_region(),
            condition: self.display.condition(),
        }
    }
}

#[derive(Debug)]
pub struct ScreenController {
    acquirer: LocationAcquirer,
    geocoder: ReverseGeocoder,
    fetcher: Box<dyn WeatherFetcher>,
    mode: DisplayMode,
    place_style: PlaceLabelStyle,
    state: watch::Sender<ScreenState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a cycle ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScreenController {
    pub fn new(
        acquirer: LocationAcquirer,
        geocoder: ReverseGeocoder,
        fetcher: Box<dyn WeatherFetcher>,
        mode: DisplayMode,
    ) -> Self {
        Self {
            acquirer,
            geocoder,
            fetcher,
            mode,
            place_style: PlaceLabelStyle::default(),
            state: watch::Sender::new(ScreenState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_place_style(mut self, style: PlaceLabelStyle) -> Self {
        self.place_style = style;
        self
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Current state, cloned.
    pub fn state(&self) -> ScreenState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<ScreenState> {
        self.state.subscribe()
    }

    /// Run one full acquisition cycle. Rejected while another one is running.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("cycle already in flight, ignoring trigger");
            return CycleOutcome::AlreadyRunning;
        }
        let _guard = InFlight(&self.in_flight);

        self.state.send_modify(|s| {
            s.phase = CyclePhase::Idle;
            s.last_error = None;
        });
        self.set_phase(CyclePhase::AcquiringLocation);

        let coordinate = match self.acquirer.acquire().await {
            Ok(coordinate) => coordinate,
            Err(err) => return self.location_failed(err),
        };

        self.state.send_modify(|s| {
            s.phase = CyclePhase::LocationAcquired;
            s.display.device_coordinate = Some(coordinate);
        });
        self.set_phase(CyclePhase::FetchingWeather);

        let ((), outcome) =
            tokio::join!(self.update_place(coordinate), self.update_weather(coordinate));
        outcome
    }

    fn set_phase(&self, phase: CyclePhase) {
        tracing::debug!(?phase, "screen phase");
        self.state.send_modify(|s| s.phase = phase);
    }

    fn location_failed(&self, err: LocationError) -> CycleOutcome {
        let (phase, outcome) = match err {
            LocationError::PermissionDenied => {
                (CyclePhase::PermissionDenied, CycleOutcome::PermissionDenied)
            }
            LocationError::Unavailable(ref reason) => {
                tracing::warn!(%reason, "could not determine location");
                (CyclePhase::LocationUnavailable, CycleOutcome::LocationUnavailable)
            }
        };

        self.state.send_modify(|s| {
            s.phase = phase;
            s.last_error = Some(err.user_message().to_string());
        });
        outcome
    }

    async fn update_place(&self, coordinate: Coordinate) {
        let place = match self.geocoder.resolve(coordinate).await {
            Ok(place) => place,
            Err(GeocodeError::Empty) => {
                tracing::warn!(%coordinate, "no place found for coordinate");
                PlaceDescriptor::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "reverse geocoding failed");
                return;
            }
        };

        let label = place.label(self.place_style);
        tracing::info!(place = %label, "place resolved");
        self.state.send_modify(|s| s.display.place = label);
    }

    async fn update_weather(&self, coordinate: Coordinate) -> CycleOutcome {
        match self.fetcher.fetch(coordinate).await {
            Ok(snapshot) => {
                tracing::info!(
                    temperature = snapshot.temperature,
                    category = %snapshot.category,
                    "weather ready"
                );
                let mode = self.mode;
                self.state.send_modify(|s| {
                    s.display.apply_snapshot(snapshot, mode);
                    s.phase = CyclePhase::WeatherReady;
                });
                CycleOutcome::WeatherReady
            }
            Err(err) => {
                tracing::warn!(error = %err, "weather fetch failed");
                self.state.send_modify(|s| {
                    s.phase = CyclePhase::FetchFailed;
                    s.last_error = Some(err.user_message().to_string());
                });
                CycleOutcome::FetchFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FetchError,
        geocode::Geocoder,
        location::{Accuracy, LocationProvider},
    };
    use async_trait::async_trait;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };
    use tokio::sync::Notify;

    const SEOUL: Coordinate = Coordinate::new(37.5665, 126.9780);

    #[derive(Debug, Default, Clone)]
    struct Calls(Arc<AtomicUsize>);

    impl Calls {
        fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug)]
    struct FakeLocation {
        granted: bool,
        reads: Calls,
    }

    #[async_trait]
    impl LocationProvider for FakeLocation {
        async fn request_permission(&self) -> bool {
            self.granted
        }

        async fn current_position(&self, _accuracy: Accuracy) -> Result<Coordinate, LocationError> {
            self.reads.hit();
            Ok(SEOUL)
        }
    }

    #[derive(Debug)]
    struct FakeGeocoder {
        places: Vec<PlaceDescriptor>,
        calls: Calls,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn reverse_geocode(
            &self,
            _coordinate: Coordinate,
        ) -> Result<Vec<PlaceDescriptor>, GeocodeError> {
            self.calls.hit();
            Ok(self.places.clone())
        }
    }

    #[derive(Debug)]
    struct FakeWeather {
        snapshot: Option<WeatherSnapshot>,
        calls: Calls,
        gate: Option<Arc<Notify>>,
        outage: Arc<AtomicBool>,
    }

    #[async_trait]
    impl WeatherFetcher for FakeWeather {
        async fn fetch(&self, _coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError> {
            self.calls.hit();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.outage.load(Ordering::SeqCst) {
                return Err(FetchError::Status { status: 503, body: "unavailable".into() });
            }
            self.snapshot
                .clone()
                .ok_or(FetchError::Status { status: 503, body: "unavailable".into() })
        }
    }

    fn seoul_snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: 21,
            min_temperature: 19,
            max_temperature: 23,
            ground_level: Some(1008),
            category: "Clear".into(),
            description: "clear sky".into(),
            coordinate: Coordinate::new(37.57, 126.98),
            forecast_time: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    fn seoul_place(street: Option<&str>) -> PlaceDescriptor {
        PlaceDescriptor {
            street: street.map(str::to_string),
            region: Some("Seoul".into()),
            ..PlaceDescriptor::default()
        }
    }

    struct Harness {
        controller: ScreenController,
        location_reads: Calls,
        geocode_calls: Calls,
        weather_calls: Calls,
        outage: Arc<AtomicBool>,
    }

    fn harness(
        granted: bool,
        places: Vec<PlaceDescriptor>,
        snapshot: Option<WeatherSnapshot>,
        mode: DisplayMode,
        gate: Option<Arc<Notify>>,
    ) -> Harness {
        let location_reads = Calls::default();
        let geocode_calls = Calls::default();
        let weather_calls = Calls::default();
        let outage = Arc::new(AtomicBool::new(false));

        let controller = ScreenController::new(
            LocationAcquirer::new(Box::new(FakeLocation { granted, reads: location_reads.clone() })),
            ReverseGeocoder::new(Box::new(FakeGeocoder { places, calls: geocode_calls.clone() })),
            Box::new(FakeWeather {
                snapshot,
                calls: weather_calls.clone(),
                gate,
                outage: outage.clone(),
            }),
            mode,
        );

        Harness { controller, location_reads, geocode_calls, weather_calls, outage }
    }

    #[tokio::test]
    async fn denied_permission_keeps_placeholders_and_skips_network() {
        let h = harness(
            false,
            vec![seoul_place(Some("Sejong-daero"))],
            Some(seoul_snapshot()),
            DisplayMode::GroundLevel,
            None,
        );

        let outcome = h.controller.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::PermissionDenied);
        let state = h.controller.state();
        assert_eq!(state.phase, CyclePhase::PermissionDenied);
        assert_eq!(state.display, DisplayState::default());
        assert_eq!(h.location_reads.count(), 0);
        assert_eq!(h.geocode_calls.count(), 0);
        assert_eq!(h.weather_calls.count(), 0);
    }

    #[tokio::test]
    async fn seoul_scenario_in_condition_mode() {
        let h = harness(
            true,
            vec![seoul_place(Some("Sejong-daero"))],
            Some(seoul_snapshot()),
            DisplayMode::Condition,
            None,
        );

        assert_eq!(h.controller.run_cycle().await, CycleOutcome::WeatherReady);

        let state = h.controller.state();
        let d = &state.display;
        assert_eq!(state.phase, CyclePhase::WeatherReady);
        assert_eq!(d.place, "Sejong-daero, Seoul");
        assert_eq!(d.device_coordinate, Some(SEOUL));
        assert_eq!(d.temperature.to_string(), "21");
        assert_eq!(d.min_temperature.to_string(), "19");
        assert_eq!(d.max_temperature.to_string(), "23");
        assert_eq!(d.category.as_deref(), Some("Clear"));
        assert_eq!(d.description, "clear sky");
        assert_eq!(d.coordinate, Coordinate::new(37.57, 126.98));
        assert_eq!(d.condition().map(|c| c.icon), Some("weather-sunny"));
        assert_eq!(d.map_region().center(), Coordinate::new(37.57, 126.98));
        // Ground level is only bound in the other mode.
        assert_eq!(d.ground_level, 0);
        assert_eq!(state.last_error, None);
    }

    #[tokio::test]
    async fn ground_level_mode_binds_altitude_not_category() {
        let h = harness(
            true,
            vec![seoul_place(Some("Sejong-daero"))],
            Some(seoul_snapshot()),
            DisplayMode::GroundLevel,
            None,
        );

        h.controller.run_cycle().await;

        let d = h.controller.state().display;
        assert_eq!(d.ground_level, 1008);
        assert_eq!(d.category, None);
        assert_eq!(d.description, "clear sky");
    }

    #[tokio::test]
    async fn unknown_category_renders_without_descriptor() {
        let mut snapshot = seoul_snapshot();
        snapshot.category = "Squall".into();
        let h = harness(true, Vec::new(), Some(snapshot), DisplayMode::Condition, None);

        assert_eq!(h.controller.run_cycle().await, CycleOutcome::WeatherReady);

        let d = h.controller.state().display;
        assert_eq!(d.category.as_deref(), Some("Squall"));
        assert!(d.condition().is_none());
    }

    // Current behavior: a missing street shows up as "null". Guarded style is the fix.
    #[tokio::test]
    async fn missing_street_renders_null_by_default() {
        let h = harness(true, vec![seoul_place(None)], Some(seoul_snapshot()), DisplayMode::GroundLevel, None);

        h.controller.run_cycle().await;
        assert_eq!(h.controller.state().display.place, "null, Seoul");
    }

    #[tokio::test]
    async fn guarded_style_drops_missing_street() {
        let h = harness(true, vec![seoul_place(None)], Some(seoul_snapshot()), DisplayMode::GroundLevel, None);
        let controller = h.controller.with_place_style(PlaceLabelStyle::Guarded);

        controller.run_cycle().await;
        assert_eq!(controller.state().display.place, "Seoul");
    }

    #[tokio::test]
    async fn empty_geocode_degrades_place_but_weather_still_lands() {
        let h = harness(true, Vec::new(), Some(seoul_snapshot()), DisplayMode::GroundLevel, None);

        assert_eq!(h.controller.run_cycle().await, CycleOutcome::WeatherReady);

        let d = h.controller.state().display;
        assert_eq!(d.place, "null, null");
        assert_eq!(d.temperature, 21);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_display_unchanged() {
        let h = harness(true, vec![seoul_place(Some("Sejong-daero"))], None, DisplayMode::Condition, None);
        let before = h.controller.state().display;

        assert_eq!(h.controller.run_cycle().await, CycleOutcome::FetchFailed);

        let state = h.controller.state();
        assert_eq!(state.phase, CyclePhase::FetchFailed);
        assert_eq!(state.display.temperature, before.temperature);
        assert_eq!(state.display.description, before.description);
        assert_eq!(state.display.coordinate, before.coordinate);
        assert_eq!(state.display.category, before.category);
        assert_eq!(state.display.map_region(), MapRegion::initial());
        assert!(state.last_error.is_some());
        assert_eq!(h.weather_calls.count(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_previously_shown_weather() {
        let h = harness(
            true,
            vec![seoul_place(Some("Sejong-daero"))],
            Some(seoul_snapshot()),
            DisplayMode::Condition,
            None,
        );

        assert_eq!(h.controller.run_cycle().await, CycleOutcome::WeatherReady);
        let shown = h.controller.state().display;

        h.outage.store(true, Ordering::SeqCst);
        assert_eq!(h.controller.run_cycle().await, CycleOutcome::FetchFailed);

        let state = h.controller.state();
        let d = &state.display;
        assert_eq!(state.phase, CyclePhase::FetchFailed);
        assert!(state.last_error.is_some());
        assert_eq!(d.temperature, 21);
        assert_eq!(d.min_temperature, 19);
        assert_eq!(d.max_temperature, 23);
        assert_eq!(d.description, "clear sky");
        assert_eq!(d.category.as_deref(), Some("Clear"));
        assert_eq!(d.coordinate, Coordinate::new(37.57, 126.98));
        assert_eq!(d.map_region().center(), Coordinate::new(37.57, 126.98));
        assert_eq!(*d, shown);
        assert_eq!(h.weather_calls.count(), 2);
    }

    #[tokio::test]
    async fn overlapping_trigger_is_rejected() {
        let gate = Arc::new(Notify::new());
        let h = harness(
            true,
            vec![seoul_place(Some("Sejong-daero"))],
            Some(seoul_snapshot()),
            DisplayMode::GroundLevel,
            Some(gate.clone()),
        );
        let mut rx = h.controller.subscribe();

        let first = h.controller.run_cycle();
        let second = async {
            rx.wait_for(|s| s.phase == CyclePhase::FetchingWeather).await.unwrap();
            let outcome = h.controller.run_cycle().await;
            gate.notify_one();
            outcome
        };

        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, CycleOutcome::WeatherReady);
        assert_eq!(second, CycleOutcome::AlreadyRunning);
        assert_eq!(h.weather_calls.count(), 1);
        assert_eq!(h.location_reads.count(), 1);
    }

    #[tokio::test]
    async fn refresh_after_completion_runs_again() {
        let h = harness(true, vec![seoul_place(Some("Sejong-daero"))], Some(seoul_snapshot()), DisplayMode::GroundLevel, None);

        assert_eq!(h.controller.run_cycle().await, CycleOutcome::WeatherReady);
        assert_eq!(h.controller.run_cycle().await, CycleOutcome::WeatherReady);
        assert_eq!(h.weather_calls.count(), 2);
        assert_eq!(h.geocode_calls.count(), 2);
    }

    #[tokio::test]
    async fn view_serializes_map_region_and_condition() {
        let h = harness(
            true,
            vec![seoul_place(Some("Sejong-daero"))],
            Some(seoul_snapshot()),
            DisplayMode::Condition,
            None,
        );
        h.controller.run_cycle().await;

        let json = serde_json::to_value(h.controller.state().view()).unwrap();

        assert_eq!(json["phase"], "weather_ready");
        assert_eq!(json["display"]["temperature"], 21);
        assert_eq!(json["map_region"]["latitude"], 37.57);
        assert_eq!(json["map_region"]["longitude_delta"], 0.0421);
        assert_eq!(json["condition"]["icon"], "weather-sunny");
        assert_eq!(json["condition"]["gradient"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn view_of_unknown_category_has_null_condition() {
        let mut state = ScreenState::default();
        state.display.category = Some("Squall".into());

        let json = serde_json::to_value(state.view()).unwrap();
        assert!(json["condition"].is_null());
        assert_eq!(json["map_region"]["latitude"], 37.78825);
    }

    #[test]
    fn initial_state_is_placeholder() {
        let state = ScreenState::default();
        assert_eq!(state.phase, CyclePhase::Idle);
        assert_eq!(state.display.place, "collecting..");
        assert_eq!(state.display.map_region(), MapRegion::initial());
        assert!(state.phase.is_terminal());
        assert!(!CyclePhase::FetchingWeather.is_terminal());
    }
}
