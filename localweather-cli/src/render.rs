use localweather_core::{
    CyclePhase, DisplayMode, ScreenState,
    condition::{self, ConditionDescriptor},
};

const NEUTRAL_ICON: &str = "weather-cloudy-alert";

/// Plain-text rendering of the screen.
pub fn screen(state: &ScreenState, mode: DisplayMode) -> String {
    let d = &state.display;

    let detail = match mode {
        DisplayMode::GroundLevel => format!("{}m", d.ground_level),
        DisplayMode::Condition => format!(
            "{}  {}",
            d.category.as_deref().unwrap_or("-"),
            descriptor(d.condition())
        ),
    };
    let region = d.map_region();

    let mut out = format!(
        concat!(
            "{place}\n{coord}\n\n",
            "  {t}°   {min}° / {max}°\n",
            "  {desc}\n",
            "  {detail}\n",
            "  map: {lat}, {lon} (±{dlat}, ±{dlon})\n",
        ),
        place = d.place,
        coord = d.coordinate,
        t = d.temperature,
        min = d.min_temperature,
        max = d.max_temperature,
        desc = d.description,
        detail = detail,
        lat = region.latitude,
        lon = region.longitude,
        dlat = region.latitude_delta,
        dlon = region.longitude_delta,
    );

    if let Some(at) = d.forecast_time {
        out.push_str(&format!("  forecast for {}\n", at.format("%Y-%m-%d %H:%M UTC")));
    }

    if let Some(note) = status_note(state) {
        out.push_str(&format!("\n{note}\n"));
    }

    out
}

fn descriptor(descriptor: Option<&ConditionDescriptor>) -> String {
    match descriptor {
        Some(c) => format!("[{}  {} → {}]", c.icon, c.gradient[0], c.gradient[1]),
        None => format!("[{NEUTRAL_ICON}]"),
    }
}

fn status_note(state: &ScreenState) -> Option<String> {
    let msg = state.last_error.as_deref()?;
    let hint = match state.phase {
        CyclePhase::PermissionDenied => " Pass --lat/--lon or set `home` in the config.",
        CyclePhase::FetchFailed => " Showing the last known values.",
        _ => "",
    };
    Some(format!("note: {msg}{hint}"))
}

/// Listing for the `conditions` subcommand.
pub fn condition_table() -> String {
    condition::categories()
        .map(|category| format!("{category:<13} {}\n", descriptor(condition::lookup(category))))
        .collect()
}
