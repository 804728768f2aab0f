use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use inquire::{Confirm, Password, PasswordDisplayMode, Select};
use localweather_core::{
    Config, Coordinate, DisplayMode, FixedLocationProvider, IpLocationProvider, LocationAcquirer,
    LocationProvider, NominatimGeocoder, PermissionPrompt, PlaceLabelStyle, ReverseGeocoder,
    ScreenController, StaticConsent, provider::fetcher_from_config,
};

use crate::{prompt::TerminalPrompt, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "localweather", version, about = "Weather for where you are")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and display preferences.
    Configure,

    /// Locate, geocode and show the current forecast.
    Show(ShowArgs),

    /// List the known weather categories with their icon and gradient.
    Conditions,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Latitude to use instead of detecting the location.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude to use instead of detecting the location.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// What to show besides the temperatures. Defaults to the configured mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// How missing street/region parts appear in the place name.
    #[arg(long, value_enum)]
    place_style: Option<PlaceStyleArg>,

    /// Print the screen state as JSON.
    #[arg(long)]
    json: bool,

    /// Allow the location lookup without asking.
    #[arg(long, short)]
    yes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    GroundLevel,
    Condition,
}

impl From<ModeArg> for DisplayMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::GroundLevel => DisplayMode::GroundLevel,
            ModeArg::Condition => DisplayMode::Condition,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlaceStyleArg {
    Verbatim,
    Guarded,
}

impl From<PlaceStyleArg> for PlaceLabelStyle {
    fn from(value: PlaceStyleArg) -> Self {
        match value {
            PlaceStyleArg::Verbatim => PlaceLabelStyle::Verbatim,
            PlaceStyleArg::Guarded => PlaceLabelStyle::Guarded,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure()?,
            Command::Show(args) => show(args).await?,
            Command::Conditions => print!("{}", render::condition_table()),
        }

        Ok(())
    }
}

impl ShowArgs {
    fn location_provider(&self, config: &Config) -> Box<dyn LocationProvider> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Box::new(FixedLocationProvider::new(Coordinate::new(lat, lon)));
        }

        if let Some(home) = config.home {
            tracing::debug!(%home, "using configured home coordinate");
            return Box::new(FixedLocationProvider::new(home));
        }

        let prompt: Box<dyn PermissionPrompt> = match (self.yes, config.location_consent) {
            (true, _) => Box::new(StaticConsent(true)),
            (false, Some(consent)) => Box::new(StaticConsent(consent)),
            (false, None) => Box::new(TerminalPrompt),
        };
        Box::new(IpLocationProvider::new(prompt))
    }
}

async fn show(args: ShowArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let fetcher = fetcher_from_config(&config)?;
    let geocoder = NominatimGeocoder::new().context("Failed to set up reverse geocoding")?;

    let mode = args.mode.map(DisplayMode::from).unwrap_or(config.display_mode);
    let place_style = args.place_style.map(PlaceLabelStyle::from).unwrap_or(config.place_style);

    let controller = ScreenController::new(
        LocationAcquirer::new(args.location_provider(&config)),
        ReverseGeocoder::new(Box::new(geocoder)),
        fetcher,
        mode,
    )
    .with_place_style(place_style);

    let outcome = controller.run_cycle().await;
    tracing::debug!(?outcome, "cycle finished");

    let state = controller.state();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&state.view()).context("Failed to serialize screen state")?
        );
    } else {
        print!("{}", render::screen(&state, mode));
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !key.trim().is_empty() {
        config.set_api_key(key.trim().to_string());
    }

    let consent = Confirm::new("Allow looking up your approximate location from your IP address?")
        .with_default(config.location_consent.unwrap_or(true))
        .prompt()?;
    config.location_consent = Some(consent);

    let modes = vec![DisplayMode::GroundLevel, DisplayMode::Condition];
    let start = modes.iter().position(|m| *m == config.display_mode).unwrap_or(0);
    let mode = Select::new("Show alongside the temperature:", modes)
        .with_starting_cursor(start)
        .prompt()?;
    config.display_mode = mode;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}
