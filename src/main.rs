use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use skycast_core::{App, AppError, Config};
use skycast_weather::{format::title_case, DailyForecast, TemperatureUnit, Units};

const EMPTY_INPUT: &str = "Type a city name";

/// SkyCast - current weather and 7-day forecasts from the terminal
#[derive(Parser, Debug)]
#[command(name = "skycast", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Current conditions for a city (defaults to the selected city)
    Current {
        city: Option<String>,

        /// celsius, fahrenheit or kelvin
        #[arg(long, short)]
        unit: Option<TemperatureUnit>,
    },
    /// Daily forecast for a place
    Forecast { place: Option<String> },
    /// Resolve a place name to coordinates
    Geocode { place: String },
    /// Manage the selected city
    #[command(subcommand)]
    City(CityCommand),
    /// Manage favorite cities
    #[command(subcommand)]
    Fav(FavCommand),
}

#[derive(Subcommand, Debug)]
enum CityCommand {
    Set { name: String },
    Clear,
    Show,
    /// Select the city at the configured position
    Locate,
}

#[derive(Subcommand, Debug)]
enum FavCommand {
    Add { name: String },
    Remove { name: String },
    Toggle { name: String },
    List,
    Clear,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    skycast_core::init()?;

    let (config, _) = Config::load_validated()?;
    let app = App::new(config)?;

    match run(&app, cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(app: &App, command: Command) -> Result<(), AppError> {
    let store = app.store();

    match command {
        Command::Current { city, unit } => {
            let unit = app.temperature_unit(unit);
            let view = app.current_conditions(city.as_deref(), unit).await?;

            let place = match &view.country {
                Some(country) => format!("{}, {}", view.name, country),
                None => view.name.clone(),
            };
            let star = if store.is_favorite(&view.name) { " *" } else { "" };
            println!("{}{}", place, star);
            println!("  {}  {}", view.temperature_label(), view.description);
            if let Some(feels_like) = view.feels_like {
                println!("  Feels like {}{}", feels_like, unit.symbol());
            }
            if let (Some(min), Some(max)) = (view.temp_min, view.temp_max) {
                println!("  Low {}{} / High {}{}", min, unit.symbol(), max, unit.symbol());
            }
            if let Some(humidity) = view.humidity {
                println!("  Humidity {}%", humidity);
            }
            if let Some(wind) = view.wind_kmh {
                println!("  Wind {} km/h {}", wind, view.wind_direction.unwrap_or(""));
            }
            if let Some(visibility) = &view.visibility_km {
                println!("  Visibility {} km", visibility);
            }
            if let (Some(sunrise), Some(sunset)) = (&view.sunrise, &view.sunset) {
                println!("  Sunrise {} / Sunset {}", sunrise, sunset);
            }
        }
        Command::Forecast { place } => {
            let place = place
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| store.city());
            let place = if place.is_empty() {
                app.config().provider.default_city.clone()
            } else {
                place
            };

            let (found, days) = app.forecast_for(&place).await?;
            println!("{}", found.label());
            for day in &days {
                println!("  {}", forecast_line(day, app.config().provider.units));
            }
        }
        Command::Geocode { place } => {
            if place.trim().is_empty() {
                println!("{}", EMPTY_INPUT);
                return Ok(());
            }
            let found = app.weather().geocode(&place).await?;
            println!("{}  ({:.4}, {:.4})", found.label(), found.lat, found.lon);
        }
        Command::City(cmd) => match cmd {
            CityCommand::Set { name } => {
                if name.trim().is_empty() {
                    println!("{}", EMPTY_INPUT);
                    return Ok(());
                }
                store.set_city(Some(&name));
                println!("Selected {}", store.city());
            }
            CityCommand::Clear => {
                store.delete_city();
                println!("No city selected");
            }
            CityCommand::Show => print_city(&store.city()),
            CityCommand::Locate => {
                store.init_city_from_geolocation().await;
                print_city(&store.city());
            }
        },
        Command::Fav(cmd) => match cmd {
            FavCommand::Add { name } => {
                if name.trim().is_empty() {
                    println!("{}", EMPTY_INPUT);
                    return Ok(());
                }
                store.add_favorite(&name);
                println!("Saved {}", name.trim());
            }
            FavCommand::Remove { name } => {
                store.remove_favorite(&name);
                println!("Removed {}", name.trim());
            }
            FavCommand::Toggle { name } => {
                if name.trim().is_empty() {
                    println!("{}", EMPTY_INPUT);
                } else if store.toggle_favorite(&name) {
                    println!("Saved {}", name.trim());
                } else {
                    println!("Removed {}", name.trim());
                }
            }
            FavCommand::List => {
                let favorites = store.favorites();
                if favorites.is_empty() {
                    println!("No favorite cities yet");
                }
                for fav in favorites {
                    println!(
                        "{}  (added {})",
                        fav.name,
                        fav.added_at.format("%b %-d, %Y")
                    );
                }
            }
            FavCommand::Clear => {
                store.clear_favorites();
                println!("Favorites cleared");
            }
        },
    }

    Ok(())
}

fn print_city(city: &str) {
    if city.is_empty() {
        println!("No city selected");
    } else {
        println!("{}", city);
    }
}

fn forecast_line(day: &DailyForecast, units: Units) -> String {
    let symbol = match units {
        Units::Metric => "°C",
        Units::Imperial => "°F",
        Units::Standard => "K",
    };
    let description = day
        .weather
        .first()
        .map(|c| title_case(&c.description))
        .unwrap_or_default();
    let rain = day
        .precipitation_percent()
        .map(|p| format!("  {}% rain", p))
        .unwrap_or_default();

    format!(
        "{}  {:>4.0}{} / {:>4.0}{}  {}{}",
        day.local_date(),
        day.temp.max,
        symbol,
        day.temp.min,
        symbol,
        description,
        rain
    )
}
