//! CLI application for controlling lights of every supported vendor.
//!
//! Run with: cargo run --example prism_cli -- --help

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use prism::{ApplyResult, LightDirectory, LightState, PrismConfig};

#[derive(Parser)]
#[command(name = "prism-cli")]
#[command(about = "Control LIFX and Yeelight lights by name", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover and list every light
    List,

    /// Show the cached state of a light
    Show { name: String },

    /// Change several attributes at once
    Set {
        name: String,

        #[arg(long)]
        power: Option<bool>,

        /// Brightness (0-100)
        #[arg(long)]
        brightness: Option<i64>,

        /// RGB color as "r,g,b"
        #[arg(long)]
        color: Option<prism::Color>,

        /// Color temperature in Kelvin (2500-9000)
        #[arg(long)]
        kelvin: Option<i64>,

        /// Transition time in seconds (0-3600)
        #[arg(long)]
        duration: Option<i64>,
    },

    /// Turn a light on
    On { name: String },

    /// Turn a light off
    Off { name: String },

    /// Toggle a light on/off
    Toggle { name: String },
}

fn report(name: &str, result: ApplyResult) {
    match result {
        ApplyResult::Applied(light) => match serde_json::to_string(&light.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Applied, but the state could not be printed: {}", e),
        },
        ApplyResult::NotFound => eprintln!("No light named {:?}", name),
        ApplyResult::Failed(e) => eprintln!("Failed to update {:?}: {}", name, e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PrismConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => PrismConfig::default(),
    };
    let directory = LightDirectory::from_config(&config);

    match cli.command {
        Commands::List => {
            let lights = directory.list_all_lights().await;
            if lights.is_empty() {
                println!("No lights found on the network.");
            }
            for light in lights {
                let state = light.current_state();
                println!(
                    "{:12} {:24} power={:?} brightness={:?}",
                    light.protocol().to_string(),
                    light.name(),
                    state.power(),
                    state.brightness().map(|b| b.value()),
                );
            }
        }
        Commands::Show { name } => {
            let light = directory.require_light(&name).await?;
            println!("{}", serde_json::to_string_pretty(&light.snapshot())?);
        }
        Commands::Set {
            name,
            power,
            brightness,
            color,
            kelvin,
            duration,
        } => {
            let mut desired = LightState::new();
            if let Some(power) = power {
                desired.set_power(power);
            }
            if let Some(brightness) = brightness {
                desired.set_brightness(brightness)?;
            }
            if let Some(color) = color {
                desired.set_color([
                    i64::from(color.red()),
                    i64::from(color.green()),
                    i64::from(color.blue()),
                ])?;
            }
            if let Some(kelvin) = kelvin {
                desired.set_kelvin(kelvin)?;
            }
            if let Some(duration) = duration {
                desired.set_duration(duration)?;
            }
            report(&name, directory.apply_light_state(&name, &desired).await);
        }
        Commands::On { name } => report(&name, directory.set_power(&name, true).await),
        Commands::Off { name } => report(&name, directory.set_power(&name, false).await),
        Commands::Toggle { name } => report(&name, directory.toggle_power(&name).await),
    }

    Ok(())
}
