//! Stellar - Development Tools

use clap::{Parser, Subcommand};
use stellar_core::catalog::{Catalog, FacilityLevels};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stellar-tools")]
#[command(about = "Development tools for the Stellar catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a catalog file
    Validate {
        /// Path to the catalog
        #[arg(default_value = "crates/stellar_core/data/catalog.ron")]
        path: String,
    },
    /// Print cost and build time per level
    Costs {
        /// Object machine name
        machine_name: String,
        /// Number of levels (or units) to list
        #[arg(long, default_value_t = 10)]
        levels: u32,
        /// Robotics factory level
        #[arg(long, default_value_t = 0)]
        robotics: u32,
        /// Nanite factory level
        #[arg(long, default_value_t = 0)]
        nanite: u32,
        /// Shipyard level
        #[arg(long, default_value_t = 0)]
        shipyard: u32,
        /// Research lab level
        #[arg(long, default_value_t = 0)]
        lab: u32,
        /// Economy speed
        #[arg(long, default_value_t = 1)]
        speed: u32,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating catalog: {path}");
            match stellar_tools::validate::validate_catalog_file(std::path::Path::new(&path)) {
                Ok(report) => {
                    for (category, count) in &report.counts {
                        tracing::info!("{category}: {count} objects");
                    }
                    for warning in &report.warnings {
                        tracing::warn!("{warning}");
                    }
                    if report.is_clean() {
                        tracing::info!("Validation passed");
                    } else {
                        tracing::error!("Validation found {} problem(s)", report.warnings.len());
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Costs {
            machine_name,
            levels,
            robotics,
            nanite,
            shipyard,
            lab,
            speed,
        } => {
            let facilities = FacilityLevels {
                robotics,
                nanite,
                shipyard,
                research_lab: lab,
            };
            let table = Catalog::standard()
                .map_err(stellar_tools::ToolError::from)
                .and_then(|catalog| {
                    stellar_tools::costs::cost_table(
                        &catalog,
                        &machine_name,
                        levels,
                        &facilities,
                        speed,
                    )
                });
            match table {
                Ok(rows) => print!("{}", stellar_tools::costs::render_table(&rows)),
                Err(e) => {
                    tracing::error!("Cannot list costs: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
