use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::info;

use oewg_ternary::config::Config;
use oewg_ternary::context::AppContext;
use oewg_ternary::db::models::Dataset;
use oewg_ternary::db::Database;
use oewg_ternary::output::terminal;
use oewg_ternary::pipeline::{centroid_plot, item_plot};

/// OEWG ternary: where do words and countries sit between the US-like,
/// Russia-like and middle-ground voting blocs?
///
/// Loads the OEWG analysis tables into SQLite and builds the item plot and
/// the amplified centroid plot from them.
#[derive(Parser)]
#[command(name = "oewg-ternary", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Import analysis tables from a JSON export
    Import {
        /// Path to the JSON file
        file: String,
    },

    /// Show items positioned by their raw bloc shares
    Items {
        /// Only show items whose label or id contains this text
        #[arg(long)]
        search: Option<String>,

        /// Smallest bubble size in pixels
        #[arg(long)]
        min_size: Option<f64>,

        /// Largest bubble size in pixels
        #[arg(long)]
        max_size: Option<f64>,

        /// Bubble size scaling power (1 = linear)
        #[arg(long)]
        scaling_power: Option<f64>,

        /// Max rows to print (default: 25)
        #[arg(long, default_value = "25")]
        limit: usize,

        /// Print the full plot as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show amplified group and country centroids
    Centroids {
        /// Amplification power, 1.0 to 3.0
        #[arg(long)]
        power: Option<f64>,

        /// Country ids to plot (repeatable or comma-separated)
        #[arg(long = "country", value_delimiter = ',')]
        countries: Vec<String>,

        /// Print the full plot as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List countries available for the centroid plot
    Countries,

    /// Show system status (DB size, table counts, last import)
    Status,

    /// Serve the plots as a JSON API
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (defaults to PORT or 3000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("oewg_ternary=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing database...");
            let config = Config::load()?;
            let db = oewg_ternary::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: oewg-ternary import <export.json>");
        }

        Commands::Import { file } => {
            let config = Config::load()?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {file}"))?;
            let dataset: Dataset =
                serde_json::from_str(&raw).with_context(|| format!("Failed to parse {file}"))?;

            let db = oewg_ternary::db::initialize_sqlite(&config.db_path)?;
            println!("Importing {} rows from {}...", dataset.row_count(), file);

            let pb = ProgressBar::new(dataset.row_count());
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Import [{bar:30}] {pos}/{len} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let summary = db.import_dataset(&dataset, &|n: u64| pb.inc(n)).await?;
            pb.finish_and_clear();

            let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
            db.set_app_state("last_import_at", &now).await?;
            db.set_app_state("last_import_source", &file).await?;

            for (table, n) in &summary.tables {
                if *n > 0 {
                    println!("  {} {:<48} {:>8}", "✓".green(), table, n);
                }
            }
            println!("\n{} {} rows imported", "✓".green().bold(), summary.total());
        }

        Commands::Items {
            search,
            min_size,
            max_size,
            scaling_power,
            limit,
            json,
        } => {
            let (_db, ctx) = load_context().await?;
            let request = item_plot::ItemPlotRequest {
                search,
                min_size,
                max_size,
                scaling_power,
            };
            let view = item_plot::run(&ctx, &request);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                terminal::display_item_plot(&view, limit);
            }
        }

        Commands::Centroids {
            power,
            countries,
            json,
        } => {
            let (_db, ctx) = load_context().await?;
            let request = centroid_plot::CentroidPlotRequest { power, countries };
            let view = centroid_plot::run(&ctx, &request);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                terminal::display_centroid_plot(&view);
            }
        }

        Commands::Countries => {
            let (_db, ctx) = load_context().await?;
            terminal::display_country_options(&ctx.country_options);
        }

        Commands::Status => {
            let config = Config::load()?;
            if !std::path::Path::new(&config.db_path).exists() {
                println!("Database: not initialized");
                println!("\nRun `oewg-ternary init` to set up the database.");
                return Ok(());
            }
            let db = oewg_ternary::db::open_sqlite(&config.db_path)?;
            oewg_ternary::status::show(&db, &config).await?;
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let (_db, ctx) = load_context().await?;
            let port = port.unwrap_or(ctx.config.port);
            oewg_ternary::web::run_server(ctx, port, &bind).await?;
        }
    }

    Ok(())
}

/// Open the database and build the shared read-only context.
async fn load_context() -> Result<(Arc<dyn Database>, AppContext)> {
    let config = Config::load()?;
    config.require_database()?;
    let db = oewg_ternary::db::open_sqlite(&config.db_path)?;
    let ctx = AppContext::load(db.as_ref(), config).await?;
    Ok((db, ctx))
}
