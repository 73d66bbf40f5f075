//! gcapi CLI
//!
//! Command-line interface for the Geocaching REST API.
//!
//! # Usage
//!
//! ```bash
//! # Authorize against the staging environment
//! gcapi --staging login
//!
//! # Show a geocache with its five newest logs
//! gcapi cache GC12345 --logs 5
//!
//! # Search around a point
//! gcapi search --lat 60.17 --lon 24.94 --radius 5
//! ```

mod client;
mod output;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use gcapi_core::fields::{GeocacheField, ListField, ListTypeName, LogField, UserField};
use gcapi_core::resources::{CURRENT_USER, Expansion, SearchFilter};
use gcapi_core::{ApiEnvironment, Coordinates, TokenState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use client::ClientOptions;

#[derive(Parser)]
#[command(name = "gcapi")]
#[command(about = "Query the Geocaching REST API")]
#[command(version)]
struct Cli {
    /// Use the staging environment instead of production
    #[arg(long, global = true)]
    staging: bool,

    /// Path to the API key file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    keys: Option<PathBuf>,

    /// Keep the session in this file instead of the OS keyring
    #[arg(long, global = true, value_name = "PATH")]
    session_file: Option<PathBuf>,

    /// Print raw JSON instead of summaries
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize this client in the browser
    Login,

    /// Forget the stored session
    Logout,

    /// Show whether a session is stored and usable
    Status,

    /// Show one geocache
    Cache {
        /// Geocache reference code (e.g. GC12345)
        code: String,

        /// Number of logs to include
        #[arg(long, default_value_t = 0)]
        logs: u32,
    },

    /// Search geocaches around a point
    Search {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Radius in miles
        #[arg(long, default_value_t = 10)]
        radius: u32,

        /// Maximum number of results
        #[arg(long, default_value_t = 20)]
        take: u32,

        /// Skip geocaches found by this user
        #[arg(long)]
        exclude_found_by: Option<String>,
    },

    /// List logs of a geocache
    Logs {
        code: String,

        #[arg(long, default_value_t = 0)]
        skip: u32,

        #[arg(long, default_value_t = 20)]
        take: u32,
    },

    /// Show a user profile
    User {
        /// User reference code (defaults to the logged in user)
        reference: Option<String>,
    },

    /// List the user's pocket queries and bookmark lists
    Lists {
        /// List kinds to include
        #[arg(long, value_delimiter = ',', default_value = "pq,bm")]
        types: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = ClientOptions {
        environment: if cli.staging {
            ApiEnvironment::Staging
        } else {
            ApiEnvironment::Production
        },
        keys: cli.keys.clone(),
        session_file: cli.session_file.clone(),
    };

    match cli.command {
        Commands::Login => login(&options).await,
        Commands::Logout => logout(&options).await,
        Commands::Status => status(&options).await,
        Commands::Cache { code, logs } => show_cache(&options, &code, logs, cli.json).await,
        Commands::Search {
            lat,
            lon,
            radius,
            take,
            exclude_found_by,
        } => {
            let filter = SearchFilter {
                exclude_found_by,
                take,
                lite: true,
                ..Default::default()
            };
            search(&options, Coordinates::new(lat, lon), radius, &filter, cli.json).await
        }
        Commands::Logs { code, skip, take } => {
            show_logs(&options, &code, skip, take, cli.json).await
        }
        Commands::User { reference } => {
            show_user(&options, reference.as_deref().unwrap_or(CURRENT_USER), cli.json).await
        }
        Commands::Lists { types } => show_lists(&options, &types, cli.json).await,
    }
}

async fn login(options: &ClientOptions) -> Result<()> {
    let client = client::connect(options)?;
    client.authorize(&client::browser_presenter()).await?;
    println!("Logged in to {}", options.environment);
    Ok(())
}

async fn logout(options: &ClientOptions) -> Result<()> {
    let client = client::connect(options)?;
    client.logout().await?;
    println!("Logged out");
    Ok(())
}

async fn status(options: &ClientOptions) -> Result<()> {
    let client = client::connect(options)?;
    let authorized = client.is_authorized().await;

    println!("Environment: {}", options.environment);
    println!("API host:    {}", client.config().api_host);
    match client.state().await {
        TokenState::Unauthorized { error } => println!("Session:     unusable ({})", error),
        _ if authorized => println!("Session:     authorized"),
        _ => println!("Session:     not logged in"),
    }
    Ok(())
}

async fn show_cache(options: &ClientOptions, code: &str, logs: u32, json: bool) -> Result<()> {
    let client = client::connect(options)?;
    let expansion = Expansion::default().logs(logs, LogField::ALL);
    let cache = client
        .geocaches()
        .get(code, GeocacheField::ALL, &expansion)
        .await?;

    if json {
        return output::print_json(&cache);
    }
    println!("{}", output::geocache_details(&cache));
    Ok(())
}

async fn search(
    options: &ClientOptions,
    center: Coordinates,
    radius: u32,
    filter: &SearchFilter,
    json: bool,
) -> Result<()> {
    let client = client::connect(options)?;
    let fields = [
        GeocacheField::ReferenceCode,
        GeocacheField::Name,
        GeocacheField::Difficulty,
        GeocacheField::Terrain,
        GeocacheField::GeocacheType,
    ];
    let caches = client
        .geocaches()
        .search_radius(center, radius, &fields, filter, &Expansion::default())
        .await?;

    if json {
        return output::print_json(&caches);
    }
    for cache in &caches {
        println!("{}", output::geocache_line(cache));
    }
    println!("{} geocache(s)", caches.len());
    Ok(())
}

async fn show_logs(
    options: &ClientOptions,
    code: &str,
    skip: u32,
    take: u32,
    json: bool,
) -> Result<()> {
    let client = client::connect(options)?;
    let logs = client
        .logs()
        .geocache_logs(code, LogField::ALL, skip, take)
        .await?;

    if json {
        return output::print_json(&logs);
    }
    for log in &logs {
        println!("{}", output::log_line(log));
    }
    Ok(())
}

async fn show_user(options: &ClientOptions, reference: &str, json: bool) -> Result<()> {
    let client = client::connect(options)?;
    let user = client.users().get(reference, UserField::ALL).await?;

    if json {
        return output::print_json(&user);
    }
    println!("{}", output::user_details(&user));
    Ok(())
}

async fn show_lists(options: &ClientOptions, types: &[String], json: bool) -> Result<()> {
    let types = parse_list_types(types)?;
    let client = client::connect(options)?;
    let lists = client
        .lists()
        .user_lists(CURRENT_USER, &types, ListField::ALL, 0, 0)
        .await?;

    if json {
        return output::print_json(&lists);
    }
    for list in &lists {
        println!("{}", output::list_line(list));
    }
    Ok(())
}

fn parse_list_types(values: &[String]) -> Result<Vec<ListTypeName>> {
    values
        .iter()
        .map(|value| {
            let value = value.trim();
            match ListTypeName::ALL.iter().find(|t| t.as_str() == value) {
                Some(kind) => Ok(*kind),
                None => bail!(
                    "Unknown list type '{}' (expected one of pq, bm, il, wl, fl)",
                    value
                ),
            }
        })
        .collect()
}
