use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::Request;
use serde_json::json;

use crate::logging::{init_logging, LogConfig, LogFormat};
use crate::routes::{build_routes, RouteDescriptor, RouteMode, RouteTable};
use crate::StaticConfig;

/// Command-line interface for static-routes
#[derive(Parser, Debug)]
#[command(name = "static-routes")]
#[command(version, about = "Build and exercise static asset routes", long_about = None)]
pub struct Cli {
    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, env = "STATIC_ROUTES_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log format: json or pretty
    #[arg(long, global = true, env = "STATIC_ROUTES_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build routes for an assets directory and print them
    Routes {
        #[command(flatten)]
        mount: MountArgs,

        /// Print the route table as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dispatch one GET request against the built routes
    Get {
        /// URL path to request, e.g. /public/app.css
        path: String,

        #[command(flatten)]
        mount: MountArgs,

        /// Value for the If-None-Match header
        #[arg(long)]
        if_none_match: Option<String>,

        /// Value for the If-Modified-Since header (HTTP date)
        #[arg(long)]
        if_modified_since: Option<String>,

        /// Write the response body to stdout
        #[arg(long, default_value_t = false)]
        body: bool,
    },
}

/// Options describing one mount. Set flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct MountArgs {
    /// Assets directory
    #[arg(short, long)]
    pub assets: Option<PathBuf>,

    /// URL prefix the assets are mounted under
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Config file (YAML, TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Always generate one route per file
    #[arg(long, default_value_t = false)]
    pub force_static: bool,

    /// Generate one route per file while under the static limit
    #[arg(long, default_value_t = false)]
    pub always_static: bool,

    /// Static route ceiling for --always-static
    #[arg(long)]
    pub static_limit: Option<usize>,

    /// Disable ETag and conditional request handling
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Serve static files without their extension
    #[arg(long, default_value_t = false)]
    pub no_extension: bool,

    /// Percent-decode wildcard request paths
    #[arg(long, default_value_t = false)]
    pub decode_uri: bool,
}

impl MountArgs {
    /// Resolve the effective configuration.
    ///
    /// # Errors
    ///
    /// Fails if the config file cannot be loaded.
    pub fn to_config(&self) -> Result<StaticConfig> {
        let mut config = match &self.config {
            Some(path) => StaticConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => StaticConfig::default(),
        };
        if let Some(assets) = &self.assets {
            config.assets = assets.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(limit) = self.static_limit {
            config.static_limit = limit;
        }
        config.force_static |= self.force_static;
        config.always_static |= self.always_static;
        config.no_cache |= self.no_cache;
        config.no_extension |= self.no_extension;
        config.decode_uri |= self.decode_uri;
        Ok(config)
    }
}

/// Parse arguments, set up logging and run the selected command.
///
/// # Errors
///
/// Any configuration, logging or route building failure.
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let log_config = LogConfig {
        log_level: cli.log_level.clone(),
        format: LogFormat::parse(&cli.log_format),
        ..LogConfig::from_env()
    };
    let _guard = init_logging(&log_config)?;
    run(cli.command).await
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Routes { mount, json } => {
            let config = mount.to_config()?;
            let routes = build_routes(&config)
                .await
                .with_context(|| format!("Failed to build routes for {}", config.assets.display()))?;
            let mode = mode_of(&routes);
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            if json {
                let listing: Vec<_> = routes
                    .iter()
                    .map(|r| json!({ "method": r.method.as_str(), "path": r.path }))
                    .collect();
                let doc = json!({
                    "assets": config.assets,
                    "prefix": config.normalized_prefix(),
                    "mode": mode.to_string(),
                    "routes": listing,
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
            } else {
                writeln!(out, "mode: {} ({} routes)", mode, routes.len())?;
                for route in &routes {
                    writeln!(out, "{} {}", route.method, route.path)?;
                }
            }
            Ok(())
        }
        Commands::Get {
            path,
            mount,
            if_none_match,
            if_modified_since,
            body,
        } => {
            let config = mount.to_config()?;
            let mut table = RouteTable::new();
            table.extend(
                build_routes(&config)
                    .await
                    .with_context(|| format!("Failed to build routes for {}", config.assets.display()))?,
            )?;

            let mut builder = Request::get(path.as_str());
            if let Some(tag) = &if_none_match {
                builder = builder.header(IF_NONE_MATCH, tag.as_str());
            }
            if let Some(date) = &if_modified_since {
                builder = builder.header(IF_MODIFIED_SINCE, date.as_str());
            }
            let request = builder
                .body(())
                .with_context(|| format!("Invalid request path '{path}'"))?;

            let response = table.dispatch(&request).await.into_response();
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            if body {
                out.write_all(response.body())?;
                return Ok(());
            }
            writeln!(out, "{}", response.status())?;
            for (name, value) in response.headers() {
                writeln!(out, "{}: {}", name, value.to_str().unwrap_or("<binary>"))?;
            }
            writeln!(out, "body: {} bytes", response.body().len())?;
            Ok(())
        }
    }
}

fn mode_of(routes: &[RouteDescriptor]) -> RouteMode {
    if routes.iter().any(RouteDescriptor::is_wildcard) {
        RouteMode::Dynamic
    } else {
        RouteMode::Static
    }
}
