//! # CLI Module
//!
//! Command-line front end for inspecting and exercising a mount.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Build the routes for an assets directory and print them:
//!
//! ```bash
//! static-routes routes --assets ./public --prefix /static
//! static-routes routes --config static.yaml --force-static --json
//! ```
//!
//! ### `get`
//!
//! Build the routes, dispatch a single GET and print the response:
//!
//! ```bash
//! static-routes get /static/app.css --assets ./public --prefix /static
//! static-routes get /static/app.css --assets ./public \
//!     --if-none-match '"<etag>"'
//! ```
//!
//! Mount options given on the command line override the config file.
//! `--log-level` and `--log-format` apply to every command.

mod commands;


pub use commands::{run_cli, Cli, Commands, MountArgs};
