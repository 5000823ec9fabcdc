//! # static-routes
//!
//! **static-routes** turns a directory of static assets into HTTP route
//! descriptors that an external dispatcher can mount, with content-hash
//! ETags and conditional GET handling.
//!
//! ## Overview
//!
//! Given a [`StaticConfig`], [`build_routes`] produces one of two shapes:
//!
//! - **Static mode**: one `GET` route per file. Each file is hashed once at
//!   build time, so `If-None-Match` requests are answered without touching
//!   the filesystem.
//! - **Dynamic mode**: a single `GET <prefix>/*` route. Files are resolved at
//!   request time and the ETag is computed from the bytes actually read.
//!   Filesystem lookups are memoized in bounded TTL caches.
//!
//! Every handler returns an [`Outcome`]: 200 with the body, 304, or 404.
//! Per-request failures never surface as errors; they become a 404.
//!
//! ## Architecture
//!
//! - **[`config`]** - Mount options, file loading and header policy inputs
//! - **[`enumerate`]** - Recursive asset discovery with ignore rules
//! - **[`routes`]** - Mode selection, route emission and a reference [`RouteTable`]
//! - **[`handler`]** - [`StaticFileHandler`] and [`WildcardHandler`]
//! - **[`conditional`]** - `If-None-Match` / `If-Modified-Since` evaluation
//! - **[`etag`]** - SHA-256 content tags
//! - **[`cache`]** - The freshness caches backing dynamic mode
//! - **[`logging`]** - Subscriber setup for hosts and the CLI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use static_routes::{build_routes, RouteTable, StaticConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = StaticConfig::new("./public")
//!     .prefix("/public")
//!     .always_static(true)
//!     .header("x-content-type-options", "nosniff");
//!
//! let mut table = RouteTable::new();
//! table.extend(build_routes(&config).await?)?;
//!
//! let req = http::Request::get("/public/index.html").body(())?;
//! let outcome = table.dispatch(&req).await;
//! println!("{}", outcome.status());
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events (route build summary at `info`, cache
//! and request detail at `debug`, folded I/O failures at `warn`) and never
//! installs a subscriber itself. See [`logging`] for a ready-made setup.

pub mod cache;
pub mod cli;
pub mod conditional;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod etag;
pub mod handler;
pub mod ignore;
pub mod logging;
pub mod routes;

pub use cache::{FreshnessCaches, FreshnessConfig, TtlCache};
pub use config::{default_resolver, CacheDirective, PathResolver, StaticConfig};
pub use error::StaticError;
pub use etag::ETag;
pub use handler::{
    AssetHandler, AssetRequest, Outcome, ResponsePolicy, StaticAsset, StaticFileHandler,
    WildcardHandler,
};
pub use ignore::IgnoreRule;
pub use routes::{build_routes, plan_mode, RouteDescriptor, RouteMode, RouteTable};
