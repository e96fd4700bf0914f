// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # synaptix-observability
//!
//! Console logging for Synaptix simulations. The level and format come from
//! the `[logging]` section of the simulation configuration; `SYNAPTIX_DEBUG`
//! raises chosen subsystems to DEBUG and `RUST_LOG` overrides both.
//!
//! ```rust,no_run
//! use synaptix_observability::{init_logging, DebugScopes, LoggingConfig};
//!
//! let scopes = DebugScopes::from_env().expect("debug scopes");
//! init_logging(&scopes, &LoggingConfig::from_names("info", "json").expect("format"))
//!     .expect("logging");
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod init;
pub mod scopes;

pub use config::*;
pub use init::*;
pub use scopes::*;
