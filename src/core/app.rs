//! Application identity from Cargo.toml.
//!
//! Single source of truth for the app name, version, and vendor used in paths and user agents.

/// Application name (from Cargo.toml `package.name`).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Application version (from Cargo.toml `package.version`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Vendor / organization used for ProjectDirs.
pub const VENDOR: &str = "healthchat";

/// User agent sent by the HTTP transport.
pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION)
}
