//! Central module for application-wide configuration settings.
//!
//! This module handles loading the server port, the upstream event application
//! origin, the token verification endpoint and the route policy that decides
//! which paths bypass authentication.

use anyhow::{Context, Result, bail};
use std::env;

const DEFAULT_ALLOWED_PATHS: &str = "/health,/api/tokenverify,/api/login,/api/register";
const DEFAULT_ALLOWED_PATHS_UI: &str = "/_next,/static,/favicon.ico";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub upstream_url: String,
    pub verify_url: String,
    pub verify_timeout_seconds: u64,
    pub proxy_timeout_seconds: u64,
    pub route_policy: RoutePolicy,
}

/// Which paths skip which part of the gate.
///
/// Kept as data so route policy can be audited and tested on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    /// Prefixes that bypass authentication entirely, API or UI.
    pub allowed_paths: Vec<String>,
    /// Prefixes that bypass the UI cookie check but not the API bearer check.
    pub allowed_paths_ui: Vec<String>,
    pub login_path: String,
    pub admin_dashboard_path: String,
    pub user_dashboard_path: String,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            allowed_paths: split_prefixes(DEFAULT_ALLOWED_PATHS),
            allowed_paths_ui: split_prefixes(DEFAULT_ALLOWED_PATHS_UI),
            login_path: "/login".to_string(),
            admin_dashboard_path: "/admin/dashboard".to_string(),
            user_dashboard_path: "/user-dashboard".to_string(),
        }
    }
}

impl RoutePolicy {
    pub fn is_allowed(&self, path: &str) -> bool {
        self.allowed_paths.iter().any(|prefix| path.starts_with(prefix))
    }

    pub fn is_allowed_ui(&self, path: &str) -> bool {
        self.allowed_paths_ui
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    pub fn is_login(&self, path: &str) -> bool {
        path == self.login_path
    }

    /// Parses a comma-separated prefix list, rejecting entries that are not
    /// absolute paths.
    pub fn parse_prefixes(raw: &str) -> Result<Vec<String>> {
        let prefixes = split_prefixes(raw);
        if let Some(bad) = prefixes.iter().find(|prefix| !prefix.starts_with('/')) {
            bail!("path prefix '{}' must start with '/'", bad);
        }
        Ok(prefixes)
    }
}

fn split_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let upstream_url = env::var("UPSTREAM_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let verify_url = env::var("VERIFY_URL")
            .unwrap_or_else(|_| format!("{}/api/tokenverify", upstream_url));

        let verify_timeout_seconds = env::var("VERIFY_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .context("VERIFY_TIMEOUT_SECONDS must be a valid number")?;

        let proxy_timeout_seconds = env::var("PROXY_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("PROXY_TIMEOUT_SECONDS must be a valid number")?;

        let allowed_paths = RoutePolicy::parse_prefixes(
            &env::var("ALLOWED_PATHS").unwrap_or_else(|_| DEFAULT_ALLOWED_PATHS.to_string()),
        )
        .context("ALLOWED_PATHS is invalid")?;

        let allowed_paths_ui = RoutePolicy::parse_prefixes(
            &env::var("ALLOWED_PATHS_UI")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_PATHS_UI.to_string()),
        )
        .context("ALLOWED_PATHS_UI is invalid")?;

        Ok(Config {
            server_port,
            upstream_url,
            verify_url,
            verify_timeout_seconds,
            proxy_timeout_seconds,
            route_policy: RoutePolicy {
                allowed_paths,
                allowed_paths_ui,
                ..RoutePolicy::default()
            },
        })
    }
}
