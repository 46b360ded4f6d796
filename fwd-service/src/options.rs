//! Configuration options for the service.
//!
//! This module defines the command-line options and converts them into
//! [`ServiceOptions`].

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use fwd_core::{GrantSet, Permission, SuggestLimits};

use crate::{LogLevel, ServiceError, ServiceOptions};

/// Command-line arguments for the service.
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP service for forwarding entries")]
pub struct CliOptions {
    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// JSON namespace seed to load at startup
    #[arg(short, long)]
    pub seed: Option<PathBuf>,

    /// File to save the namespace to after every change
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Save the namespace to the default state file in the user's data directory
    #[arg(long, conflicts_with = "state")]
    pub persist: bool,

    /// Prefix of every entity URL; requests outside it are answered with 404
    #[arg(long, default_value = "/")]
    pub url_prefix: String,

    /// Permissions granted to callers (read, configure, create, delete); all when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub grant: Vec<String>,

    /// Seconds the interstitial waits before following a forward
    #[arg(long, default_value_t = 3)]
    pub delay: u64,

    /// Deepest group level opened by autocomplete
    #[arg(long, default_value_t = SuggestLimits::default().max_depth)]
    pub max_suggest_depth: usize,

    /// Entities examined by one autocomplete request
    #[arg(long, default_value_t = SuggestLimits::default().max_visits)]
    pub max_suggest_visits: usize,

    /// Enable verbose debug output
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(long, default_value_t = false, conflicts_with = "debug")]
    pub quiet: bool,
}

impl CliOptions {
    /// Convert CLI options to ServiceOptions
    pub fn into_service_options(self) -> Result<ServiceOptions, ServiceError> {
        let bind_address = self
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| ServiceError::Options(format!("Invalid bind address: {}", e)))?;

        let grants = if self.grant.is_empty() {
            GrantSet::all()
        } else {
            let permissions = self
                .grant
                .iter()
                .map(|name| name.parse::<Permission>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ServiceError::Options(e.to_string()))?;
            GrantSet::new(permissions)
        };

        let state_file = match (self.state, self.persist) {
            (Some(path), _) => Some(path),
            (None, true) => Some(default_state_file()?),
            (None, false) => None,
        };

        if !self.url_prefix.starts_with('/') {
            return Err(ServiceError::Options(
                "URL prefix must start with '/'".to_string(),
            ));
        }

        let log_level = if self.debug {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Quiet
        } else {
            LogLevel::Normal
        };

        Ok(ServiceOptions {
            bind_address,
            namespace_seed: self.seed,
            state_file,
            url_prefix: self.url_prefix,
            grants,
            interstitial_delay_secs: self.delay,
            suggest_limits: SuggestLimits {
                max_depth: self.max_suggest_depth,
                max_visits: self.max_suggest_visits,
            },
            init_tracing: true,
            log_level,
        })
    }
}

/// Default location of the state file.
pub fn default_state_file() -> Result<PathBuf, ServiceError> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ServiceError::Options("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("forwarder").join("namespace.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse_from(std::iter::once("fwd-service").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_grant_everything() {
        let options = parse(&[]).into_service_options().unwrap();
        assert_eq!(options.bind_address.to_string(), "127.0.0.1:3000");
        assert_eq!(options.grants, GrantSet::all());
        assert_eq!(options.interstitial_delay_secs, 3);
        assert_eq!(options.log_level, LogLevel::Normal);
        assert!(options.state_file.is_none());
    }

    #[test]
    fn grants_are_comma_separated_and_repeatable() {
        let options = parse(&["--grant", "read,configure", "-g", "delete"])
            .into_service_options()
            .unwrap();
        assert_eq!(
            options.grants,
            GrantSet::new([Permission::Read, Permission::Configure, Permission::Delete])
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["--bind", "nowhere"]).into_service_options().is_err());
        assert!(parse(&["--grant", "admin"]).into_service_options().is_err());
        assert!(parse(&["--url-prefix", "ctx"]).into_service_options().is_err());
    }

    #[test]
    fn debug_raises_log_level() {
        let options = parse(&["--debug"]).into_service_options().unwrap();
        assert_eq!(options.log_level, LogLevel::Debug);
    }
}
