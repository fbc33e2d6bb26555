//! Autonomous outreach configuration, loaded once from the environment

use std::time::Duration;

use parley_core::env::{non_empty, parse_non_negative_int, parse_positive_float, process_lookup};
use url::{Host, Url};

use crate::directory::{normalize_url, parse_discovery_urls};

pub const HOST_ENV: &str = "A2A_HOST";
pub const PORT_ENV: &str = "A2A_PORT";
pub const AGENT_NAME_ENV: &str = "PARLEY_AGENT_NAME";
pub const SELF_URL_ENV: &str = "PARLEY_SELF_URL";
pub const DISCOVERY_URLS_ENV: &str = "PARLEY_DISCOVERY_URLS";
pub const HOPS_ENV: &str = "PARLEY_AUTONOMOUS_HOPS";
pub const TIMEOUT_ENV: &str = "PARLEY_AUTONOMOUS_TIMEOUT";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_AGENT_NAME: &str = "Parley Agent";
pub const DEFAULT_MAX_HOPS: u32 = 1;
pub const DEFAULT_TIMEOUT_SECS: f64 = 20.0;

const LOOPBACK: &str = "127.0.0.1";

/// Runtime configuration for autonomous peer outreach
#[derive(Debug, Clone, PartialEq)]
pub struct AutonomyConfig {
    pub agent_name: String,
    pub self_url: Option<String>,
    pub discovery_urls: Vec<String>,
    pub max_hops: u32,
    pub timeout: Duration,
}

impl AutonomyConfig {
    pub fn from_env(host: Option<&str>, port: Option<u16>) -> Self {
        Self::from_lookup(process_lookup, host, port)
    }

    /// Build from a variable lookup. `host`/`port` override `A2A_HOST` and
    /// `A2A_PORT` when deriving the default self URL.
    pub fn from_lookup<F>(lookup: F, host: Option<&str>, port: Option<u16>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let agent_name =
            non_empty(lookup(AGENT_NAME_ENV)).unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string());

        let self_url = lookup(SELF_URL_ENV)
            .as_deref()
            .and_then(normalize_url)
            .map(substitute_loopback)
            .or_else(|| {
                let host = host
                    .map(str::to_string)
                    .unwrap_or_else(|| lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()));
                let port = port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| lookup(PORT_ENV).unwrap_or_else(|| DEFAULT_PORT.to_string()));
                local_base_url(&host, &port)
            });

        Self {
            agent_name,
            self_url,
            discovery_urls: parse_discovery_urls(lookup(DISCOVERY_URLS_ENV).as_deref()),
            max_hops: parse_non_negative_int(lookup(HOPS_ENV).as_deref(), DEFAULT_MAX_HOPS),
            timeout: Duration::from_secs_f64(parse_positive_float(
                lookup(TIMEOUT_ENV).as_deref(),
                DEFAULT_TIMEOUT_SECS,
            )),
        }
    }
}

/// `http://{host}:{port}` with an unspecified bind host shown as loopback
pub fn local_base_url(host: &str, port: &str) -> Option<String> {
    let host = host.trim();
    let port = port.trim();
    if host.is_empty() || port.is_empty() {
        return None;
    }
    let host = if matches!(host, "0.0.0.0" | "::") { LOOPBACK } else { host };
    normalize_url(&format!("http://{}:{}", host, port))
}

/// Replace an unspecified IP host (`0.0.0.0`, `[::]`) with loopback
fn substitute_loopback(raw: String) -> String {
    let Ok(mut parsed) = Url::parse(&raw) else {
        return raw;
    };
    let unspecified = match parsed.host() {
        Some(Host::Ipv4(ip)) => ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => ip.is_unspecified(),
        _ => false,
    };
    if !unspecified || parsed.set_host(Some(LOOPBACK)).is_err() {
        return raw;
    }
    normalize_url(parsed.as_str()).unwrap_or(raw)
}
