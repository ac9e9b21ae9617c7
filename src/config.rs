//! Daemon configuration
//!
//! Loaded once at startup from a TOML file with one table per cluster:
//!
//! ```toml
//! [cluster.main]
//! socket = "/tmp/kvproxy.sock"
//! host = "10.0.0.1:3000,[::1]:tls-name:3001"
//! user = "admin"
//! password = "env:KVPROXY_PASSWORD"
//! auth_mode = "internal"
//! connection_queue_size = 64
//! ```
//!
//! ## Environment Variables
//!
//! - `KVPROXY_CONFIG` - config file path
//! - `KVPROXY_LOG` - tracing filter directive
//!
//! These can be set in a `.env` file in the working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::Engine;
use clap::Parser;
use regex::Regex;
use serde::Deserialize;

use crate::error::{ProxyError, ProxyResult};

pub const DEFAULT_CONFIG_FILE: &str = "/etc/kvproxy/kvproxy.toml";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CONNECTION_QUEUE_SIZE: usize = 32;

#[derive(Parser, Debug, Clone)]
#[command(name = "kvproxy", version)]
#[command(about = "Local proxy daemon for a clustered key-value store", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, env = "KVPROXY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Tracing filter, e.g. `kvproxy=debug`
    #[arg(long, env = "KVPROXY_LOG")]
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Internal,
    External,
    Pki,
}

impl std::str::FromStr for AuthMode {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INTERNAL" => Ok(AuthMode::Internal),
            "EXTERNAL" => Ok(AuthMode::External),
            "PKI" => Ok(AuthMode::Pki),
            other => Err(ProxyError::Config(format!(
                "unrecognized auth mode '{}', expected INTERNAL, EXTERNAL or PKI",
                other
            ))),
        }
    }
}

/// One seed node: `host[:tls-name][:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub tls_name: Option<String>,
    pub port: u16,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            name: DEFAULT_HOST.to_string(),
            tls_name: None,
            port: DEFAULT_PORT,
        }
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.contains(':') {
            write!(f, "[{}]", self.name)?;
        } else {
            write!(f, "{}", self.name)?;
        }
        if let Some(tls) = &self.tls_name {
            write!(f, ":{}", tls)?;
        }
        write!(f, ":{}", self.port)
    }
}

/// Raw `[cluster.<name>]` table as written in the file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ClusterFile {
    socket: PathBuf,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    auth_mode: Option<String>,
    #[serde(default)]
    connection_queue_size: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    cluster: BTreeMap<String, ClusterFile>,
}

/// Resolved settings for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    pub name: String,
    pub socket: PathBuf,
    pub hosts: Vec<Host>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub auth_mode: AuthMode,
    pub connection_queue_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub clusters: Vec<ClusterConfig>,
}

impl Config {
    /// Read and resolve the config file.
    pub fn load(path: &Path) -> ProxyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ProxyResult<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| ProxyError::Config(format!("invalid config: {}", e)))?;

        if file.cluster.is_empty() {
            return Err(ProxyError::Config(
                "no [cluster.<name>] sections configured".to_string(),
            ));
        }

        let clusters = file
            .cluster
            .into_iter()
            .map(|(name, raw)| resolve_cluster(name, raw))
            .collect::<ProxyResult<Vec<_>>>()?;
        Ok(Self { clusters })
    }
}

fn resolve_cluster(name: String, raw: ClusterFile) -> ProxyResult<ClusterConfig> {
    if raw.socket.as_os_str().is_empty() {
        return Err(ProxyError::Config(format!(
            "cluster '{}' has an empty socket path",
            name
        )));
    }

    let hosts = match raw.host.as_deref() {
        Some(hosts) => parse_hosts(hosts)?,
        None => vec![Host::default()],
    };
    let password = raw.password.as_deref().map(resolve_password).transpose()?;
    let auth_mode = match raw.auth_mode.as_deref() {
        Some(mode) => mode.parse()?,
        None => AuthMode::default(),
    };
    let connection_queue_size = match raw.connection_queue_size {
        0 => DEFAULT_CONNECTION_QUEUE_SIZE,
        n => n,
    };

    Ok(ClusterConfig {
        name,
        socket: raw.socket,
        hosts,
        user: raw.user,
        password,
        auth_mode,
        connection_queue_size,
    })
}

fn host_pattern() -> ProxyResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:\[(?P<v6>[0-9A-Fa-f:.]+)\]|(?P<name>[^:\[\]]+))(?::(?P<rest>.*))?$")
        })
        .as_ref()
        .map_err(|e| ProxyError::Config(format!("host pattern: {}", e)))
}

/// Parse a comma-separated seed list.
///
/// A single suffix is a port when numeric and a TLS name otherwise; two
/// suffixes are `tls-name:port`. IPv6 literals must be bracketed.
pub fn parse_hosts(hosts: &str) -> ProxyResult<Vec<Host>> {
    let parsed = hosts
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(parse_host)
        .collect::<ProxyResult<Vec<_>>>()?;

    if parsed.is_empty() {
        return Ok(vec![Host::default()]);
    }
    Ok(parsed)
}

fn parse_host(host: &str) -> ProxyResult<Host> {
    let invalid = || ProxyError::Config(format!("invalid host '{}'", host));
    let caps = host_pattern()?.captures(host).ok_or_else(invalid)?;

    let name = caps
        .name("v6")
        .or_else(|| caps.name("name"))
        .map(|m| m.as_str().to_string())
        .ok_or_else(invalid)?;

    let (tls_name, port) = match caps.name("rest").map(|m| m.as_str()) {
        None => (None, DEFAULT_PORT),
        Some(rest) => match rest.split_once(':') {
            Some((tls, port)) => (Some(tls.to_string()), parse_port(port).ok_or_else(invalid)?),
            None => match parse_port(rest) {
                Some(port) => (None, port),
                None => (Some(rest.to_string()), DEFAULT_PORT),
            },
        },
    };

    if tls_name.as_deref().is_some_and(str::is_empty) {
        return Err(invalid());
    }
    Ok(Host {
        name,
        tls_name,
        port,
    })
}

fn parse_port(port: &str) -> Option<u16> {
    port.parse::<u16>().ok().filter(|p| *p != 0)
}

/// Resolve a password value.
///
/// Supported forms: `env:VAR`, `env-b64:VAR`, `b64:DATA`, `file:PATH`, or
/// the literal password.
pub fn resolve_password(value: &str) -> ProxyResult<String> {
    let Some((source, rest)) = value.split_once(':') else {
        return Ok(value.to_string());
    };

    match source {
        "env" => from_env(rest),
        "env-b64" => from_env(rest).and_then(|encoded| from_base64(&encoded)),
        "b64" => from_base64(rest),
        "file" => {
            let data = std::fs::read_to_string(rest).map_err(|e| {
                ProxyError::Config(format!("failed to read password file {}: {}", rest, e))
            })?;
            Ok(data.strip_suffix('\n').unwrap_or(&data).to_string())
        }
        _ => Ok(value.to_string()),
    }
}

fn from_env(var: &str) -> ProxyResult<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ProxyError::Config(format!(
            "environment variable {} not found",
            var
        ))),
    }
}

fn from_base64(encoded: &str) -> ProxyResult<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ProxyError::Config(format!("invalid base64 password: {}", e)))?;
    let decoded = String::from_utf8(bytes)
        .map_err(|_| ProxyError::Config("base64 password is not UTF-8".to_string()))?;
    Ok(decoded.strip_suffix('\n').unwrap_or(&decoded).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_cluster() {
        let config = Config::parse(
            r#"
            [cluster.main]
            socket = "/tmp/main.sock"
            "#,
        )
        .unwrap();

        assert_eq!(config.clusters.len(), 1);
        let cluster = &config.clusters[0];
        assert_eq!(cluster.name, "main");
        assert_eq!(cluster.hosts, vec![Host::default()]);
        assert_eq!(cluster.auth_mode, AuthMode::Internal);
        assert_eq!(cluster.connection_queue_size, 32);
        assert!(cluster.password.is_none());
    }

    #[test]
    fn test_no_clusters_is_error() {
        assert!(matches!(Config::parse(""), Err(ProxyError::Config(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::parse(
            r#"
            [cluster.main]
            socket = "/tmp/main.sock"
            sockett = "typo"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_auth_mode_case_insensitive() {
        assert_eq!("pki".parse::<AuthMode>().unwrap(), AuthMode::Pki);
        assert_eq!("External".parse::<AuthMode>().unwrap(), AuthMode::External);
        assert!("kerberos".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_parse_hosts() {
        let hosts = parse_hosts("10.0.0.1, db.local:tls1, db2:4000, db3:tls3:4001, [::1]:3100")
            .unwrap();
        assert_eq!(hosts.len(), 5);
        assert_eq!(hosts[0].port, DEFAULT_PORT);
        assert_eq!(hosts[1].tls_name.as_deref(), Some("tls1"));
        assert_eq!(hosts[1].port, DEFAULT_PORT);
        assert_eq!(hosts[2].port, 4000);
        assert_eq!(hosts[3].tls_name.as_deref(), Some("tls3"));
        assert_eq!(hosts[3].port, 4001);
        assert_eq!(hosts[4].name, "::1");
        assert_eq!(hosts[4].port, 3100);
        assert_eq!(hosts[4].to_string(), "[::1]:3100");
    }

    #[test]
    fn test_parse_hosts_invalid() {
        assert!(parse_hosts("db:tls:notaport").is_err());
        assert!(parse_hosts("[::1").is_err());
        assert_eq!(parse_hosts(" , ").unwrap(), vec![Host::default()]);
    }

    #[test]
    fn test_password_sources() {
        assert_eq!(resolve_password("plain").unwrap(), "plain");
        assert_eq!(resolve_password("b64:c2VjcmV0Cg==").unwrap(), "secret");

        std::env::set_var("KVPROXY_TEST_PW", "from-env");
        assert_eq!(resolve_password("env:KVPROXY_TEST_PW").unwrap(), "from-env");
        assert!(resolve_password("env:KVPROXY_TEST_PW_MISSING").is_err());

        std::env::set_var("KVPROXY_TEST_PW_B64", "c2VjcmV0");
        assert_eq!(resolve_password("env-b64:KVPROXY_TEST_PW_B64").unwrap(), "secret");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();
        let spec = format!("file:{}", file.path().display());
        assert_eq!(resolve_password(&spec).unwrap(), "from-file");
    }

    #[test]
    fn test_full_cluster() {
        std::env::set_var("KVPROXY_TEST_CLUSTER_PW", "pw");
        let config = Config::parse(
            r#"
            [cluster.a]
            socket = "/tmp/a.sock"
            host = "10.0.0.1:3000,10.0.0.2:3000"
            user = "admin"
            password = "env:KVPROXY_TEST_CLUSTER_PW"
            auth_mode = "external"
            connection_queue_size = 8

            [cluster.b]
            socket = "/tmp/b.sock"
            "#,
        )
        .unwrap();

        assert_eq!(config.clusters.len(), 2);
        let a = &config.clusters[0];
        assert_eq!(a.hosts.len(), 2);
        assert_eq!(a.user.as_deref(), Some("admin"));
        assert_eq!(a.password.as_deref(), Some("pw"));
        assert_eq!(a.auth_mode, AuthMode::External);
        assert_eq!(a.connection_queue_size, 8);
        assert_eq!(config.clusters[1].name, "b");
    }
}
