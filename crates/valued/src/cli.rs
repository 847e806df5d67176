//! Command-line interface and config layering.
//!
//! Precedence, highest first: CLI flag, environment variable, `--config`
//! file, built-in default.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use valuegrid_core::ServiceConfig;

#[derive(Parser, Debug)]
#[command(name = "valued", about = "valuegrid request intake daemon", version)]
pub struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait for the durable store, then serve the HTTP API.
    Serve(ConfigArgs),
    /// Run only the startup gate and exit (0 = store ready).
    Check(ConfigArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// TOML config file.
    #[arg(long, env = "VALUED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address the HTTP API listens on.
    #[arg(long, env = "VALUED_LISTEN")]
    pub listen: Option<SocketAddr>,

    #[arg(long, env = "PGHOST")]
    pub pg_host: Option<String>,

    #[arg(long, env = "PGPORT")]
    pub pg_port: Option<u16>,

    #[arg(long, env = "PGUSER")]
    pub pg_user: Option<String>,

    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub pg_password: Option<String>,

    #[arg(long, env = "PGDATABASE")]
    pub pg_database: Option<String>,

    /// Connection acquire timeout for store calls, in milliseconds.
    #[arg(long, env = "PG_CONNECT_TIMEOUT_MS")]
    pub pg_connect_timeout_ms: Option<u64>,

    #[arg(long, env = "PG_MAX_CONNECTIONS")]
    pub pg_max_connections: Option<u32>,

    #[arg(long, env = "REDIS_HOST")]
    pub redis_host: Option<String>,

    #[arg(long, env = "REDIS_PORT")]
    pub redis_port: Option<u16>,

    /// Per-command timeout for cache and publish calls, in milliseconds.
    #[arg(long, env = "REDIS_TIMEOUT_MS")]
    pub redis_timeout_ms: Option<u64>,

    /// Liveness attempts before startup is declared failed.
    #[arg(long, env = "STARTUP_RETRY_ATTEMPTS")]
    pub retry_attempts: Option<u32>,

    /// Fixed delay between liveness attempts, in milliseconds.
    #[arg(long, env = "STARTUP_RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,
}

impl ConfigArgs {
    /// Build the effective config and validate it.
    pub fn resolve(&self) -> anyhow::Result<ServiceConfig> {
        let base = match &self.config {
            Some(path) => ServiceConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ServiceConfig::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Overlay every flag that was given onto `config`.
    pub fn apply(&self, mut config: ServiceConfig) -> ServiceConfig {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut config.server.listen, &self.listen);
        set(&mut config.store.host, &self.pg_host);
        set(&mut config.store.port, &self.pg_port);
        set(&mut config.store.user, &self.pg_user);
        set(&mut config.store.password, &self.pg_password);
        set(&mut config.store.database, &self.pg_database);
        set(&mut config.store.connect_timeout_ms, &self.pg_connect_timeout_ms);
        set(&mut config.store.max_connections, &self.pg_max_connections);
        set(&mut config.cache.host, &self.redis_host);
        set(&mut config.cache.port, &self.redis_port);
        set(&mut config.cache.timeout_ms, &self.redis_timeout_ms);
        set(&mut config.startup.retry_attempts, &self.retry_attempts);
        set(&mut config.startup.retry_delay_ms, &self.retry_delay_ms);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_args_keep_defaults() {
        let config = ConfigArgs::default().apply(ServiceConfig::default());
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\nhost = \"from-file\"\nuser = \"file-user\"\n\n[cache]\nhost = \"redis\""
        )
        .unwrap();

        let args = ConfigArgs {
            config: Some(file.path().to_path_buf()),
            pg_host: Some("from-flag".to_string()),
            retry_attempts: Some(3),
            retry_delay_ms: Some(50),
            ..ConfigArgs::default()
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.store.host, "from-flag");
        assert_eq!(config.store.user, "file-user");
        assert_eq!(config.cache.host, "redis");
        assert_eq!(config.startup.retry_attempts, 3);
        assert_eq!(config.startup.retry_delay_ms, 50);
    }

    #[test]
    fn zero_attempts_fails_validation() {
        let args = ConfigArgs {
            retry_attempts: Some(0),
            ..ConfigArgs::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/valued.toml")),
            ..ConfigArgs::default()
        };
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/valued.toml"));
    }

    #[test]
    fn parses_serve_with_flags() {
        let cli = Cli::try_parse_from([
            "valued",
            "--log-format",
            "json",
            "serve",
            "--listen",
            "127.0.0.1:8080",
            "--pg-port",
            "6543",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.listen, Some("127.0.0.1:8080".parse().unwrap()));
        assert_eq!(args.pg_port, Some(6543));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
