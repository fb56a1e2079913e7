//! CLI arguments and validated server configuration.

use clap::{Parser, Subcommand};
use core::time::Duration;
use numspool::EngineConfig;
use std::path::PathBuf;

/// Command-line and environment configuration for the service.
///
/// Every flag falls back to a `NUMSPOOL_*` environment variable, which in
/// turn can come from a `.env` file. Defaults mirror a small single-node
/// deployment: spool next to the binary, 10M generation ceiling, 20 MB
/// partitions, 24 h retention.
#[derive(Parser, Debug)]
#[command(
    name = "numspool-http-server",
    version,
    about = "HTTP service for candidate number generation and spooled downloads"
)]
pub struct CliArgs {
    /// Address to bind, e.g. 0.0.0.0:5000.
    #[arg(long, env = "NUMSPOOL_ADDR", default_value = "0.0.0.0:5000")]
    pub addr: String,

    /// SQLite database holding the segment lookup table.
    #[arg(long, env = "NUMSPOOL_DB", default_value = "data/phone_location.db")]
    pub database: PathBuf,

    /// Segment CSV (prefix,suffix,province,city,operator) for import.
    #[arg(long, env = "NUMSPOOL_CSV", default_value = "data/phone_location.csv")]
    pub csv: PathBuf,

    /// Directory generated artifacts are spooled to.
    #[arg(long, env = "NUMSPOOL_SPOOL_DIR", default_value = "downloads")]
    pub spool_dir: PathBuf,

    /// Ceiling on the deduplicated identifier count of one generation.
    #[arg(long, env = "NUMSPOOL_MAX_COUNT", default_value_t = 10_000_000)]
    pub max_count: usize,

    /// Partition size budget in MB for oversized artifacts.
    #[arg(long, env = "NUMSPOOL_PART_SIZE_LIMIT_MB", default_value_t = 20)]
    pub file_partition_size_limit_mb: u64,

    /// Age in hours after which spool files are swept.
    #[arg(long, env = "NUMSPOOL_EXPIRY_HOURS", default_value_t = 24)]
    pub artifact_expiry_hours: u64,

    /// Interval in seconds between scheduled retention sweeps.
    #[arg(long, env = "NUMSPOOL_SWEEP_INTERVAL_SECS", default_value_t = 3600)]
    pub sweep_interval_secs: u64,

    /// Expansion worker count; 0 uses the available parallelism.
    #[arg(long, env = "NUMSPOOL_WORKERS", default_value_t = 0)]
    pub workers: usize,

    /// Require login for all API routes.
    #[arg(long, env = "NUMSPOOL_LOGIN_ENABLED")]
    pub login_enabled: bool,

    /// Comma-separated user:password pairs accepted by /api/login.
    #[arg(long, env = "NUMSPOOL_USERS", default_value = "")]
    pub users: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Import the segment CSV into the SQLite lookup table.
    Import {
        /// Re-import even if the table is already populated.
        #[arg(long)]
        force: bool,
    },
}

/// Validated runtime configuration derived from [`CliArgs`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: String,
    pub database: PathBuf,
    pub csv: PathBuf,
    pub spool_dir: PathBuf,
    pub sweep_interval: Duration,
    pub engine: EngineConfig,
    pub login: LoginConfig,
}

/// Login settings. `users` may be populated while `enabled` is false; the
/// login endpoint then works but nothing requires it.
#[derive(Clone, Debug, Default)]
pub struct LoginConfig {
    pub enabled: bool,
    pub users: Vec<Credential>,
}

#[derive(Clone, Debug)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl LoginConfig {
    /// Checks a username/password pair against the configured users.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        self.users
            .iter()
            .any(|c| c.username == username && c.password == password)
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> anyhow::Result<Self> {
        let users = parse_users(&args.users)?;
        if args.login_enabled && users.is_empty() {
            anyhow::bail!("login is enabled but no users are configured (--users)");
        }
        if args.sweep_interval_secs == 0 {
            anyhow::bail!("sweep interval must be at least 1 second");
        }

        let num_workers = if args.workers == 0 {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(4)
        } else {
            args.workers
        };

        Ok(Self {
            addr: args.addr,
            database: args.database,
            csv: args.csv,
            spool_dir: args.spool_dir,
            sweep_interval: Duration::from_secs(args.sweep_interval_secs),
            engine: EngineConfig {
                max_count: args.max_count,
                file_partition_size_limit_mb: args.file_partition_size_limit_mb,
                artifact_expiry_hours: args.artifact_expiry_hours,
                num_workers,
                ..EngineConfig::default()
            },
            login: LoginConfig {
                enabled: args.login_enabled,
                users,
            },
        })
    }
}

fn parse_users(raw: &str) -> anyhow::Result<Vec<Credential>> {
    let mut users = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((username, password)) = pair.split_once(':') else {
            anyhow::bail!("malformed user entry {pair:?}, expected user:password");
        };
        users.push(Credential {
            username: username.to_owned(),
            password: password.to_owned(),
        });
    }
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs::parse_from(["numspool-http-server"])
    }

    #[test]
    fn defaults_match_documented_limits() {
        let config = ServerConfig::try_from(args()).unwrap();
        assert_eq!(config.engine.max_count, 10_000_000);
        assert_eq!(config.engine.file_partition_size_limit_mb, 20);
        assert_eq!(config.engine.artifact_expiry_hours, 24);
        assert!(!config.login.enabled);
    }

    #[test]
    fn users_parse_into_credentials() {
        let mut a = args();
        a.users = "admin:admin123, ops:secret".into();
        let config = ServerConfig::try_from(a).unwrap();
        assert_eq!(config.login.users.len(), 2);
        assert!(config.login.validate("ops", "secret"));
        assert!(!config.login.validate("ops", "wrong"));
    }

    #[test]
    fn malformed_user_entry_is_rejected() {
        let mut a = args();
        a.users = "just-a-name".into();
        assert!(ServerConfig::try_from(a).is_err());
    }

    #[test]
    fn login_without_users_is_rejected() {
        let mut a = args();
        a.login_enabled = true;
        assert!(ServerConfig::try_from(a).is_err());
    }
}
