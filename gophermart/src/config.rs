use std::time::Duration;

use accrual_tools::AccrualConfig;
use log::*;

use crate::{cli::Arguments, errors::AppError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_BATCH_LIMIT: usize = 10;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Settings for the accrual reconciliation worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Time between ticks. A rate-limited tick may stretch this for the next wait.
    pub poll_interval: Duration,
    /// Maximum number of orders polled per tick.
    pub batch_limit: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, batch_limit: DEFAULT_BATCH_LIMIT }
    }
}

#[derive(Clone, Debug)]
pub struct GophermartConfig {
    /// SQLite URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub accrual: AccrualConfig,
    pub worker: WorkerConfig,
}

impl Default for GophermartConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            accrual: AccrualConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl GophermartConfig {
    pub fn from_args(args: &Arguments) -> Result<Self, AppError> {
        let database_url = match args.database_uri.trim() {
            "" => {
                warn!("🪛️ DATABASE_URI is not set. Orders and points will be kept in memory and lost on exit.");
                None
            },
            url => Some(url.to_string()),
        };
        if args.max_connections == 0 {
            return Err(AppError::ConfigurationError("DATABASE_MAX_CONNECTIONS must be at least 1".to_string()));
        }
        if args.poll_interval == 0 {
            return Err(AppError::ConfigurationError("ACCRUAL_POLL_INTERVAL must be at least 1 second".to_string()));
        }
        if args.batch_limit == 0 {
            return Err(AppError::ConfigurationError("ACCRUAL_BATCH_LIMIT must be at least 1".to_string()));
        }
        let accrual = AccrualConfig::new(&args.accrual_address, Duration::from_secs(args.accrual_timeout))
            .map_err(|e| AppError::ConfigurationError(e.to_string()))?;
        let worker =
            WorkerConfig { poll_interval: Duration::from_secs(args.poll_interval), batch_limit: args.batch_limit };
        info!("🪛️ Accrual service: {} (timeout {:?})", accrual.base_url, accrual.timeout);
        info!("🪛️ Polling every {:?}, up to {} orders per tick", worker.poll_interval, worker.batch_limit);
        Ok(Self { database_url, max_connections: args.max_connections, accrual, worker })
    }
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Result<GophermartConfig, AppError> {
        let mut argv = vec!["gophermart"];
        argv.extend_from_slice(args);
        GophermartConfig::from_args(&Arguments::try_parse_from(argv).unwrap())
    }

    #[test]
    fn explicit_values() {
        let config = parse(&["-d", "sqlite://data/g.db", "-r", "http://accrual:8080/", "-t", "2", "-i", "7", "-b", "4"])
            .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite://data/g.db"));
        assert_eq!(config.accrual.base_url, "http://accrual:8080");
        assert_eq!(config.accrual.timeout, Duration::from_secs(2));
        assert_eq!(config.worker, WorkerConfig { poll_interval: Duration::from_secs(7), batch_limit: 4 });
    }

    #[test]
    fn blank_database_uri_means_memory() {
        let config = parse(&["-d", "  ", "-r", "http://localhost:8090"]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn nonsense_is_rejected() {
        assert!(matches!(parse(&["-r", "http://x", "-i", "0"]), Err(AppError::ConfigurationError(_))));
        assert!(matches!(parse(&["-r", "http://x", "-b", "0"]), Err(AppError::ConfigurationError(_))));
        assert!(matches!(parse(&["-r", "http://x", "-t", "0"]), Err(AppError::ConfigurationError(_))));
        assert!(matches!(parse(&["-r", "http://x", "--max-connections", "0"]), Err(AppError::ConfigurationError(_))));
        assert!(matches!(parse(&["-r", " "]), Err(AppError::ConfigurationError(_))));
    }
}
