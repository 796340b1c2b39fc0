use clap::{Args, Parser, Subcommand};
use gm_common::Points;

#[derive(Parser, Debug)]
#[command(name = "gophermart", version, about = "Gophermart loyalty points: accrual reconciliation and the points ledger")]
pub struct Arguments {
    /// SQLite database URL, e.g. `sqlite://data/gophermart.db`. Leave empty to keep everything in memory.
    #[arg(short = 'd', long = "database-uri", env = "DATABASE_URI", default_value = "")]
    pub database_uri: String,
    /// Size of the database connection pool
    #[arg(long = "max-connections", env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
    /// Base URL of the accrual service
    #[arg(short = 'r', long = "accrual-address", env = "ACCRUAL_SYSTEM_ADDRESS", default_value = "http://localhost:8090")]
    pub accrual_address: String,
    /// Timeout for each request to the accrual service, in seconds
    #[arg(short = 't', long = "accrual-timeout", env = "ACCRUAL_TIMEOUT", default_value_t = 30)]
    pub accrual_timeout: u64,
    /// Time between reconciliation ticks, in seconds
    #[arg(short = 'i', long = "poll-interval", env = "ACCRUAL_POLL_INTERVAL", default_value_t = 5)]
    pub poll_interval: u64,
    /// Maximum number of orders polled per tick
    #[arg(short = 'b', long = "batch-limit", env = "ACCRUAL_BATCH_LIMIT", default_value_t = 10)]
    pub batch_limit: usize,
    /// Default log filter. `RUST_LOG` takes precedence when set.
    #[arg(short = 'l', long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Login and password. Every command that acts on behalf of a user checks them first.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    #[arg(long)]
    pub login: String,
    #[arg(long, env = "GOPHERMART_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Default, Subcommand)]
pub enum Command {
    /// Run the accrual reconciliation worker until interrupted. This is the default.
    #[default]
    Run,
    /// Register a new user
    Register {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Submit an order number on behalf of a user
    #[command(name = "submit-order")]
    SubmitOrder {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(required = true, index = 1)]
        order: String,
    },
    /// List a user's orders and the points they earned
    Orders {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show a user's current balance and the total withdrawn
    Balance {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// List a user's withdrawals
    Withdrawals {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Spend points against a new order
    Withdraw {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        order: String,
        /// Amount of points, e.g. `751` or `12.5`
        #[arg(long, value_parser = parse_points)]
        sum: Points,
    },
}

fn parse_points(s: &str) -> Result<Points, String> {
    let points = Points::from_decimal_str(s).map_err(|e| e.to_string())?;
    if !points.is_positive() {
        return Err(format!("The amount must be positive. Got {s}"));
    }
    Ok(points)
}
