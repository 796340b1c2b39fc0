//! # Gophermart
//!
//! The process around the [`gophermart_engine`]: it reads configuration, sets up logging, opens the configured store
//! and then either runs the accrual reconciliation worker until interrupted, or executes a single operator command
//! and prints the result as JSON.
//!
//! ## Configuration
//! Every option can be given on the command line or through the environment. See [`cli::Arguments`] for the full
//! list, and [`config::GophermartConfig`] for how they are interpreted.
pub mod accrual_worker;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dto;
pub mod errors;
