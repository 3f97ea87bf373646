//! Command handlers -- one module per subcommand

pub mod capture;
pub mod config;
