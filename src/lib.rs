//! # Serre - greenhouse monitoring over Modbus TCP
//!
//! Reads the temperature and three soil-humidity inputs of a Teracom TCW241
//! I/O module and serves them to the greenhouse dashboard.
//!
//! ## Architecture
//!
//! - `modbus`: register transport abstraction and the tokio-modbus client
//! - `channels`: register map and scaling of raw values
//! - `acquisition`: one read cycle producing a `Snapshot`
//! - `snapshot`: timestamped readings with the average humidity
//! - `history`: bounded measurement history on disk
//! - `auth`: user accounts, password hashing and session tokens
//! - `web`: HTTP server and REST API
//! - `simulator`: Modbus TCP stand-in for the I/O module
//! - `config`: YAML configuration and validation
//! - `logging`: structured logging and tracing

pub mod acquisition;
pub mod auth;
pub mod channels;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod modbus;
pub mod simulator;
pub mod snapshot;
pub mod web;


// Re-export commonly used types
pub use acquisition::Acquirer;
pub use config::Config;
pub use error::{Result, SerreError};
pub use snapshot::Snapshot;
