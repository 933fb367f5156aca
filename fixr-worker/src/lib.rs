//! # Fixr Worker Library
//!
//! Consumes the Redis task queue filled by the API.
//!
//! ## Modules
//!
//! - `server`: worker pool, lease handling and recovery
//! - `service`: start/stop lifecycle around the pool
//! - `handlers`: task handler trait, registry and the welcome-email handler
//! - `email`: HTTP email provider client
//! - `config`: environment configuration

pub mod config;
pub mod email;
pub mod handlers;
pub mod server;
pub mod service;
