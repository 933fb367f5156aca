//! # Fixr API Server Library
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `services`: Composition layer over repositories and the job client
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
