//! medisecure-core: Shared library for the MediSecure portal client
//!
//! This crate provides:
//! - Wire types for the middleware and health-check APIs
//! - The session context (credential store) and input validation
//! - The middleware HTTP client with its error taxonomy
//! - The service health monitor with a typed status board
//! - Credential export

pub mod client;
pub mod config;
pub mod export;
pub mod monitor;
pub mod protocol;
pub mod session;

pub use client::{ApiError, MiddlewareClient};
pub use config::Config;
pub use monitor::{MonitorHandle, ProbeOutcome, ServiceId, StatusBoard};
pub use protocol::SmartCard;
pub use session::{SessionContext, View};
