//! Session and account coordination for the trading dashboard client
//!
//! - Notification store with per-severity auto-expiry
//! - Authenticated HTTP client with a middleware chain
//! - Auth and account stores
//! - Route guard and in-process router

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
pub mod session;
pub mod stores;

pub use app::DashboardClient;
pub use error::AppError;
