//! Dashboard API Client
//!
//! REST client for the interiors admin dashboard backend.
//!
//! # Features
//! - Bearer authentication with a persisted access/refresh token pair
//! - Transparent refresh on 401, shared by all concurrent callers
//! - Requests that hit 401 during a refresh are queued and replayed once
//! - Typed verbs for invoices, receipts, quotes, projects, newsletter and more

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod resources;

pub use auth::{SessionState, TokenPair, TokenStore};
pub use client::DashboardClient;
pub use config::ClientConfig;
pub use error::{ApiError, AuthError, Result, StorageError};
pub use gate::{FormField, RequestBody, RequestGate, RequestOptions, ResponseBody};
pub use resources::{ContactFilter, Page, QuoteStatus};
