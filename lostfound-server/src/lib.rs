//! Lost & Found Server Library - REST API for the claim ledger
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod multipart;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod validation;

pub use auth::{AuthenticatedUser, Caller, TokenClaims, TokenIdentity, TokenVerifier};
pub use config::{CloudinaryConfig, Config};
pub use db::{store_from_config, PostgresStore};
pub use error::ApiError;
pub use handlers::Envelope;
pub use media::{uploader_from_config, CloudinaryUploader, DisabledUploader};
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
