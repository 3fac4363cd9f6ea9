//! Shared building blocks for catalog ingestion pipeline stages.
//!
//! # Crate Structure
//!
//! - [`envelope`]: tracking envelopes, stamping, fan-out and destinations
//! - [`schema`]: catalog document schemas and validation
//!
//! Alongside the re-exports this crate holds the small pieces every stage
//! needs: identifier normalization ([`normalize_isrc`], [`normalize_upc`]),
//! provider filtering ([`should_ignore`], [`ProviderFilter`]), service
//! [`Settings`], and the per-message [`Stage`] returning a [`Disposition`].

pub mod config;
pub mod error;
pub mod ident;
pub mod provider;
pub mod stage;

/// Re-export envelope types.
pub mod envelope {
    pub use pipekit_envelope::*;
}

/// Re-export schema types.
pub mod schema {
    pub use pipekit_schema::*;
}

pub use config::{KafkaSettings, LogstashSettings, Settings};
pub use error::{ConfigError, StageError};
pub use ident::{normalize_isrc, normalize_upc};
pub use provider::{should_ignore, ProviderFilter};
pub use stage::{Abort, Disposition, Stage, DEFAULT_PROVIDER_POINTER};
