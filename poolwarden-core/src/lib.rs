#![forbid(unsafe_code)]
//! Core of poolwarden: what the operator asks for, and what the pool engine gets.

pub mod artifact;
pub mod coin;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod generator;
pub mod settings;

pub use coin::Coin;
pub use config::RuntimeConfig;
pub use endpoint::{CacheEndpoint, DaemonEndpoint, Endpoints};
pub use error::{Error, Result};
pub use generator::{ArtifactSet, ConfigGenerator, GeneratorOptions, PoolKind};
pub use settings::{PoolSettings, RedactedSettings, ValidatedSettings, ValidationErrors};
