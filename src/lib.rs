//! Respite - resilient stress-relief suggestion pipeline
//!
//! A request flows through [`service::SuggestionService`]: the response
//! cache first, then the generative service through a rotating pool of API
//! keys, and finally a curated pool of pre-authored activities. Every request
//! yields three suggestions.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod keys;
pub mod models;
pub mod output;
pub mod service;

pub use error::{Error, Result};
