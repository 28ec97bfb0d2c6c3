//! Errors raised by queries and configuration loading.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Unable to find an element {query}\n\n{dom}")]
    NotFound { query: String, dom: String },

    #[error("Found {count} elements {query}, expected one\n\n{dom}")]
    Multiple {
        query: String,
        count: usize,
        dom: String,
    },

    #[error("no custom query named `{0}` is registered")]
    UnknownQuery(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load testing config: {0}")]
    Load(#[from] config::ConfigError),
}
