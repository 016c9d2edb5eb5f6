//! Error types for the b2bua-core library
//!
//! The call-leg and relay state machines never surface errors through their
//! public contracts; these variants are produced by construction, config
//! loading, address parsing and header parsing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum B2buaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid relay address: {0}")]
    InvalidAddress(String),

    #[error("Invalid header value for {header}: {message}")]
    InvalidHeader { header: String, message: String },

    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl B2buaError {
    pub fn invalid_header(header: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            header: header.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, B2buaError>;
