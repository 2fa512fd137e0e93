//! Error types for the sauti playback core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport failed: {0}")]
    Transport(String),

    #[error("Audio output unavailable: {0}")]
    OutputUnavailable(String),

    #[error("Stream cancelled")]
    Cancelled,

    #[error("Invalid playback state: {0}")]
    InvalidState(&'static str),

    #[error("Artifact error: {0}")]
    Artifact(String),
}

pub type Result<T> = std::result::Result<T, Error>;
