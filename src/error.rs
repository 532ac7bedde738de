use crate::core::trace::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrompterError {
    #[error("Transport Error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider Error {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Schema Validation Failed in {stage}: {reason}")]
    SchemaValidation { stage: Stage, reason: String },

    #[error("Interrupted by user")]
    Interrupted,

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Session Error: {0}")]
    Session(String),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrompterError {
    /// True when the LLM call itself failed (network, auth, provider status).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Provider { .. })
    }
}
