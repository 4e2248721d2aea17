use crate::types::AgentId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Agent {agent} is already enrolled in the VIP")]
    AlreadyEnrolled { agent: AgentId },

    #[error("Agent {agent} is not enrolled in the VIP")]
    NotEnrolled { agent: AgentId },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
