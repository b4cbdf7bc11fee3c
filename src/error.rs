use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("no valid spawn point for jellyfish {index} after {attempts} attempts")]
    PlacementExhausted { index: usize, attempts: usize },
    #[error("invalid swarm config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
