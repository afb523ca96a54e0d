use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BucketNameError {
    #[error("{0}")]
    Validation(String),
    #[error("random source unavailable: {0}")]
    RandomnessUnavailable(String),
}

impl BucketNameError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
