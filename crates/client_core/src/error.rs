use shared::{
    domain::AreaId,
    error::{ApiError, ErrorCode},
    protocol::UnknownVerb,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("area {} not found", area_id.0)]
    NotFound { area_id: AreaId },
    #[error("transport failure: {0:#}")]
    Transport(#[source] anyhow::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Validation(_) => ErrorCode::Validation,
            ClientError::NotFound { .. } => ErrorCode::NotFound,
            ClientError::Transport(_) => ErrorCode::Transport,
        }
    }
}

impl From<UnknownVerb> for ClientError {
    fn from(value: UnknownVerb) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<&ClientError> for ApiError {
    fn from(value: &ClientError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}
