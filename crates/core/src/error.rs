/// Broad failure categories that an outer layer maps to transport status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    BadRequest,
    Conflict,
    Unauthorised,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorised(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to read key material: {0}")]
    KeyRead(std::io::Error),
    #[error("failed to parse signing key: {0}")]
    KeyParse(String),
    #[error("failed to encode token claims: {0}")]
    TokenEncode(serde_json::Error),
    #[error("notification could not be delivered: {0}")]
    Notification(String),
    #[error("record store lock was poisoned")]
    StorePoisoned,
}

impl TrackerError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorised(msg: impl Into<String>) -> Self {
        Self::Unauthorised(msg.into())
    }

    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::NotFound(_) => ErrorKind::NotFound,
            TrackerError::Forbidden(_) => ErrorKind::Forbidden,
            TrackerError::BadRequest(_) | TrackerError::InvalidInput(_) => ErrorKind::BadRequest,
            TrackerError::Conflict(_) => ErrorKind::Conflict,
            TrackerError::Unauthorised(_) => ErrorKind::Unauthorised,
            TrackerError::Serialization(_)
            | TrackerError::KeyRead(_)
            | TrackerError::KeyParse(_)
            | TrackerError::TokenEncode(_)
            | TrackerError::Notification(_)
            | TrackerError::StorePoisoned => ErrorKind::Internal,
        }
    }
}

impl From<medtrack_types::TextError> for TrackerError {
    fn from(err: medtrack_types::TextError) -> Self {
        TrackerError::BadRequest(err.to_string())
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_variants() {
        assert_eq!(TrackerError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(TrackerError::conflict("x").kind(), ErrorKind::Conflict);
        assert_eq!(
            TrackerError::InvalidInput("x".into()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(TrackerError::StorePoisoned.kind(), ErrorKind::Internal);
    }

    #[test]
    fn text_errors_become_bad_requests() {
        let err: TrackerError = medtrack_types::TextError::Empty.into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}
