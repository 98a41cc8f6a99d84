use thiserror::Error;

pub type RequestResult<T> = std::result::Result<T, RequestError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request returned no data")]
    Transport,
    #[error("request succeeded with zero features")]
    EmptyResult,
    #[error("failed to build request: {reason}")]
    Construction { reason: String },
    #[error("request function panicked")]
    RequestPanicked,
    #[error("a request is already in flight")]
    Busy,
}

impl RequestError {
    pub(crate) fn construction(reason: impl Into<String>) -> Self {
        Self::Construction {
            reason: reason.into(),
        }
    }
}
