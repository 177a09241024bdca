use thiserror::Error;

pub type HostResult<T> = Result<T, HostError>;

/// Failures of the host bridge itself, as opposed to rejections travelling
/// through a thenable chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host binding `{0}` is missing")]
    Missing(String),

    #[error("host binding `{name}` is not a {expected}")]
    Type {
        name: String,
        expected: &'static str,
    },

    #[error("host exception: {0}")]
    Host(String),
}

impl HostError {
    pub fn missing(name: impl Into<String>) -> Self {
        HostError::Missing(name.into())
    }

    pub fn type_mismatch(name: impl Into<String>, expected: &'static str) -> Self {
        HostError::Type {
            name: name.into(),
            expected,
        }
    }

    pub fn host(msg: impl Into<String>) -> Self {
        HostError::Host(msg.into())
    }
}
