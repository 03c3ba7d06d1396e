//! Cache facade error types

use thiserror::Error;

/// Cache facade errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached: I/O failure, refused or dropped
    /// connection, timeout.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Invalid TTL: {ttl_secs}s, expiration must be at least one second")]
    InvalidTtl { ttl_secs: u64 },

    #[error("Invalid key: key must not be empty")]
    EmptyKey,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// Whether this error means the transport itself is down.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_timeout()
        {
            Self::Connection(err.to_string())
        } else {
            Self::Redis(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(CacheError::Connection("refused".into()).is_transport());
        assert!(!CacheError::Redis("WRONGTYPE".into()).is_transport());
        assert!(!CacheError::EmptyKey.is_transport());
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_from_redis_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: CacheError = redis::RedisError::from(io).into();
        assert!(err.is_transport());

        let err: CacheError =
            redis::RedisError::from((redis::ErrorKind::TypeError, "bad type")).into();
        assert!(matches!(err, CacheError::Redis(_)));
    }
}
