use thiserror::Error;

/// Errors surfaced by the fetch/store/train pipeline.
///
/// A failure aborts the current command; nothing is retried automatically.
/// Individual malformed records in an API batch are not errors at all: the
/// fetcher drops them and reports a skip count instead.
#[derive(Debug, Error)]
pub enum LottoError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed API payload: {reason}")]
    Parse { reason: String },

    #[error("storage backend failure: {reason}")]
    Storage { reason: String },

    #[error("invalid draw {id}: {reason}")]
    InvalidDraw { id: u32, reason: String },

    #[error("not enough draws to train: have {available}, need at least {required}")]
    InsufficientData { available: usize, required: usize },
}

impl From<csv::Error> for LottoError {
    fn from(e: csv::Error) -> Self {
        LottoError::Storage {
            reason: e.to_string(),
        }
    }
}

impl From<std::io::Error> for LottoError {
    fn from(e: std::io::Error) -> Self {
        LottoError::Storage {
            reason: e.to_string(),
        }
    }
}

impl From<redis::RedisError> for LottoError {
    fn from(e: redis::RedisError) -> Self {
        LottoError::Storage {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_draw_formatting() {
        let err = LottoError::InvalidDraw {
            id: 3104,
            reason: "expected 15 numbers, got 14".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("3104"));
        assert!(msg.contains("15"));
    }

    #[test]
    fn test_insufficient_data_formatting() {
        let err = LottoError::InsufficientData {
            available: 3,
            required: 10,
        };

        let msg = err.to_string();
        assert!(msg.contains("have 3"));
        assert!(msg.contains("at least 10"));
    }
}
