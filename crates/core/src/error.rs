use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::Parse("Failed to parse query".to_string());
        assert_eq!(error.to_string(), "Failed to parse query");

        let error = CoreError::validation("shard count must be at least 1");
        assert!(error.to_string().contains("shard count"));
        assert!(!error.is_parse());
    }
}
