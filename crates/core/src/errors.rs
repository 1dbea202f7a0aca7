use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown order status `{0}` (expected processing|shipped|delivered|cancelled)")]
    UnknownOrderStatus(String),
}

/// Failure reported by an order store collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("order store unavailable: {0}")]
    Unavailable(String),
    #[error("order record could not be decoded: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "store_unavailable",
            Self::Decode(_) => "store_decode",
        }
    }
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        Self::Decode(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{DomainError, StoreError};

    #[test]
    fn domain_error_maps_to_decode_store_error() {
        let error = StoreError::from(DomainError::UnknownOrderStatus("lost".to_owned()));

        assert!(matches!(error, StoreError::Decode(ref message) if message.contains("lost")));
        assert_eq!(error.error_class(), "store_decode");
    }

    #[test]
    fn unavailable_error_keeps_underlying_message() {
        let error = StoreError::Unavailable("database lock timeout".to_owned());

        assert_eq!(error.to_string(), "order store unavailable: database lock timeout");
        assert_eq!(error.error_class(), "store_unavailable");
    }
}
