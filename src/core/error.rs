use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrudError {
    #[error("{operation} requires an entity with a key field or an `id` field ({model})")]
    MissingKey {
        operation: &'static str,
        model: &'static str,
    },

    #[error("Invalid key type for {model}: {reason}")]
    UnsupportedKeyType { model: &'static str, reason: String },

    #[error("GetListPaged is not supported with the {0} dialect")]
    PagingUnsupported(String),

    #[error("Page must be greater than 0, got {0}")]
    InvalidPage(u32),

    #[error("DeleteList requires a where clause containing the WHERE keyword")]
    DeleteListRequiresWhere,

    #[error("Composite key for {model} is missing a value for '{field}'")]
    CompositeKey { model: &'static str, field: String },

    #[error("Unknown dialect '{0}'")]
    UnknownDialect(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Column '{0}' not found in result row")]
    MissingColumn(String),

    #[error(transparent)]
    Execution(Box<dyn std::error::Error + Send + Sync>),
}

impl CrudError {
    /// Wraps a driver error without interpreting it.
    pub fn execution(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Execution(Box::new(err))
    }

    /// Configuration errors are raised before any SQL is produced and cannot be retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingKey { .. }
                | Self::UnsupportedKeyType { .. }
                | Self::PagingUnsupported(_)
                | Self::InvalidPage(_)
                | Self::DeleteListRequiresWhere
                | Self::CompositeKey { .. }
                | Self::UnknownDialect(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CrudError>;
