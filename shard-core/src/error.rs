use crate::SemanticType;
use thiserror::Error;

/// Failures raised by the mapper itself, as opposed to the ones reported by the driver.
///
/// Travels inside [`crate::Error`], recover it with `err.downcast_ref::<OrmError>()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrmError {
    #[error("Model `{0}` is already registered")]
    DuplicateModel(String),
    #[error("Model `{0}` declares neither a primary key nor a unique key")]
    MissingKey(String),
    #[error("Field `{model}.{field}` has unsupported type `{type_name}`")]
    UnsupportedFieldType {
        model: String,
        field: String,
        type_name: String,
    },
    #[error("Model `{model}` declares more than one {role} (`{first}` and `{second}`)")]
    DuplicateKey {
        model: String,
        role: &'static str,
        first: String,
        second: String,
    },
    #[error("Model `{model}` maps more than one field to column `{column}`")]
    DuplicateColumn { model: String, column: String },
    #[error("Model `{0}` is not registered")]
    UnknownModel(String),
    #[error("Model `{model}` has no column `{column}`")]
    UnknownColumn { model: String, column: String },
    #[error("Cannot update key column `{column}` of model `{model}`")]
    CannotUpdateKey { model: String, column: String },
    #[error("Model `{0}` has no key to use as a condition")]
    UnknownConditionColumn(String),
    #[error("No rows found")]
    NoRowsFound,
    #[error("Transaction already began")]
    TransactionAlreadyBegan,
    #[error("Transaction not began")]
    TransactionNotBegan,
    #[error("Database alias `{0}` is not registered")]
    UnknownAlias(String),
    #[error("Database alias `{0}` is already registered")]
    DuplicateAlias(String),
    #[error("Cannot decode {value} as {semantic}")]
    Decoding {
        semantic: SemanticType,
        value: String,
    },
}

/// Coarse grouping of [`OrmError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    QueryConstruction,
    Execution,
    Decoding,
}

impl OrmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrmError::DuplicateModel(..)
            | OrmError::MissingKey(..)
            | OrmError::UnsupportedFieldType { .. }
            | OrmError::DuplicateKey { .. }
            | OrmError::DuplicateColumn { .. }
            | OrmError::UnknownModel(..) => ErrorKind::Schema,
            OrmError::UnknownColumn { .. }
            | OrmError::CannotUpdateKey { .. }
            | OrmError::UnknownConditionColumn(..) => ErrorKind::QueryConstruction,
            OrmError::NoRowsFound
            | OrmError::TransactionAlreadyBegan
            | OrmError::TransactionNotBegan
            | OrmError::UnknownAlias(..)
            | OrmError::DuplicateAlias(..) => ErrorKind::Execution,
            OrmError::Decoding { .. } => ErrorKind::Decoding,
        }
    }
}

/// Wrap into a [`crate::Error`] and log it.
pub(crate) fn logged(error: OrmError) -> crate::Error {
    let error = crate::Error::new(error);
    log::error!("{:#}", error);
    error
}

/// Returns the [`OrmError`] carried by `error`, if any.
pub fn orm_error(error: &crate::Error) -> Option<&OrmError> {
    error.downcast_ref::<OrmError>()
}
