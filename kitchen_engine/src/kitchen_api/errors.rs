use crate::{
    proof_storage::ProofStorageError,
    traits::{CartError, OrderFlowError, SettingsError},
};

impl From<SettingsError> for OrderFlowError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            SettingsError::InvalidSettings(s) => OrderFlowError::Validation(s),
        }
    }
}

impl From<SettingsError> for CartError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::DatabaseError(s) => CartError::DatabaseError(s),
            SettingsError::InvalidSettings(s) => CartError::Validation(s),
        }
    }
}

impl From<CartError> for OrderFlowError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            e => OrderFlowError::Validation(e.to_string()),
        }
    }
}

impl From<ProofStorageError> for OrderFlowError {
    fn from(e: ProofStorageError) -> Self {
        match e {
            ProofStorageError::InvalidFile(_) | ProofStorageError::TooLarge { .. } => {
                OrderFlowError::Validation(e.to_string())
            },
            ProofStorageError::NotFound(_) | ProofStorageError::IoError(_) => {
                OrderFlowError::StorageError(e.to_string())
            },
        }
    }
}
