use ethers::types::U256;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("router reverted: {0}")]
    Reverted(String),
    #[error("{0} is not supported by this router")]
    Unsupported(&'static str),
}

/// Reasons an `exchange` call reverts. None of them leave partial effects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Transfer failed")]
    TransferFailed,
    #[error("Approval failed")]
    ApprovalFailed,
    #[error("Insufficient output amount: wanted at least {minimum}, router returned {actual}")]
    InsufficientOutput { minimum: U256, actual: U256 },
    #[error(transparent)]
    Router(#[from] RouterError),
}

impl SettlementError {
    /// Revert string surfaced by the deployed contract.
    pub fn reason(&self) -> String {
        match self {
            SettlementError::InvalidAmount => "Invalid amount".to_string(),
            SettlementError::TransferFailed => "Transfer failed".to_string(),
            SettlementError::ApprovalFailed => "Approval failed".to_string(),
            SettlementError::InsufficientOutput { .. } => "Insufficient output amount".to_string(),
            SettlementError::Router(RouterError::Reverted(reason)) => reason.clone(),
            SettlementError::Router(err) => err.to_string(),
        }
    }
}
