use oddsbook_types::wager::LedgerError;
use thiserror::Error as ThisError;

/// Why a single instruction did not apply.
#[derive(Debug, ThisError)]
pub enum ExecutionError {
    /// The ledger refused the instruction; it is reported and the batch continues.
    #[error(transparent)]
    Rejected(#[from] LedgerError),
    /// Storage failed or held something unreadable; the batch stops at this instruction.
    #[error(transparent)]
    State(#[from] anyhow::Error),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
