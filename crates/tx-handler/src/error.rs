use crate::pool::Utxo;
use crate::transaction::Amount;
use thiserror::Error;

/// Reason a candidate transaction was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("input {input} claims {utxo}, which is not in the pool")]
    MissingUtxo { input: usize, utxo: Utxo },

    #[error("signature on input {0} does not verify")]
    InvalidSignature(usize),

    #[error("input {input} claims {utxo} a second time")]
    DoubleClaim { input: usize, utxo: Utxo },

    #[error("output {index} has negative amount {amount}")]
    NegativeOutput { index: usize, amount: Amount },

    #[error("input value {inputs} does not cover output value {outputs}")]
    InsufficientInputs { inputs: Amount, outputs: Amount },

    #[error("amount overflow")]
    Overflow,

    #[error("amount sum cannot be represented without rounding")]
    InexactSum,

    #[error("transaction has no input {0}")]
    NoSuchInput(usize),
}

pub type Result<T> = std::result::Result<T, TxError>;
