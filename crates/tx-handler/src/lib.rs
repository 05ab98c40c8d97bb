pub mod crypto;
mod encoding;
pub mod error;
pub mod handler;
pub mod pool;
pub mod transaction;
pub mod validator;

pub use crypto::{EcdsaVerifier, SignatureVerifier};
pub use error::TxError;
pub use handler::{EpochReport, Rejection, TxHandler};
pub use pool::{Utxo, UtxoPool};
pub use transaction::{Amount, Input, Output, Transaction, TxHash};

/// Process one epoch of candidate transactions against `utxo_pool` and return
/// the accepted transactions together with the updated pool
pub fn process_epoch(
    utxo_pool: UtxoPool,
    possible_txs: impl IntoIterator<Item = Transaction>,
) -> (Vec<Transaction>, UtxoPool) {
    let mut handler = TxHandler::new(utxo_pool);

    let accepted = handler.process_epoch(possible_txs);

    (accepted, handler.into_utxo_pool())
}
