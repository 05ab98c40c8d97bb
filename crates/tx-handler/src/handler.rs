use crate::crypto::{EcdsaVerifier, SignatureVerifier};
use crate::error::{Result, TxError};
use crate::pool::{Utxo, UtxoPool};
use crate::transaction::{Amount, Transaction, TxHash};
use crate::validator;
use tracing::{debug, info, warn};

/// Candidate that did not make it into the accepted set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Position of the candidate in the epoch's input order
    pub position: usize,
    pub tx_hash: TxHash,
    pub reason: TxError,
}

/// Outcome of one epoch
#[derive(Debug, Clone)]
pub struct EpochReport {
    /// Accepted transactions, in input order
    pub accepted: Vec<Transaction>,
    pub rejected: Vec<Rejection>,
    /// Sum of the implicit fees of the accepted transactions, `None` once the
    /// total is no longer exactly representable
    pub fees: Option<Amount>,
}

impl Default for EpochReport {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            rejected: Vec::new(),
            fees: Some(Amount::ZERO),
        }
    }
}

/// Owns the current UTXO pool and advances it one epoch at a time.
///
/// Candidates are applied greedily in the order given: each one is validated
/// against the pool as left by every candidate accepted before it. An output
/// spent earlier in the epoch cannot be spent again, and an output created
/// earlier in the epoch can be spent by a later candidate. When two
/// candidates conflict, the first one wins.
#[derive(Debug, Clone)]
pub struct TxHandler<V = EcdsaVerifier> {
    utxo_pool: UtxoPool,
    verifier: V,
}

impl TxHandler {
    pub fn new(utxo_pool: UtxoPool) -> Self {
        Self::with_verifier(utxo_pool, EcdsaVerifier::new())
    }
}

impl Default for TxHandler {
    fn default() -> Self {
        Self::new(UtxoPool::new())
    }
}

impl<V: SignatureVerifier> TxHandler<V> {
    pub const fn with_verifier(utxo_pool: UtxoPool, verifier: V) -> Self {
        Self {
            utxo_pool,
            verifier,
        }
    }

    pub const fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    /// Replace the held pool wholesale
    pub fn set_utxo_pool(&mut self, utxo_pool: UtxoPool) {
        self.utxo_pool = utxo_pool;
    }

    pub fn into_utxo_pool(self) -> UtxoPool {
        self.utxo_pool
    }

    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        validator::is_valid_tx(&self.utxo_pool, &self.verifier, tx)
    }

    /// Validate `tx` against the current pool, returning its implicit fee
    pub fn validate_tx(&self, tx: &Transaction) -> Result<Amount> {
        validator::validate_tx(&self.utxo_pool, &self.verifier, tx)
    }

    /// Process one epoch and return the accepted transactions in input order
    pub fn process_epoch(
        &mut self,
        possible_txs: impl IntoIterator<Item = Transaction>,
    ) -> Vec<Transaction> {
        self.process_epoch_with_report(possible_txs).accepted
    }

    /// Process one epoch, also reporting why each rejected candidate failed
    pub fn process_epoch_with_report(
        &mut self,
        possible_txs: impl IntoIterator<Item = Transaction>,
    ) -> EpochReport {
        let mut report = EpochReport::default();

        for (position, tx) in possible_txs.into_iter().enumerate() {
            match self.validate_tx(&tx) {
                Ok(fee) => {
                    let tx_hash = self.apply(&tx);
                    debug!("Accepted transaction {tx_hash} with fee {fee}");

                    report.fees = report.fees.and_then(|total| {
                        validator::exact_add(total, fee)
                            .map_err(|e| warn!("Epoch fee total dropped: {e}"))
                            .ok()
                    });
                    report.accepted.push(tx);
                }
                Err(reason) => {
                    let tx_hash = tx.hash();
                    debug!("Rejected transaction {tx_hash}: {reason}");

                    report.rejected.push(Rejection {
                        position,
                        tx_hash,
                        reason,
                    });
                }
            }
        }

        info!(
            "Epoch accepted {} transactions, rejected {}, pool now holds {} outputs",
            report.accepted.len(),
            report.rejected.len(),
            self.utxo_pool.len()
        );

        report
    }

    /// Consume the inputs of an already validated `tx` and add its outputs
    fn apply(&mut self, tx: &Transaction) -> TxHash {
        for input in tx.inputs() {
            self.utxo_pool.remove_utxo(&input.utxo());
        }

        let tx_hash = tx.hash();
        for (index, output) in (0u32..).zip(tx.outputs()) {
            self.utxo_pool
                .add_utxo(Utxo::new(tx_hash, index), output.clone());
        }

        tx_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::public_key_bytes;
    use crate::transaction::Output;
    use rust_decimal::Decimal;
    use secp256k1::SecretKey;

    fn secret(byte: u8) -> SecretKey {
        SecretKey::from_slice(&[byte; 32]).unwrap()
    }

    fn key(byte: u8) -> Vec<u8> {
        public_key_bytes(&secret(byte))
    }

    fn h0() -> TxHash {
        TxHash::new([0; 32])
    }

    fn initial_pool() -> UtxoPool {
        let mut pool = UtxoPool::new();
        pool.add_utxo(Utxo::new(h0(), 0), Output::new(key(1), Decimal::from(10)));
        pool
    }

    /// One-input transaction claiming `(prev, index)`, signed by `signer`
    fn transfer(prev: TxHash, index: u32, signer: u8, outputs: &[(u8, i64)]) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(prev, index);
        for (recipient, amount) in outputs {
            tx.add_output(key(*recipient), Decimal::from(*amount));
        }
        tx.sign_input(0, &secret(signer)).unwrap();
        tx
    }

    #[test]
    fn test_end_to_end_single_transfer() {
        let mut handler = TxHandler::new(initial_pool());
        let t1 = transfer(h0(), 0, 1, &[(2, 10)]);

        assert!(handler.is_valid_tx(&t1));

        let accepted = handler.process_epoch(vec![t1.clone()]);
        assert_eq!(accepted, vec![t1.clone()]);

        let expected: UtxoPool = [(
            Utxo::new(t1.hash(), 0),
            Output::new(key(2), Decimal::from(10)),
        )]
        .into_iter()
        .collect();
        assert_eq!(handler.utxo_pool(), &expected);
    }

    #[test]
    fn test_conflicting_candidates_first_wins() {
        let t1 = transfer(h0(), 0, 1, &[(2, 10)]);
        let t2 = transfer(h0(), 0, 1, &[(3, 10)]);

        let mut handler = TxHandler::new(initial_pool());
        assert_eq!(handler.process_epoch(vec![t1.clone(), t2.clone()]), vec![t1.clone()]);
        assert!(handler.utxo_pool().contains(&Utxo::new(t1.hash(), 0)));
        assert!(!handler.utxo_pool().contains(&Utxo::new(t2.hash(), 0)));

        let mut handler = TxHandler::new(initial_pool());
        assert_eq!(handler.process_epoch(vec![t2.clone(), t1.clone()]), vec![t2.clone()]);
        assert!(handler.utxo_pool().contains(&Utxo::new(t2.hash(), 0)));
        assert!(!handler.utxo_pool().contains(&Utxo::new(t1.hash(), 0)));
    }

    #[test]
    fn test_same_epoch_chain() {
        let t1 = transfer(h0(), 0, 1, &[(2, 6), (3, 4)]);
        let t2 = transfer(t1.hash(), 0, 2, &[(4, 6)]);

        let mut handler = TxHandler::new(initial_pool());
        let accepted = handler.process_epoch(vec![t1.clone(), t2.clone()]);

        assert_eq!(accepted, vec![t1.clone(), t2.clone()]);
        let pool = handler.utxo_pool();
        assert!(!pool.contains(&Utxo::new(h0(), 0)));
        assert!(!pool.contains(&Utxo::new(t1.hash(), 0)));
        assert!(pool.contains(&Utxo::new(t1.hash(), 1)));
        assert!(pool.contains(&Utxo::new(t2.hash(), 0)));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_chain_out_of_order_rejects_child() {
        let t1 = transfer(h0(), 0, 1, &[(2, 10)]);
        let t2 = transfer(t1.hash(), 0, 2, &[(4, 10)]);

        let mut handler = TxHandler::new(initial_pool());
        let accepted = handler.process_epoch(vec![t2, t1.clone()]);

        assert_eq!(accepted, vec![t1]);
    }

    #[test]
    fn test_rejected_candidate_leaves_pool_untouched() {
        let mut handler = TxHandler::new(initial_pool());
        let overspend = transfer(h0(), 0, 1, &[(2, 11)]);

        assert!(handler.process_epoch(vec![overspend]).is_empty());
        assert_eq!(handler.utxo_pool(), &initial_pool());
    }

    #[test]
    fn test_already_spent_in_previous_epoch() {
        let t1 = transfer(h0(), 0, 1, &[(2, 10)]);
        let mut handler = TxHandler::new(initial_pool());

        assert_eq!(handler.process_epoch(vec![t1.clone()]).len(), 1);
        assert!(handler.process_epoch(vec![t1]).is_empty());
    }

    #[test]
    fn test_report_collects_fees_and_reasons() {
        let t1 = transfer(h0(), 0, 1, &[(2, 7)]);
        let t2 = transfer(h0(), 0, 1, &[(3, 1)]);

        let mut handler = TxHandler::new(initial_pool());
        let report = handler.process_epoch_with_report(vec![t1.clone(), t2.clone()]);

        assert_eq!(report.accepted, vec![t1]);
        assert_eq!(report.fees, Some(Decimal::from(3)));
        assert_eq!(
            report.rejected,
            vec![Rejection {
                position: 1,
                tx_hash: t2.hash(),
                reason: TxError::MissingUtxo {
                    input: 0,
                    utxo: Utxo::new(h0(), 0),
                },
            }]
        );
    }

    #[test]
    fn test_fee_total_overflow_is_flagged() {
        struct AcceptAll;

        impl SignatureVerifier for AcceptAll {
            fn verify(&self, _: &[u8], _: &[u8], _: &[u8]) -> bool {
                true
            }
        }

        // Two outputs of Decimal::MAX, each burned entirely as fee
        let pool: UtxoPool = (0..2)
            .map(|index| (Utxo::new(h0(), index), Output::new(key(1), Decimal::MAX)))
            .collect();
        let burns: Vec<Transaction> = (0..2)
            .map(|index| {
                let mut tx = Transaction::new();
                tx.add_input(h0(), index);
                tx
            })
            .collect();

        let mut handler = TxHandler::with_verifier(pool, AcceptAll);
        let report = handler.process_epoch_with_report(burns);

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.fees, None);
        assert!(handler.utxo_pool().is_empty());
    }

    #[test]
    fn test_empty_epoch_has_zero_fees() {
        let mut handler = TxHandler::new(initial_pool());

        assert_eq!(
            handler.process_epoch_with_report(Vec::new()).fees,
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn test_set_utxo_pool_replaces_wholesale() {
        let mut handler: TxHandler = TxHandler::default();
        assert!(handler.utxo_pool().is_empty());

        let t1 = transfer(h0(), 0, 1, &[(2, 10)]);
        assert!(!handler.is_valid_tx(&t1));

        handler.set_utxo_pool(initial_pool());
        assert!(handler.is_valid_tx(&t1));

        let mut replacement = UtxoPool::new();
        replacement.add_utxo(Utxo::new(h0(), 1), Output::new(key(1), Decimal::ONE));
        handler.set_utxo_pool(replacement.clone());
        assert_eq!(handler.into_utxo_pool(), replacement);
    }

    #[test]
    fn test_caller_snapshot_is_untouched() {
        let snapshot = initial_pool();
        let mut handler = TxHandler::new(snapshot.clone());

        handler.process_epoch(vec![transfer(h0(), 0, 1, &[(2, 10)])]);

        assert!(snapshot.contains(&Utxo::new(h0(), 0)));
        assert!(!handler.utxo_pool().contains(&Utxo::new(h0(), 0)));
    }
}
