//! Single transaction validation against a pool snapshot.
//!
//! A transaction is valid if and only if:
//! 1. every output it claims is in the pool,
//! 2. the signature on each input verifies against the claimed output's recipient,
//! 3. no output is claimed more than once,
//! 4. every output amount is non-negative,
//! 5. the sum of input values is at least the sum of output values.
//!
//! The rules are independent predicates over the same snapshot, so the order
//! they are checked in only affects which [`TxError`] is reported.

use crate::crypto::SignatureVerifier;
use crate::error::{Result, TxError};
use crate::pool::UtxoPool;
use crate::transaction::{Amount, Transaction};
use std::collections::HashSet;

/// Validate `tx` against `utxo_pool`, returning the implicit fee on success
pub fn validate_tx<V>(utxo_pool: &UtxoPool, verifier: &V, tx: &Transaction) -> Result<Amount>
where
    V: SignatureVerifier + ?Sized,
{
    let mut claimed = HashSet::with_capacity(tx.num_inputs());
    let mut input_sum = Amount::ZERO;

    for (i, input) in tx.inputs().iter().enumerate() {
        let utxo = input.utxo();

        let output = utxo_pool
            .get(&utxo)
            .ok_or(TxError::MissingUtxo { input: i, utxo })?;

        if !claimed.insert(utxo) {
            return Err(TxError::DoubleClaim { input: i, utxo });
        }

        let message = tx.raw_data_to_sign(i)?;
        if !verifier.verify(&output.recipient, &message, &input.signature) {
            return Err(TxError::InvalidSignature(i));
        }

        input_sum = exact_add(input_sum, output.amount)?;
    }

    let mut output_sum = Amount::ZERO;

    for (index, output) in tx.outputs().iter().enumerate() {
        if output.amount < Amount::ZERO {
            return Err(TxError::NegativeOutput {
                index,
                amount: output.amount,
            });
        }

        output_sum = exact_add(output_sum, output.amount)?;
    }

    if input_sum < output_sum {
        return Err(TxError::InsufficientInputs {
            inputs: input_sum,
            outputs: output_sum,
        });
    }

    Ok(input_sum - output_sum)
}

/// Add two amounts, refusing any result `Decimal` would have to round.
///
/// A sum that no longer fits the 96-bit mantissa at the wider operand scale is
/// rescaled with rounding instead of failing, which would let a tiny output
/// disappear from a total.
pub(crate) fn exact_add(sum: Amount, amount: Amount) -> Result<Amount> {
    let total = sum.checked_add(amount).ok_or(TxError::Overflow)?;

    if !sum.is_zero() && !amount.is_zero() && total.scale() < sum.scale().max(amount.scale()) {
        return Err(TxError::InexactSum);
    }

    Ok(total)
}

/// Whether `tx` passes every rule of [`validate_tx`]
pub fn is_valid_tx<V>(utxo_pool: &UtxoPool, verifier: &V, tx: &Transaction) -> bool
where
    V: SignatureVerifier + ?Sized,
{
    validate_tx(utxo_pool, verifier, tx).is_ok()
}
