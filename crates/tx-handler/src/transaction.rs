use crate::crypto;
use crate::encoding::hex_bytes;
use crate::error::{Result, TxError};
use crate::pool::Utxo;
use rust_decimal::Decimal;
use secp256k1::SecretKey;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Monetary value carried by an output
pub type Amount = Decimal;

/// SHA-256 identifier of a transaction
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for TxHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl FromStr for TxHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;

        Ok(Self(bytes))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;

        encoded.parse().map_err(de::Error::custom)
    }
}

/// Claim on an output of a previous transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub prev_tx_hash: TxHash,
    pub output_index: u32,
    #[serde(with = "hex_bytes", default)]
    pub signature: Vec<u8>,
}

impl Input {
    pub const fn new(prev_tx_hash: TxHash, output_index: u32) -> Self {
        Self {
            prev_tx_hash,
            output_index,
            signature: Vec::new(),
        }
    }

    /// The pool entry this input claims
    pub const fn utxo(&self) -> Utxo {
        Utxo::new(self.prev_tx_hash, self.output_index)
    }
}

/// Value paid to the holder of `recipient`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    #[serde(with = "hex_bytes")]
    pub recipient: Vec<u8>,
    pub amount: Amount,
}

impl Output {
    pub const fn new(recipient: Vec<u8>, amount: Amount) -> Self {
        Self { recipient, amount }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.amount.serialize());
        write_len_prefixed(buf, &self.recipient);
    }
}

/// Candidate transaction spending pool entries into new outputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, prev_tx_hash: TxHash, output_index: u32) -> &mut Self {
        self.inputs.push(Input::new(prev_tx_hash, output_index));
        self
    }

    pub fn add_output(&mut self, recipient: Vec<u8>, amount: Amount) -> &mut Self {
        self.outputs.push(Output::new(recipient, amount));
        self
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&Input> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&Output> {
        self.outputs.get(index)
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Bytes the signature on input `index` must cover.
    ///
    /// Layout: the claimed outpoint (`prev_tx_hash ‖ output_index` as big-endian
    /// `u32`), followed by every output as `amount ‖ recipient_len ‖ recipient`.
    /// Signatures of other inputs are not covered, so inputs can be signed in
    /// any order.
    pub fn raw_data_to_sign(&self, index: usize) -> Result<Vec<u8>> {
        let input = self.input(index).ok_or(TxError::NoSuchInput(index))?;

        let mut buf = Vec::with_capacity(36 + self.outputs.len() * 56);
        buf.extend_from_slice(input.prev_tx_hash.as_bytes());
        buf.extend_from_slice(&input.output_index.to_be_bytes());
        for output in &self.outputs {
            output.write_to(&mut buf);
        }

        Ok(buf)
    }

    /// Canonical serialization the transaction hash is computed over
    pub fn raw_tx(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for input in &self.inputs {
            buf.extend_from_slice(input.prev_tx_hash.as_bytes());
            buf.extend_from_slice(&input.output_index.to_be_bytes());
            write_len_prefixed(&mut buf, &input.signature);
        }
        for output in &self.outputs {
            output.write_to(&mut buf);
        }

        buf
    }

    pub fn hash(&self) -> TxHash {
        TxHash(crypto::sha256(&self.raw_tx()))
    }

    /// Sign input `index` with `secret_key`, replacing any existing signature
    pub fn sign_input(&mut self, index: usize, secret_key: &SecretKey) -> Result<()> {
        let message = self.raw_data_to_sign(index)?;
        let signature = crypto::sign(secret_key, &message);

        self.inputs[index].signature = signature;

        Ok(())
    }
}

fn write_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    // Lengths beyond u32::MAX cannot come out of a decoded transaction
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
}
