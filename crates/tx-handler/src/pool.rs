use crate::transaction::{Output, TxHash};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Outpoint identifying one output of a previously accepted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: TxHash,
    pub index: u32,
}

impl Utxo {
    pub const fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.index)
    }
}

/// Serialized form of a single pool entry
#[derive(Serialize, Deserialize)]
struct PoolEntry {
    #[serde(flatten)]
    utxo: Utxo,
    #[serde(flatten)]
    output: Output,
}

/// Set of unspent transaction outputs.
///
/// `Clone` yields an independent snapshot; mutating the copy never affects
/// the original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoPool {
    utxos: HashMap<Utxo, Output>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    pub fn get(&self, utxo: &Utxo) -> Option<&Output> {
        self.utxos.get(utxo)
    }

    /// Insert `output` under `utxo`, replacing any previous entry wholesale
    pub fn add_utxo(&mut self, utxo: Utxo, output: Output) {
        self.utxos.insert(utxo, output);
    }

    pub fn remove_utxo(&mut self, utxo: &Utxo) -> Option<Output> {
        self.utxos.remove(utxo)
    }

    /// Every outpoint in the pool, in ascending order
    pub fn all_utxos(&self) -> Vec<Utxo> {
        let mut utxos: Vec<Utxo> = self.utxos.keys().copied().collect();
        utxos.sort_unstable();
        utxos
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utxo, &Output)> {
        self.utxos.iter()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}

impl FromIterator<(Utxo, Output)> for UtxoPool {
    fn from_iter<I: IntoIterator<Item = (Utxo, Output)>>(iter: I) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}

impl Serialize for UtxoPool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<PoolEntry> = self
            .utxos
            .iter()
            .map(|(utxo, output)| PoolEntry {
                utxo: *utxo,
                output: output.clone(),
            })
            .collect();
        entries.sort_unstable_by_key(|entry| entry.utxo);

        entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UtxoPool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<PoolEntry>::deserialize(deserializer)?;

        let mut utxos = HashMap::with_capacity(entries.len());
        for entry in entries {
            if utxos.insert(entry.utxo, entry.output).is_some() {
                return Err(de::Error::custom(format!(
                    "duplicate pool entry {}",
                    entry.utxo
                )));
            }
        }

        Ok(Self { utxos })
    }
}
