use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey, VerifyOnly};
use sha2::{Digest, Sha256};

/// SHA-256 digest of `data`
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Checks that `signature` was produced over `message` by the holder of `public_key`.
///
/// Implementations must treat undecodable keys or signatures as a failed
/// verification rather than an error, so that batch processing stays total.
pub trait SignatureVerifier {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}

/// secp256k1 ECDSA over the SHA-256 digest of the message.
///
/// Public keys are SEC1 encoded (compressed or uncompressed), signatures are DER.
#[derive(Debug, Clone)]
pub struct EcdsaVerifier {
    secp: Secp256k1<VerifyOnly>,
}

impl EcdsaVerifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for EcdsaVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for EcdsaVerifier {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(public_key) = PublicKey::from_slice(public_key) else {
            return false;
        };

        let Ok(signature) = Signature::from_der(signature) else {
            return false;
        };

        let message = Message::from_digest(sha256(message));

        self.secp
            .verify_ecdsa(&message, &signature, &public_key)
            .is_ok()
    }
}

/// Sign `message` with `secret_key`, returning a DER encoded signature that
/// [`EcdsaVerifier`] accepts.
pub fn sign(secret_key: &SecretKey, message: &[u8]) -> Vec<u8> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(sha256(message));

    secp.sign_ecdsa(&message, secret_key).serialize_der().to_vec()
}

/// Compressed SEC1 encoding of the public key belonging to `secret_key`
pub fn public_key_bytes(secret_key: &SecretKey) -> Vec<u8> {
    let secp = Secp256k1::signing_only();

    PublicKey::from_secret_key(&secp, secret_key)
        .serialize()
        .to_vec()
}
