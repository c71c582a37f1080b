//! Interaction request signature verification.
//!
//! Discord signs `timestamp || body` with the application's ed25519 key and
//! sends the hex signature in `X-Signature-Ed25519`.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("invalid public key: {0}")]
    PublicKey(String),

    #[error("malformed signature")]
    MalformedSignature,

    #[error("signature does not match")]
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn from_hex(public_key: &str) -> Result<Self, VerifyError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| VerifyError::PublicKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VerifyError::PublicKey("expected 32 bytes".to_string()))?;
        let key =
            VerifyingKey::from_bytes(&bytes).map_err(|e| VerifyError::PublicKey(e.to_string()))?;
        Ok(Self { key })
    }

    pub fn verify(&self, timestamp: &str, signature: &str, body: &[u8]) -> Result<(), VerifyError> {
        let signature = hex::decode(signature).map_err(|_| VerifyError::MalformedSignature)?;
        let signature =
            Signature::from_slice(&signature).map_err(|_| VerifyError::MalformedSignature)?;

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &signature)
            .map_err(|_| VerifyError::Mismatch)
    }
}
