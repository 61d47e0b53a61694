//! Skip-the-line payment proofs.
//!
//! A payment processor (or an operator backfilling a manual CashApp / SEI
//! payment) mints a proof by signing the payment reference together with
//! the submission and reviewer it pays for, using the shared
//! `SKIP_PAYMENT_SECRET`. Verification here is pure; replay protection is
//! the `skip_receipts` table consumed inside the skip transaction.

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkipProof {
    /// Payment reference from the processor, unique per payment.
    pub reference: String,
    /// Hex SHA-256 over `reference:submission_id:reviewer_id:secret`.
    pub signature: String,
}

pub fn expected_signature(
    reference: &str,
    submission_id: &str,
    reviewer_id: &str,
    secret: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(b":");
    hasher.update(submission_id.as_bytes());
    hasher.update(b":");
    hasher.update(reviewer_id.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify(
    proof: &SkipProof,
    submission_id: &str,
    reviewer_id: &str,
    secret: &str,
) -> Result<()> {
    if proof.reference.trim().is_empty() || proof.signature.trim().is_empty() {
        return Err(Error::PaymentRequired(
            "payment proof with reference and signature is required".to_string(),
        ));
    }

    let expected = expected_signature(&proof.reference, submission_id, reviewer_id, secret);
    if !proof.signature.eq_ignore_ascii_case(&expected) {
        return Err(Error::PaymentRequired(format!(
            "payment proof {} failed verification",
            proof.reference
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_correctly_signed_proof() {
        let proof = SkipProof {
            reference: "pay_123".to_string(),
            signature: expected_signature("pay_123", "sub-1", "rev-1", "secret"),
        };
        assert!(verify(&proof, "sub-1", "rev-1", "secret").is_ok());
    }

    #[test]
    fn signature_is_case_insensitive_hex() {
        let proof = SkipProof {
            reference: "pay_123".to_string(),
            signature: expected_signature("pay_123", "sub-1", "rev-1", "secret").to_uppercase(),
        };
        assert!(verify(&proof, "sub-1", "rev-1", "secret").is_ok());
    }

    #[test]
    fn rejects_a_proof_signed_for_another_submission() {
        let proof = SkipProof {
            reference: "pay_123".to_string(),
            signature: expected_signature("pay_123", "sub-1", "rev-1", "secret"),
        };
        let err = verify(&proof, "sub-2", "rev-1", "secret").unwrap_err();
        assert!(matches!(err, Error::PaymentRequired(_)));
    }

    #[test]
    fn rejects_a_tampered_signature() {
        let proof = SkipProof {
            reference: "pay_123".to_string(),
            signature: "deadbeef".to_string(),
        };
        let err = verify(&proof, "sub-1", "rev-1", "secret").unwrap_err();
        assert!(matches!(err, Error::PaymentRequired(_)));
    }

    #[test]
    fn rejects_an_empty_proof() {
        let err = verify(&SkipProof::default(), "sub-1", "rev-1", "secret").unwrap_err();
        assert!(matches!(err, Error::PaymentRequired(_)));
    }
}
