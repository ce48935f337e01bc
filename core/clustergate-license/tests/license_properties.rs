//! Property-based tests for signed licenses.
//!
//! - Any token signed with the matching key verifies
//! - Encoding is deterministic
//! - Flipping any byte of the signed payload breaks verification
//! - Enterprise binding holds regardless of the window

mod common;

use base64::{engine::general_purpose::STANDARD, Engine};
use clustergate_license::{
    validate_token, LicenseToken, Rejection, SignatureVerifier, UNLIMITED,
};
use ed25519_dalek::SigningKey;
use proptest::prelude::*;

fn token_strategy() -> impl Strategy<Value = LicenseToken> {
    (
        "[A-Z]{1,4}-[0-9]{1,6}",
        "[a-zA-Z ]{1,24}",
        "ent-[a-z0-9]{1,12}",
        prop::collection::vec("[a-z]{1,10}", 0..4),
        0i64..2_000_000_000,
        0i64..100_000_000,
        prop_oneof![Just(UNLIMITED), 0i64..1000],
    )
        .prop_map(|(code, company, enterprise_id, plugins, start_at, span, limit)| {
            LicenseToken {
                code,
                company,
                contact: String::new(),
                enterprise_id,
                cluster_id: String::new(),
                tier: "advanced".to_string(),
                allowed_plugins: plugins,
                start_at,
                expire_at: start_at + span,
                subscribe_until: 0,
                cluster_limit: limit,
                node_limit: limit,
                memory_limit: UNLIMITED,
                cpu_limit: UNLIMITED,
                signature: String::new(),
            }
        })
}

fn key_strategy() -> impl Strategy<Value = SigningKey> {
    any::<[u8; 32]>().prop_map(|seed| SigningKey::from_bytes(&seed))
}

fn verifier_for(sk: &SigningKey) -> SignatureVerifier {
    SignatureVerifier::from_bytes(&sk.verifying_key().to_bytes()).unwrap()
}

proptest! {
    #[test]
    fn signed_tokens_verify(token in token_strategy(), sk in key_strategy()) {
        let signed = common::sign(&sk, token);
        prop_assert!(verifier_for(&sk).verify(&signed).is_ok());
    }

    #[test]
    fn artifact_roundtrip_verifies(token in token_strategy(), sk in key_strategy()) {
        let signed = common::sign(&sk, token);
        let decoded = LicenseToken::decode(&signed.to_artifact()).unwrap();
        prop_assert_eq!(&decoded, &signed);
        prop_assert!(verifier_for(&sk).verify(&decoded).is_ok());
    }

    #[test]
    fn encoding_is_deterministic(token in token_strategy()) {
        prop_assert_eq!(token.encode(), token.clone().encode());
    }

    #[test]
    fn payload_byte_flip_breaks_signature(
        token in token_strategy(),
        sk in key_strategy(),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let signed = common::sign(&sk, token);
        let mut payload = signed.encode();
        let i = index.index(payload.len());
        payload[i] ^= flip;

        let signature = ed25519_dalek::Signature::from_slice(
            &STANDARD.decode(&signed.signature).unwrap(),
        )
        .unwrap();
        prop_assert!(sk.verifying_key().verify_strict(&payload, &signature).is_err());
    }

    #[test]
    fn enterprise_binding_always_holds(
        token in token_strategy(),
        sk in key_strategy(),
        other in "ent-[a-z0-9]{1,12}",
    ) {
        prop_assume!(other != token.enterprise_id);
        let signed = common::sign(&sk, token);
        let now = signed.start_at;
        let result = validate_token(&verifier_for(&sk), &signed, Some(&other), now);
        let is_mismatch = matches!(result, Err(Rejection::EnterpriseMismatch { .. }));
        prop_assert!(is_mismatch);
    }
}
