//! Message layout and signer recovery.
//!
//! This is the one place where bit-exact compatibility with off-chain signing
//! tooling matters. Every signed message is the `keccak256` of the tightly
//! packed (`abi.encodePacked`) fields, and the signer signs that 32-byte hash
//! as an EIP-191 personal message:
//!
//! ```text
//! message = keccak256(field_0 ‖ field_1 ‖ …)          // addresses are 20 bytes
//! digest  = keccak256("\x19Ethereum Signed Message:\n32" ‖ message)
//! ```
//!
//! which matches `ethers.utils.solidityKeccak256` followed by
//! `Wallet.signMessage(arrayify(hash))`.

use alloy_primitives::{Address, B256, Signature, U256, eip191_hash_message, keccak256, uint};
use alloy_sol_types::SolValue;

/// Length of a `r ‖ s ‖ v` recoverable signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Half of the secp256k1 group order. Signatures with `s` above this value are
/// the malleable twin of a canonical signature and are rejected.
const SECP256K1N_HALF: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Message the verification key signs for a fungible-token link:
/// `keccak256(link_key ‖ referral)`.
#[must_use]
pub fn link_key_message(link_key: Address, referral: Address) -> B256 {
    keccak256((link_key, referral).abi_encode_packed())
}

/// Message the verification key signs for a link that binds no referral:
/// `keccak256(link_key)`.
#[must_use]
pub fn link_key_message_simple(link_key: Address) -> B256 {
    keccak256(link_key.abi_encode_packed())
}

/// Message the link key signs to name its receiver: `keccak256(receiver)`.
#[must_use]
pub fn receiver_message(receiver: Address) -> B256 {
    keccak256(receiver.abi_encode_packed())
}

/// Digest actually covered by the signature: the EIP-191 personal message hash
/// of the 32-byte `message`.
#[must_use]
pub fn signing_digest(message: B256) -> B256 {
    eip191_hash_message(message)
}

/// Recovers the address that signed `message` as a personal message.
///
/// Returns `None` for anything that cannot be a canonical signature: wrong
/// length, an invalid recovery id, an upper-half `s`, or a point that does not
/// recover.
#[must_use]
pub fn recover_signer(message: B256, signature: &[u8]) -> Option<Address> {
    if signature.len() != SIGNATURE_LENGTH {
        return None;
    }
    let signature = Signature::from_raw(signature).ok()?;
    if signature.s() > SECP256K1N_HALF {
        return None;
    }
    signature
        .recover_address_from_prehash(&signing_digest(message))
        .ok()
}

/// Returns `true` iff `signature` over `message` recovers to `expected`.
///
/// Recovery failure is indistinguishable from a signature by someone else.
#[must_use]
pub fn verify_signature(message: B256, signature: &[u8], expected: Address) -> bool {
    recover_signer(message, signature).is_some_and(|signer| signer == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flip_byte, sign, signer};

    /// secp256k1 group order.
    const SECP256K1N: U256 =
        uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

    #[test]
    fn test_packed_layout_is_concatenated_addresses() {
        let a = Address::repeat_byte(0x11);
        let b = Address::repeat_byte(0x22);
        let mut packed = Vec::with_capacity(40);
        packed.extend_from_slice(a.as_slice());
        packed.extend_from_slice(b.as_slice());
        assert_eq!(link_key_message(a, b), keccak256(&packed));
        assert_eq!(link_key_message_simple(a), keccak256(a.as_slice()));
        assert_eq!(receiver_message(b), keccak256(b.as_slice()));
    }

    #[test]
    fn test_recover_signer_matches_personal_sign() {
        let key = signer(1);
        let message = receiver_message(Address::repeat_byte(0xAB));
        let signature = sign(&key, message);
        assert_eq!(recover_signer(message, &signature), Some(key.address()));
        assert!(verify_signature(message, &signature, key.address()));
    }

    #[test]
    fn test_other_signer_does_not_verify() {
        let key = signer(1);
        let other = signer(2);
        let message = receiver_message(Address::repeat_byte(0xAB));
        let signature = sign(&other, message);
        assert!(!verify_signature(message, &signature, key.address()));
    }

    #[test]
    fn test_every_single_byte_mutation_fails() {
        let key = signer(3);
        let message = link_key_message(Address::repeat_byte(1), Address::ZERO);
        let signature = sign(&key, message);
        for index in 0..SIGNATURE_LENGTH {
            let mutated = flip_byte(&signature, index);
            assert!(
                !verify_signature(message, &mutated, key.address()),
                "mutation at byte {index} still verified"
            );
        }
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let key = signer(4);
        let message = receiver_message(Address::repeat_byte(7));
        let signature = sign(&key, message);
        assert!(!verify_signature(message, &signature[..64], key.address()));
        let mut longer = signature.to_vec();
        longer.push(0);
        assert!(!verify_signature(message, &longer, key.address()));
        assert!(!verify_signature(message, &[], key.address()));
    }

    #[test]
    fn test_invalid_recovery_id_is_rejected() {
        let key = signer(5);
        let message = receiver_message(Address::repeat_byte(7));
        let mut signature = sign(&key, message).to_vec();
        signature[64] = 29;
        assert_eq!(recover_signer(message, &signature), None);
    }

    #[test]
    fn test_low_recovery_id_is_accepted() {
        let key = signer(6);
        let message = receiver_message(Address::repeat_byte(9));
        let mut signature = sign(&key, message).to_vec();
        signature[64] -= 27;
        assert!(verify_signature(message, &signature, key.address()));
    }

    #[test]
    fn test_high_s_twin_is_rejected() {
        let key = signer(7);
        let message = receiver_message(Address::repeat_byte(9));
        let signature = Signature::from_raw(&sign(&key, message)).unwrap();
        let twin = Signature::new(signature.r(), SECP256K1N - signature.s(), !signature.v());
        assert!(!verify_signature(message, &twin.as_bytes(), key.address()));
    }
}
