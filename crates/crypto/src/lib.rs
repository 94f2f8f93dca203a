// Copyright (C) 2024-2026 The Meridian Project.
//
// lib.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Key handling for the Meridian ledger client SDK.
//!
//! The rest of the workspace consumes keys as an opaque capability: a
//! [`PrivateKey`] signs bytes, a [`PublicKey`] verifies them, and nothing
//! else leaks through. The ledger's signature scheme is ed25519.

mod key;

pub use key::{PrivateKey, PublicKey, Signature, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

use sha2::{Digest, Sha384};

/// SHA-384 digest used for transaction hashes.
pub fn sha384(bytes: &[u8]) -> [u8; 48] {
    let mut hasher = Sha384::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha384_known_vector() {
        // SHA-384 of the empty string.
        let digest = sha384(b"");
        assert_eq!(
            hex::encode(digest),
            "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da\
             274edebfe76f65fbd51ad2f14898b95b"
        );
    }

    #[test]
    fn test_sha384_is_deterministic() {
        assert_eq!(sha384(b"meridian"), sha384(b"meridian"));
        assert_ne!(sha384(b"meridian"), sha384(b"meridian2"));
    }
}
