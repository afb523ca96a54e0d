//! Random suffix generation for bucket names.
//!
//! Tokens are six symbols drawn uniformly, with replacement, from `A-Z0-9`.
//! Two independent tokens collide with probability `1 / 36^6`. This is not a
//! cryptographic identifier.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::BucketNameError;

pub const TOKEN_LENGTH: usize = 6;
pub const TOKEN_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// Largest multiple of the alphabet size that fits in a byte. Bytes at or above
// it are rejected so every symbol stays equally likely.
const REJECTION_BOUND: u8 = (256 / TOKEN_ALPHABET.len() * TOKEN_ALPHABET.len()) as u8;

pub fn generate_token() -> Result<String, BucketNameError> {
    generate_token_with(&mut OsRng)
}

pub fn generate_token_with(rng: &mut impl RngCore) -> Result<String, BucketNameError> {
    let mut token = String::with_capacity(TOKEN_LENGTH);
    let mut buffer = [0u8; TOKEN_LENGTH * 2];

    while token.len() < TOKEN_LENGTH {
        rng.try_fill_bytes(&mut buffer)
            .map_err(|error| BucketNameError::RandomnessUnavailable(error.to_string()))?;

        for byte in buffer {
            if token.len() == TOKEN_LENGTH {
                break;
            }
            if byte < REJECTION_BOUND {
                let index = usize::from(byte) % TOKEN_ALPHABET.len();
                token.push(char::from(TOKEN_ALPHABET[index]));
            }
        }
    }

    Ok(token)
}

#[cfg(test)]
pub(crate) mod test_rngs {
    use rand::{Error, RngCore};

    /// Stands in for an unavailable OS source: the fallible draw errors and
    /// the infallible ones panic, as `OsRng` does.
    pub struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            panic!("entropy source offline")
        }

        fn next_u64(&mut self) -> u64 {
            panic!("entropy source offline")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            panic!("entropy source offline")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), Error> {
            Err(Error::new("entropy source offline"))
        }
    }

    /// Replays a fixed byte sequence, cycling when exhausted.
    pub struct ScriptedRng {
        bytes: Vec<u8>,
        position: usize,
    }

    impl ScriptedRng {
        pub fn new(bytes: Vec<u8>) -> Self {
            Self { bytes, position: 0 }
        }
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            let mut buf = [0u8; 4];
            self.fill_bytes(&mut buf);
            u32::from_le_bytes(buf)
        }

        fn next_u64(&mut self) -> u64 {
            let mut buf = [0u8; 8];
            self.fill_bytes(&mut buf);
            u64::from_le_bytes(buf)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for slot in dest {
                *slot = self.bytes[self.position % self.bytes.len()];
                self.position += 1;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::test_rngs::{FailingRng, ScriptedRng};
    use super::*;

    fn is_token_symbol(symbol: char) -> bool {
        symbol.is_ascii_uppercase() || symbol.is_ascii_digit()
    }

    #[test]
    fn rejection_bound_is_multiple_of_alphabet() {
        assert_eq!(REJECTION_BOUND, 252);
        assert_eq!(usize::from(REJECTION_BOUND) % TOKEN_ALPHABET.len(), 0);
    }

    #[test]
    fn generates_six_uppercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let token = generate_token_with(&mut rng).expect("token should generate");
            assert_eq!(token.len(), TOKEN_LENGTH);
            assert!(token.chars().all(is_token_symbol), "unexpected token {token}");
        }
    }

    #[test]
    fn os_rng_tokens_have_expected_shape() {
        let token = generate_token().expect("os rng should be available");
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(is_token_symbol));
    }

    #[test]
    fn ten_thousand_tokens_do_not_collide() {
        // Seeded so the draw is fixed; with a fresh source roughly 2% of
        // 10k-token runs would contain a colliding pair.
        let mut rng = StdRng::seed_from_u64(2_024);
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let token = generate_token_with(&mut rng).expect("token should generate");
            assert!(seen.insert(token.clone()), "token {token} repeated in 10k draws");
        }
    }

    #[test]
    fn maps_bytes_onto_alphabet() {
        let mut rng = ScriptedRng::new(vec![0, 25, 26, 35, 36, 251]);
        let token = generate_token_with(&mut rng).expect("token should generate");
        assert_eq!(token, "AZ09A9");
    }

    #[test]
    fn skips_bytes_outside_rejection_bound() {
        let mut rng = ScriptedRng::new(vec![252, 255, 1, 253, 2, 3, 254, 4, 5, 6]);
        let token = generate_token_with(&mut rng).expect("token should generate");
        assert_eq!(token, "BCDEFG");
    }

    #[test]
    fn surfaces_randomness_failure() {
        let error = generate_token_with(&mut FailingRng).expect_err("generation should fail");
        assert!(matches!(error, BucketNameError::RandomnessUnavailable(_)));
        assert!(error.to_string().contains("entropy source offline"));
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let first = generate_token_with(&mut StdRng::seed_from_u64(7)).expect("token");
        let second = generate_token_with(&mut StdRng::seed_from_u64(7)).expect("token");
        assert_eq!(first, second);
    }
}
