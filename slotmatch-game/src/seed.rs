//! Seeded candidate ordering.
//!
//! A request seed is expanded per domain with HMAC-SHA256 and drives a
//! ChaCha20 stream, so identical requests shuffle identically on every
//! platform.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Domain tag for the real-item candidate order.
pub const CANDIDATE_DOMAIN: &[u8] = b"slotmatch.candidates";

/// Derive a stream seed for `domain_tag` from the user-visible seed.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> [u8; 32] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    seed
}

/// Deterministic RNG for one domain of one session.
#[must_use]
pub fn session_rng(user_seed: u64, domain_tag: &[u8]) -> ChaCha20Rng {
    ChaCha20Rng::from_seed(derive_stream_seed(user_seed, domain_tag))
}

/// Shuffle `items` in place with the candidate stream for `user_seed`.
pub fn shuffle_candidates<T>(items: &mut [T], user_seed: u64) {
    let mut rng = session_rng(user_seed, CANDIDATE_DOMAIN);
    items.shuffle(&mut rng);
}
