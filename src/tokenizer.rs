//! Text-to-vector encoding for the linear model
//!
//! The persisted model's weights are calibrated against this encoding, so it
//! has to be byte-stable across restarts and rebuilds. Hashing uses FNV-1a
//! with fixed constants rather than `DefaultHasher`, whose output is allowed
//! to change between releases.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Quantization buckets for a token hash. Each feature entry lands in
/// [0, 1) with three decimal digits of resolution.
const HASH_BUCKETS: u64 = 1000;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Encode `text` as a feature vector of exactly `max_length` entries.
///
/// Position `i` holds a bounded value derived from the hash of the i-th
/// whitespace-delimited token, case-folded. Entries past the last token stay
/// 0.0, so empty input encodes to the zero vector; tokens past `max_length`
/// are truncated. Deterministic for a given text: no randomness, no
/// external state, no failure mode.
pub fn tokenize(text: &str, max_length: usize) -> Vec<f32> {
    let mut features = vec![0.0f32; max_length];
    for (slot, token) in features.iter_mut().zip(text.split_whitespace()) {
        let hash = fnv1a(token.to_lowercase().as_bytes());
        *slot = (hash % HASH_BUCKETS) as f32 / HASH_BUCKETS as f32;
    }
    features
}
