//! Deterministic match code generation.
//!
//! A `CodeGenerator` turns a 32-byte session seed into a sequence of short
//! match codes:
//! - per-code seed via `SHA-256(session_seed || index_le)`
//! - `ChaCha8Rng` seeded from that hash picks characters from an alphabet
//!   without look-alike glyphs (no `0`/`O`, `1`/`I`)
//!
//! Given the same seed and index the same code comes out on any platform, so
//! a control surface restarted with its seed reproduces its codes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

pub const MATCH_CODE_LEN: usize = 6;

const ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Derive the seed for the code at `index`.
pub fn derive_code_seed(session_seed: &[u8; 32], index: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(session_seed);
    hasher.update(index.to_le_bytes());
    hasher.finalize().into()
}

/// Build a match code from a derived seed.
pub fn code_from_seed(seed: [u8; 32]) -> String {
    let mut rng = ChaCha8Rng::from_seed(seed);
    (0..MATCH_CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// # Example
///
/// ```
/// use mjcast_core::codes::CodeGenerator;
///
/// let mut codes = CodeGenerator::new([0u8; 32]);
/// let a = codes.next_match_code();
/// let b = codes.next_match_code();
/// assert_ne!(a, b);
/// assert_eq!(a.len(), 6);
/// ```
pub struct CodeGenerator {
    seed: [u8; 32],
    index: u64,
}

impl CodeGenerator {
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed, index: 0 }
    }

    /// Generator seeded from the thread RNG, for live use.
    pub fn from_entropy() -> Self {
        let mut seed = [0u8; 32];
        rand::rng().fill(&mut seed);
        Self::new(seed)
    }

    /// Number of codes generated so far.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn next_match_code(&mut self) -> String {
        let code = code_from_seed(derive_code_seed(&self.seed, self.index));
        self.index += 1;
        code
    }
}
