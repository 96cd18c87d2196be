//! Mnemonic generation, parsing and index encoding
//!
//! A mnemonic is held as its word indices into the English BIP-39 wordlist
//! rather than as a phrase, so the in-memory form is a fixed-width integer
//! array that can be wiped deterministically.

use bip39::{Language, Mnemonic as Bip39Mnemonic};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::error::{MnemonicError, MnemonicResult};
use crate::secure::{IntoSecret, SecretArray, SecretBytes, SecretString, SEED_SIZE};

/// Number of words in the BIP-39 wordlist
pub const WORDLIST_SIZE: u16 = 2048;

/// Supported mnemonic lengths
pub const SUPPORTED_WORD_COUNTS: [usize; 2] = [12, 24];

/// BIP-39 mnemonic as an array of word indices
///
/// Always 12 or 24 indices with a valid checksum: every constructor
/// validates, so holding a `Mnemonic` means holding a well-formed one.
///
/// # Security
///
/// - Indices are zeroized on drop
/// - Custom `Debug` implementation hides the words
/// - No `Clone`; phrase, byte and seed conversions return secret wrappers
///
/// # Example
///
/// ```rust
/// use alephium_keyring::mnemonic::Mnemonic;
///
/// let mnemonic = Mnemonic::generate(24).unwrap();
/// assert_eq!(mnemonic.word_count(), 24);
///
/// let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
/// let imported = Mnemonic::from_phrase(phrase).unwrap();
/// assert_eq!(imported.indices()[11], 3);
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    indices: Vec<u16>,
}

impl Mnemonic {
    /// Generate a new random mnemonic with 12 (128-bit) or 24 (256-bit) words
    ///
    /// Uses the system's cryptographically secure random number generator.
    ///
    /// # Errors
    ///
    /// Returns `MnemonicError::InvalidWordCount` for any other word count
    pub fn generate(word_count: usize) -> MnemonicResult<Self> {
        let entropy_bytes = word_count_to_entropy_bytes(word_count)?;

        let mut entropy = Zeroizing::new(vec![0u8; entropy_bytes]);
        rand::thread_rng().fill_bytes(&mut entropy);

        let mnemonic = Bip39Mnemonic::from_entropy_in(Language::English, &entropy)?;
        Self::from_bip39(&mnemonic)
    }

    /// Import a mnemonic from a whitespace-separated phrase
    ///
    /// Words are matched exactly (case-sensitive) against the English
    /// wordlist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The word count is not 12 or 24
    /// - A word is not in the wordlist
    /// - The checksum is invalid
    pub fn from_phrase(phrase: &str) -> MnemonicResult<Self> {
        let word_count = phrase.split_whitespace().count();
        if !SUPPORTED_WORD_COUNTS.contains(&word_count) {
            return Err(MnemonicError::InvalidWordCount(word_count));
        }

        let mut indices = Vec::with_capacity(word_count);
        for (position, word) in phrase.split_whitespace().enumerate() {
            match word_index(word) {
                Some(index) => indices.push(index),
                None => {
                    indices.zeroize();
                    return Err(MnemonicError::UnknownWord { position });
                }
            }
        }

        Self::from_indices(indices)
    }

    /// Build a mnemonic from raw word indices, validating length, range and
    /// checksum
    pub fn from_indices(indices: Vec<u16>) -> MnemonicResult<Self> {
        let candidate = Self { indices };

        if !SUPPORTED_WORD_COUNTS.contains(&candidate.indices.len()) {
            return Err(MnemonicError::InvalidWordCount(candidate.indices.len()));
        }
        if let Some(&bad) = candidate.indices.iter().find(|&&i| i >= WORDLIST_SIZE) {
            return Err(MnemonicError::IndexOutOfRange(bad));
        }

        // Parsing through bip39 verifies the embedded checksum
        candidate.to_bip39()?;
        Ok(candidate)
    }

    /// Decode the little-endian `u16` byte encoding produced by [`Mnemonic::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> MnemonicResult<Self> {
        if bytes.len() % 2 != 0 {
            return Err(MnemonicError::InvalidEncoding(format!(
                "odd byte length {}",
                bytes.len()
            )));
        }

        let indices = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::from_indices(indices)
    }

    /// Word indices into the English wordlist
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Number of words (12 or 24)
    pub fn word_count(&self) -> usize {
        self.indices.len()
    }

    /// Space-separated phrase
    ///
    /// # Security
    ///
    /// Use only for backup display; the phrase is wiped when the returned
    /// secret is dropped.
    pub fn to_phrase(&self) -> SecretString {
        self.phrase_buffer().to_string().into_secret()
    }

    /// Little-endian `u16` encoding of the indices (2 bytes per word)
    pub fn to_bytes(&self) -> SecretBytes {
        self.indices
            .iter()
            .flat_map(|index| index.to_le_bytes())
            .collect::<Vec<u8>>()
            .into_secret()
    }

    /// 64-byte BIP-39 seed
    ///
    /// PBKDF2-HMAC-SHA512 over the phrase with salt `"mnemonic" || passphrase`
    /// and 2048 iterations.
    pub fn to_seed(&self, passphrase: Option<&str>) -> MnemonicResult<SecretArray<SEED_SIZE>> {
        let mnemonic = self.to_bip39()?;
        let mut seed = mnemonic.to_seed(passphrase.unwrap_or(""));
        let secret = SecretArray::new(seed);
        seed.zeroize();
        Ok(secret)
    }

    fn from_bip39(mnemonic: &Bip39Mnemonic) -> MnemonicResult<Self> {
        let mut indices = Vec::with_capacity(mnemonic.word_count());
        for (position, word) in mnemonic.words().enumerate() {
            match word_index(word) {
                Some(index) => indices.push(index),
                None => {
                    indices.zeroize();
                    return Err(MnemonicError::UnknownWord { position });
                }
            }
        }
        Ok(Self { indices })
    }

    fn to_bip39(&self) -> MnemonicResult<Bip39Mnemonic> {
        let phrase = self.phrase_buffer();
        Ok(Bip39Mnemonic::parse_in_normalized(Language::English, &phrase)?)
    }

    fn phrase_buffer(&self) -> Zeroizing<String> {
        let words = Language::English.word_list();
        let mut phrase = Zeroizing::new(String::with_capacity(self.indices.len() * 9));
        for (i, &index) in self.indices.iter().enumerate() {
            if i > 0 {
                phrase.push(' ');
            }
            phrase.push_str(words[usize::from(index)]);
        }
        phrase
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count())
            .field("indices", &"[REDACTED]")
            .finish()
    }
}

/// Look up a word's index in the English wordlist (exact match)
pub fn word_index(word: &str) -> Option<u16> {
    Language::English
        .word_list()
        .binary_search(&word)
        .ok()
        .and_then(|i| u16::try_from(i).ok())
}

/// Convert word count to entropy bytes
fn word_count_to_entropy_bytes(word_count: usize) -> MnemonicResult<usize> {
    match word_count {
        12 => Ok(16), // 128 bits
        24 => Ok(32), // 256 bits
        _ => Err(MnemonicError::InvalidWordCount(word_count)),
    }
}
