//! Base-N legend keys.
//!
//! Legend keys are non-negative integers written most-significant digit
//! first over an alphabet. With the default 52-symbol alphabet `a` is zero,
//! so `0` padded to three digits is `"aaa"` and `52` is `"ba"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercase then uppercase ASCII letters: base 52.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Key decoding error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// A character is not part of the alphabet.
    #[error("invalid character {ch:?} at position {position} in key {key:?}")]
    InvalidCharacter {
        /// The key being decoded.
        key: String,
        /// Offending character.
        ch: char,
        /// Character offset within the key.
        position: usize,
    },
    /// Nothing to decode.
    #[error("empty key")]
    Empty,
    /// The key does not fit in 64 bits.
    #[error("key {0:?} overflows a 64-bit id")]
    Overflow(String),
}

/// Alphabet configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlphabetError {
    /// Base must be at least two.
    #[error("alphabet needs at least 2 symbols, got {0}")]
    TooShort(usize),
    /// Each symbol may appear once.
    #[error("symbol {0:?} appears more than once")]
    DuplicateSymbol(char),
    /// Quotes and whitespace would break the legend syntax.
    #[error("symbol {0:?} cannot be used in legend keys")]
    ReservedSymbol(char),
}

/// The digit set used for legend keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet; symbol order defines digit values.
    pub fn new(symbols: &str) -> Result<Self, AlphabetError> {
        let symbols: Vec<char> = symbols.chars().collect();
        if symbols.len() < 2 {
            return Err(AlphabetError::TooShort(symbols.len()));
        }
        for (i, &c) in symbols.iter().enumerate() {
            if c == '"' || c.is_whitespace() {
                return Err(AlphabetError::ReservedSymbol(c));
            }
            if symbols[..i].contains(&c) {
                return Err(AlphabetError::DuplicateSymbol(c));
            }
        }
        Ok(Self { symbols })
    }

    /// Number of symbols.
    pub fn base(&self) -> u64 {
        self.symbols.len() as u64
    }

    /// The zero digit.
    pub fn zero(&self) -> char {
        self.symbols[0]
    }

    /// Digit value of `c`.
    pub fn digit(&self, c: char) -> Option<u64> {
        self.symbols.iter().position(|&s| s == c).map(|i| i as u64)
    }

    /// Encode `n`, left-padding with the zero digit to at least `pad` characters.
    pub fn encode(&self, n: u64, pad: usize) -> String {
        let base = self.base();
        let mut digits = Vec::new();
        let mut rest = n;
        loop {
            digits.push(self.symbols[(rest % base) as usize]);
            rest /= base;
            if rest == 0 {
                break;
            }
        }
        while digits.len() < pad {
            digits.push(self.zero());
        }
        digits.iter().rev().collect()
    }

    /// Number of characters `encode(n, 0)` produces.
    pub fn encoded_len(&self, n: u64) -> usize {
        let base = self.base();
        let mut len = 1;
        let mut rest = n / base;
        while rest > 0 {
            len += 1;
            rest /= base;
        }
        len
    }

    /// Inverse of [`encode`](Self::encode). Leading zero digits are ignored.
    pub fn decode(&self, key: &str) -> Result<u64, IdError> {
        if key.is_empty() {
            return Err(IdError::Empty);
        }
        let base = self.base();
        let mut acc: u64 = 0;
        for (position, ch) in key.chars().enumerate() {
            let digit = self.digit(ch).ok_or_else(|| IdError::InvalidCharacter {
                key: key.to_string(),
                ch,
                position,
            })?;
            acc = acc
                .checked_mul(base)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| IdError::Overflow(key.to_string()))?;
        }
        Ok(acc)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Alphabet {
    type Error = AlphabetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Alphabet> for String {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        let a = Alphabet::default();
        assert_eq!(a.encode(0, 0), "a");
        assert_eq!(a.encode(0, 3), "aaa");
    }

    #[test]
    fn test_two_digit() {
        let a = Alphabet::default();
        let key = a.encode(52, 0);
        assert_eq!(key, "ba");
        assert_eq!(key.len(), 2);
        assert_eq!(a.decode(&key).unwrap(), 52);
    }

    #[test]
    fn test_decode_is_positional() {
        let a = Alphabet::default();
        assert_eq!(a.decode("aab").unwrap(), 1);
        assert_eq!(a.decode("aaZ").unwrap(), 51);
        assert_eq!(a.decode("bab").unwrap(), 52 * 52 + 1);
    }

    #[test]
    fn test_roundtrip_sample() {
        let a = Alphabet::default();
        for n in (0..200_000u64).step_by(37).chain([u64::MAX, u64::MAX - 1]) {
            assert_eq!(a.decode(&a.encode(n, 0)).unwrap(), n);
            assert_eq!(a.decode(&a.encode(n, 5)).unwrap(), n);
        }
    }

    #[test]
    fn test_encoded_len_matches_encode() {
        let a = Alphabet::default();
        for n in [0, 1, 51, 52, 53, 2703, 2704, 140_607, 140_608] {
            assert_eq!(a.encoded_len(n), a.encode(n, 0).chars().count(), "n = {}", n);
        }
    }

    #[test]
    fn test_invalid_character() {
        let a = Alphabet::default();
        assert_eq!(
            a.decode("ab1"),
            Err(IdError::InvalidCharacter { key: "ab1".into(), ch: '1', position: 2 })
        );
        assert_eq!(a.decode(""), Err(IdError::Empty));
    }

    #[test]
    fn test_overflow() {
        let a = Alphabet::default();
        assert!(matches!(a.decode(&"Z".repeat(20)), Err(IdError::Overflow(_))));
    }

    #[test]
    fn test_custom_alphabet() {
        let hex = Alphabet::new("0123456789abcdef").unwrap();
        assert_eq!(hex.encode(255, 4), "00ff");
        assert_eq!(hex.decode("00ff").unwrap(), 255);
    }

    #[test]
    fn test_bad_alphabets() {
        assert_eq!(Alphabet::new("a"), Err(AlphabetError::TooShort(1)));
        assert_eq!(Alphabet::new("aba"), Err(AlphabetError::DuplicateSymbol('a')));
        assert_eq!(Alphabet::new("ab\""), Err(AlphabetError::ReservedSymbol('"')));
    }

    #[test]
    fn test_serde_as_string() {
        let a: Alphabet = serde_json::from_str("\"01\"").unwrap();
        assert_eq!(a.encode(5, 0), "101");
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"01\"");
        assert!(serde_json::from_str::<Alphabet>("\"0\"").is_err());
    }
}
