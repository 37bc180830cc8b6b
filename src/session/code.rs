//! Session codes: six lowercase alphanumeric characters.

use std::borrow::Borrow;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Number of characters in a code (36^6 possible codes).
pub const CODE_LENGTH: usize = 6;

/// Short shared secret binding one viewer to one controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Draw a code from `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Draw a code from the thread-local generator.
    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng())
    }

    /// Whether `candidate` has the shape of a generated code.
    pub fn is_well_formed(candidate: &str) -> bool {
        candidate.len() == CODE_LENGTH
            && candidate
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for SessionCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
