//! Content Hashing
//!
//! Ids are minted by an opaque `&str -> String` function. The default is a
//! 32-bit multiply/xor string hash printed in base 36.

use std::fmt;
use std::sync::Arc;

/// Shared hash function used to mint node and class ids
#[derive(Clone)]
pub struct Hasher(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl Hasher {
    pub fn new(hash: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(hash))
    }

    pub fn hash(&self, text: &str) -> String {
        (self.0)(text)
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(string_hash)
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hasher(..)")
    }
}

/// Default string hash.
///
/// Seed 5381, walks UTF-16 code units from the end, `value * 33 ^ unit`
/// with 32-bit wrapping, rendered unsigned in base 36.
pub fn string_hash(text: &str) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut value: i32 = 5381;
    for &unit in units.iter().rev() {
        value = value.wrapping_mul(33) ^ i32::from(unit);
    }
    to_base36(u64::from(value as u32))
}

/// Lowercase base-36 digits
pub(crate) fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.iter().rev().map(|&d| d as char).collect()
}
