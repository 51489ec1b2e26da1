//! Stable hash of a message template, used by the backend to group repeated
//! occurrences of the same log statement.
//!
//! The algorithm is Jenkins one-at-a-time over the UTF-16 code units of the
//! template text. It is part of the wire contract: changing it splits every
//! existing group in the backend, so it must stay fixed.

use std::fmt;

/// Compute the 32-bit fingerprint of `template`.
pub fn compute(template: &str) -> u32 {
    let mut hash: u32 = 0;
    for unit in template.encode_utf16() {
        hash = hash.wrapping_add(u32::from(unit));
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);
    hash
}

/// Fingerprint of a template; displays as 8 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u32);

impl Fingerprint {
    pub fn of(template: &str) -> Self {
        Fingerprint(compute(template))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(compute(""), 0);
        assert_eq!(compute("a"), 0xca2e9442);
        assert_eq!(compute("Hello {name}"), 0x49a13499);
        assert_eq!(compute("Boom"), 0xcb144c83);
    }

    #[test]
    fn hashes_utf16_units() {
        // Non-BMP characters contribute both surrogates.
        assert_eq!(compute("héllo 😀"), 0x23c819de);
    }

    #[test]
    fn displays_zero_padded() {
        assert_eq!(Fingerprint(0).to_string(), "00000000");
        assert_eq!(Fingerprint(0xab).to_string(), "000000ab");
        assert_eq!(Fingerprint::of("a").to_string(), "ca2e9442");
    }

    #[test]
    fn is_deterministic() {
        let t = "This is a .NET example of structured logging for customer ID {customerId}.";
        assert_eq!(compute(t), compute(t));
        assert_eq!(compute(t), 0x1596c29b);
    }
}
