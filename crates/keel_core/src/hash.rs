//! Hashed names
//!
//! Components are keyed by a 32-bit FNV-1a hash of their declared name so
//! lookups by name never compare strings.

use std::fmt;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameHash(u32);

impl NameHash {
    pub const fn of(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = FNV_OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(NameHash::of("").value(), 0x811c_9dc5);
        assert_eq!(NameHash::of("a").value(), 0xe40c_292c);
        assert_eq!(NameHash::of("foobar").value(), 0xbf9c_f968);
    }

    #[test]
    fn test_const_evaluable() {
        const HEALTH: NameHash = NameHash::of("health");
        assert_eq!(HEALTH, NameHash::of("health"));
        assert_ne!(HEALTH, NameHash::of("Health"));
    }
}
