//! FNV-1a, 32 and 64 bit. Fast and deterministic; not for anything that
//! needs collision or preimage resistance.

use std::hash::Hasher;

pub const FNV32_OFFSET: u32 = 0x811c_9dc5;
pub const FNV32_PRIME: u32 = 0x0100_0193;
pub const FNV64_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
pub const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

pub fn fnv1a32(data: &[u8]) -> u32 {
    let mut hasher = Fnv1a32::default();
    hasher.update(data);
    hasher.value()
}

pub fn fnv1a64(data: &[u8]) -> u64 {
    let mut hasher = Fnv1a64::default();
    hasher.update(data);
    hasher.value()
}

/// Incremental 32-bit FNV-1a.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fnv1a32(u32);

impl Fnv1a32 {
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.0 ^= u32::from(byte);
            self.0 = self.0.wrapping_mul(FNV32_PRIME);
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Big-endian digest bytes.
    pub fn digest(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl Default for Fnv1a32 {
    fn default() -> Self {
        Self(FNV32_OFFSET)
    }
}

impl Hasher for Fnv1a32 {
    fn finish(&self) -> u64 {
        u64::from(self.0)
    }

    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

/// Incremental 64-bit FNV-1a.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fnv1a64(u64);

impl Fnv1a64 {
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(FNV64_PRIME);
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Big-endian digest bytes.
    pub fn digest(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl Default for Fnv1a64 {
    fn default() -> Self {
        Self(FNV64_OFFSET)
    }
}

impl Hasher for Fnv1a64 {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(fnv1a32(b""), 0x811c9dc5);
        assert_eq!(fnv1a64(b""), 0xcbf29ce484222325);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(fnv1a32(b"a"), 0xe40c292c);
        assert_eq!(fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a32(b"foobar"), 0xbf9cf968);
        assert_eq!(fnv1a64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn digest_is_big_endian() {
        let mut h = Fnv1a32::default();
        h.update(b"a");
        assert_eq!(h.digest(), [0xe4, 0x0c, 0x29, 0x2c]);

        let mut h = Fnv1a64::default();
        h.update(b"a");
        assert_eq!(h.digest(), [0xaf, 0x63, 0xdc, 0x4c, 0x86, 0x01, 0xec, 0x8c]);
    }

    #[test]
    fn hasher_trait_matches_one_shot() {
        let mut h = Fnv1a64::default();
        h.write(b"foo");
        h.write(b"bar");
        assert_eq!(h.finish(), fnv1a64(b"foobar"));
    }
}
