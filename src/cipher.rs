//! Obfuscation cipher for serial payloads
//!
//! A seeded XOR stream cipher with a cyclic byte rotation, symmetric under the
//! same seed. Seed `0` is the format's explicit "unobfuscated" convention and
//! both directions are the identity for it.
//!
//! The keystream is a Lehmer-style generator: `x ← (x * 0x10A860C1) mod
//! 0xFFFFFFFB`, seeded from the top 27 bits of the signed 32-bit seed. The low
//! five seed bits select the rotation distance.

const KEYSTREAM_MUL: u64 = 0x10A8_60C1;
const KEYSTREAM_MOD: u64 = 0xFFFF_FFFB;

/// Keystream initializer: arithmetic shift of the signed seed, truncated to
/// 32 bits. The truncation (not the sign) is what the format depends on.
fn keystream_seed(seed: i32) -> u64 {
    ((seed >> 5) as u32) as u64
}

fn xor_keystream(seed: i32, data: &mut [u8]) {
    let mut x = keystream_seed(seed);
    for byte in data.iter_mut() {
        x = (x * KEYSTREAM_MUL) % KEYSTREAM_MOD;
        *byte ^= x as u8;
    }
}

/// Rotation distance for a buffer of `len` bytes.
///
/// Taken modulo the length so short buffers stay in range; `len` must be
/// non-zero, which both entry points guarantee by short-circuiting empty input.
fn rotation(seed: i32, len: usize) -> usize {
    (seed & 0x1F) as usize % len
}

/// Scramble `data` in place with the given seed.
pub fn encrypt(seed: i32, data: &mut [u8]) {
    if seed == 0 || data.is_empty() {
        return;
    }
    let steps = rotation(seed, data.len());
    data.rotate_left(steps);
    xor_keystream(seed, data);
}

/// Unscramble `data` in place with the given seed.
///
/// Inverse of [`encrypt`]: XOR first, then rotate back. The rotation distance
/// is recomputed from the post-XOR length, which the XOR pass leaves unchanged.
pub fn decrypt(seed: i32, data: &mut [u8]) {
    if seed == 0 || data.is_empty() {
        return;
    }
    xor_keystream(seed, data);
    let steps = rotation(seed, data.len());
    data.rotate_right(steps);
}
