//! Serial envelope framing
//!
//! The outer wire format around an item's bit-packed plaintext:
//!
//! ```text
//! [version: u8][seed: i32 BE][checksum: u16 BE][ciphertext...]
//! ```
//!
//! The two checksum bytes travel *inside* the ciphertext: they are the first
//! two bytes of the decrypted payload. The checksum is IEEE CRC32 over the
//! whole serial with the checksum field blanked to `0xFF 0xFF`, folded to 16
//! bits. The fold discards half the CRC's strength, but it is what the
//! external format does and is reproduced exactly.

use crate::cipher;
use crate::error::{Result, SerialError, MIN_SERIAL_LEN};
use tracing::debug;

/// Oldest envelope version byte in the supported set.
pub const VERSION_MIN: u8 = 0x03;
/// Newest envelope version byte in the supported set.
pub const VERSION_MAX: u8 = 0x04;

/// A verified, unscrambled serial envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Envelope version byte (distinct from the payload schema version).
    pub version: u8,
    /// Cipher seed embedded in the serial.
    pub seed: i32,
    /// Decrypted payload with the checksum stripped.
    pub plaintext: Vec<u8>,
}

impl Envelope {
    /// Verify and unscramble a raw serial.
    ///
    /// A serial whose ciphertext is empty (exactly the 5 header bytes) decodes
    /// to an empty plaintext; there is no checksum to verify in that case.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_SERIAL_LEN {
            return Err(SerialError::InvalidLength(data.len()));
        }
        let version = data[0];
        if !(VERSION_MIN..=VERSION_MAX).contains(&version) {
            return Err(SerialError::UnsupportedVersion(version));
        }
        let seed = seed_of(data)?;

        let mut decrypted = data[MIN_SERIAL_LEN..].to_vec();
        cipher::decrypt(seed, &mut decrypted);

        if decrypted.is_empty() {
            return Ok(Envelope {
                version,
                seed,
                plaintext: Vec::new(),
            });
        }
        if decrypted.len() < 2 {
            // one ciphertext byte cannot hold the checksum
            return Err(SerialError::InvalidLength(data.len()));
        }

        let embedded = u16::from_be_bytes([decrypted[0], decrypted[1]]);
        let computed = folded_checksum(version, seed, &decrypted[2..]);
        if embedded != computed {
            return Err(SerialError::ChecksumMismatch { embedded, computed });
        }

        debug!(version, seed, len = data.len(), "decoded serial envelope");
        Ok(Envelope {
            version,
            seed,
            plaintext: decrypted[2..].to_vec(),
        })
    }

    /// Frame and scramble a plaintext payload into a complete serial.
    pub fn encode(plaintext: &[u8], seed: i32, version: u8) -> Vec<u8> {
        let checksum = folded_checksum(version, seed, plaintext);

        let mut body = Vec::with_capacity(2 + plaintext.len());
        body.extend_from_slice(&checksum.to_be_bytes());
        body.extend_from_slice(plaintext);
        cipher::encrypt(seed, &mut body);

        let mut serial = Vec::with_capacity(MIN_SERIAL_LEN + body.len());
        serial.push(version);
        serial.extend_from_slice(&seed.to_be_bytes());
        serial.extend_from_slice(&body);
        serial
    }
}

/// Extract the embedded cipher seed without decoding the rest of the serial.
pub fn seed_of(data: &[u8]) -> Result<i32> {
    if data.len() < MIN_SERIAL_LEN {
        return Err(SerialError::InvalidLength(data.len()));
    }
    Ok(i32::from_be_bytes([data[1], data[2], data[3], data[4]]))
}

/// CRC32 over `[version][seed][0xFF,0xFF][payload]`, folded to 16 bits.
fn folded_checksum(version: u8, seed: i32, payload: &[u8]) -> u16 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[version]);
    hasher.update(&seed.to_be_bytes());
    hasher.update(&[0xFF, 0xFF]);
    hasher.update(payload);
    let crc = hasher.finalize();
    (((crc >> 16) ^ crc) & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;

    fn serial(b64: &str) -> Vec<u8> {
        BASE64_STANDARD.decode(b64).unwrap()
    }

    #[test]
    fn round_trip_zero_seed() {
        let plaintext = b"\x80\x12\x34\x56".to_vec();
        let bytes = Envelope::encode(&plaintext, 0, 0x03);
        let env = Envelope::decode(&bytes).unwrap();
        assert_eq!(env.version, 0x03);
        assert_eq!(env.seed, 0);
        assert_eq!(env.plaintext, plaintext);
    }

    #[test]
    fn round_trip_negative_seed() {
        let plaintext = vec![0xAB; 13];
        let bytes = Envelope::encode(&plaintext, -987654321, 0x04);
        let env = Envelope::decode(&bytes).unwrap();
        assert_eq!(env.seed, -987654321);
        assert_eq!(env.plaintext, plaintext);
    }

    #[test]
    fn decodes_real_serial_with_scrambled_seed() {
        // From the v3 corpus; seed bytes are 0xA7111C7F, a negative i32.
        let data = serial("A6cRHH+sfCuWGEZz2Lc5FWDbSfcQLmbaOV6SzgYP");
        assert_eq!(seed_of(&data).unwrap(), 0xA7111C7Fu32 as i32);
        let env = Envelope::decode(&data).unwrap();
        assert!(!env.plaintext.is_empty());

        // re-framing with the same seed reproduces the serial byte-for-byte
        let encoded = Envelope::encode(&env.plaintext, env.seed, env.version);
        assert_eq!(encoded, data);
    }

    #[test]
    fn decodes_real_unobfuscated_serial() {
        let data = serial("AwAAAADFtIC3/mrBkEsaj5NM0xGVIBFDCAAAAAAAMAYA");
        let env = Envelope::decode(&data).unwrap();
        assert_eq!(env.seed, 0);
        assert_eq!(env.plaintext.len(), data.len() - 7);
        assert_eq!(Envelope::encode(&env.plaintext, 0, env.version), data);
    }

    #[test]
    fn short_serial_is_invalid_length() {
        for len in 0..MIN_SERIAL_LEN {
            let data = vec![0x03; len];
            assert_eq!(
                Envelope::decode(&data).unwrap_err(),
                SerialError::InvalidLength(len)
            );
        }
    }

    #[test]
    fn five_byte_serial_decodes_to_empty_plaintext() {
        let env = Envelope::decode(&[0x03, 0, 0, 0, 0]).unwrap();
        assert!(env.plaintext.is_empty());
    }

    #[test]
    fn six_byte_serial_cannot_hold_checksum() {
        let err = Envelope::decode(&[0x03, 0, 0, 0, 0, 0xAA]).unwrap_err();
        assert_eq!(err, SerialError::InvalidLength(6));
    }

    #[test]
    fn unknown_version_rejected() {
        for version in [0x00, 0x02, 0x05, 0xFF] {
            let data = [version, 0, 0, 0, 0, 0, 0, 0];
            assert_eq!(
                Envelope::decode(&data).unwrap_err(),
                SerialError::UnsupportedVersion(version)
            );
        }
    }

    #[test]
    fn bit_flip_fails_checksum() {
        let data = serial("AwAAAACGEoC36JCAkTsKGoSgBASiIgsA");
        for byte in MIN_SERIAL_LEN..data.len() {
            for bit in 0..8 {
                let mut corrupt = data.clone();
                corrupt[byte] ^= 1 << bit;
                assert!(matches!(
                    Envelope::decode(&corrupt),
                    Err(SerialError::ChecksumMismatch { .. })
                ));
            }
        }
    }
}
