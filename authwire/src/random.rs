//! Random token strings.

use rand::Rng;
use rand::distr::Alphanumeric;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// `byte_len` random bytes, lowercase hex encoded.
#[must_use]
pub fn random_hex(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::rng().fill(&mut bytes[..]);

    bytes
        .iter()
        .flat_map(|byte| {
            [
                HEX_DIGITS[usize::from(byte >> 4)],
                HEX_DIGITS[usize::from(byte & 0x0f)],
            ]
        })
        .map(char::from)
        .collect()
}

/// `len` random ASCII letters and digits.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
