//! Base64 codec used to keep raw header, body and cookie bytes safe inside the
//! JSON cache file.
//!
//! Decoding is lenient in one specific way: it stops at the first byte that is
//! not part of the standard alphabet (padding included) and treats everything
//! before it as the encoded payload.

use ::base64::Engine as _;
use ::base64::alphabet;
use ::base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use ::base64::engine::DecodePaddingMode;

// Accepts unpadded tails and ignores leftover bits in the final sextet.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

pub fn encode(input: impl AsRef<[u8]>) -> String {
    STANDARD.encode(input)
}

pub fn decode(input: impl AsRef<[u8]>) -> Vec<u8> {
    let input = input.as_ref();
    let end = input
        .iter()
        .position(|&byte| !is_alphabet(byte))
        .unwrap_or(input.len());
    // A single dangling sextet carries no complete byte.
    let end = if end % 4 == 1 { end - 1 } else { end };
    LENIENT.decode(&input[..end]).unwrap_or_default()
}

fn is_alphabet(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/'
}
