//! Text field decoding for UTF-16LE and legacy code page paths.

use encoding::label::encoding_from_windows_code_page;
use encoding::{DecoderTrap, EncodingRef};

/// Decoded text and whether anything had to be replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub lossy: bool,
}

/// Decode a UTF-16LE byte field, stopping at the first NUL code unit.
///
/// Unpaired surrogates become U+FFFD. A dangling odd byte is ignored and
/// marks the result lossy.
pub fn decode_utf16le(data: &[u8]) -> DecodedText {
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0);

    let mut lossy = data.len() % 2 != 0 && !terminated_before_tail(data);
    let text = char::decode_utf16(units)
        .map(|result| {
            result.unwrap_or_else(|_| {
                lossy = true;
                char::REPLACEMENT_CHARACTER
            })
        })
        .collect();

    DecodedText { text, lossy }
}

/// True when a NUL code unit ends the string before the odd trailing byte
fn terminated_before_tail(data: &[u8]) -> bool {
    data.chunks_exact(2).any(|pair| pair == [0, 0])
}

/// Look up a Windows code page
pub fn codepage_encoding(codepage: u16) -> Option<EncodingRef> {
    encoding_from_windows_code_page(codepage as usize)
}

/// Decode a NUL-padded single-byte field using the given code page
pub fn decode_codepage(data: &[u8], encoding: EncodingRef) -> DecodedText {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let field = &data[..end];

    match encoding.decode(field, DecoderTrap::Strict) {
        Ok(text) => DecodedText { text, lossy: false },
        Err(_) => {
            let text = encoding
                .decode(field, DecoderTrap::Replace)
                .unwrap_or_else(|_| String::from_utf8_lossy(field).into_owned());
            DecodedText { text, lossy: true }
        }
    }
}
