//! Response body decoding over an ordered list of candidate encodings.

use encoding_rs::Encoding;
use breakout_core::error::DataError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes raw bytes with the first candidate encoding that needs no
/// replacement characters.
#[derive(Debug, Clone)]
pub struct BodyDecoder {
    encodings: Vec<&'static Encoding>,
}

impl BodyDecoder {
    /// Build a decoder from WHATWG encoding labels, tried in order.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Result<Self, DataError> {
        if labels.is_empty() {
            return Err(DataError::DecodeError(
                "At least one encoding is required".into(),
            ));
        }
        let encodings = labels
            .iter()
            .map(|label| {
                Encoding::for_label(label.as_ref().trim().as_bytes()).ok_or_else(|| {
                    DataError::DecodeError(format!("Unknown encoding label: {}", label.as_ref()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { encodings })
    }

    /// Names of the candidate encodings, in trial order.
    pub fn names(&self) -> Vec<&'static str> {
        self.encodings.iter().map(|e| e.name()).collect()
    }

    /// Decode `bytes`, returning the text and the encoding that succeeded.
    ///
    /// A leading UTF-8 byte order mark is removed before decoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<(String, &'static str)> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        self.encodings.iter().find_map(|encoding| {
            encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| (text.into_owned(), encoding.name()))
        })
    }
}

impl Default for BodyDecoder {
    fn default() -> Self {
        Self {
            encodings: vec![encoding_rs::UTF_8, encoding_rs::BIG5],
        }
    }
}
