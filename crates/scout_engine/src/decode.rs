use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("content type {content_type} is not text")]
    UnsupportedContentType { content_type: String },
    #[error("failed to decode bytes with {encoding}")]
    DecodeFailure { encoding: String },
}

/// Decode a response body to text.
///
/// The declared content type must be one of `allowed` (a missing header is
/// accepted). Charset resolution: BOM -> Content-Type charset -> chardetng
/// guess. Any malformed sequence for the chosen encoding is an error.
pub fn decode_body(
    bytes: &[u8],
    content_type: Option<&str>,
    allowed: &[String],
) -> Result<String, DecodeError> {
    if let Some(ct) = content_type {
        if !is_content_type_allowed(ct, allowed) {
            return Err(DecodeError::UnsupportedContentType {
                content_type: ct.to_string(),
            });
        }
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(enc) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, enc);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn is_content_type_allowed(content_type: &str, allowed: &[String]) -> bool {
    let ct = content_type.split(';').next().unwrap_or(content_type).trim();
    allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(ct))
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
        })
        .next()
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> Result<String, DecodeError> {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: enc.name().to_string(),
        });
    }
    Ok(text.into_owned())
}
