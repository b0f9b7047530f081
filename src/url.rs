//! Wraps the binary message into a search-page URL and back.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{DecodeError, EncodeError};
use crate::proto;
use crate::query::{Localization, Request};

pub const BASE_URL: &str = "https://www.google.com/travel/flights";

pub const BLOB_PARAM: &str = "tfs";
pub const LANGUAGE_PARAM: &str = "hl";
pub const COUNTRY_PARAM: &str = "gl";
pub const CURRENCY_PARAM: &str = "curr";

/// URL-safe alphabet, tolerant of missing padding.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base64url with padding kept; the page expects `=` and percent-encodes it.
pub fn encode_blob(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Accepts URL-safe or standard alphabet, padded or not.
pub fn decode_blob(blob: &str) -> Result<Vec<u8>, DecodeError> {
    let normalized: String = blob
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    LENIENT_URL_SAFE
        .decode(normalized.as_bytes())
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

pub fn locale_params(locale: &Localization) -> Vec<(String, String)> {
    vec![
        (LANGUAGE_PARAM.to_string(), locale.language.clone()),
        (COUNTRY_PARAM.to_string(), locale.country.clone()),
        (CURRENCY_PARAM.to_string(), locale.currency.clone()),
    ]
}

pub fn to_url_params(request: &Request) -> Result<Vec<(String, String)>, EncodeError> {
    let encoded = proto::encode(request)?;
    let mut params = vec![(BLOB_PARAM.to_string(), encode_blob(&encoded))];
    params.extend(locale_params(&request.locale));
    Ok(params)
}

pub fn build_url(params: &[(String, String)]) -> String {
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{BASE_URL}?{}", query.join("&"))
}

pub fn encode_url(request: &Request) -> Result<String, EncodeError> {
    Ok(build_url(&to_url_params(request)?))
}

fn percent_decode(field: &'static str, raw: &str) -> Result<String, DecodeError> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|_| DecodeError::InvalidValue {
            field,
            value: raw.to_string(),
        })
}

/// Query string of a URL, or `None` when the input is a bare blob.
fn query_part(input: &str) -> Option<&str> {
    let input = input.split('#').next().unwrap_or(input);
    if let Some((_, query)) = input.split_once('?') {
        return Some(query);
    }
    if input.starts_with(&format!("{BLOB_PARAM}=")) {
        return Some(input);
    }
    None
}

/// Decodes a full search URL, a `tfs=...` query string, or a bare blob.
/// Missing localization parameters fall back to the defaults.
pub fn decode_url(input: &str) -> Result<Request, DecodeError> {
    let input = input.trim();

    let Some(query) = query_part(input) else {
        let blob = percent_decode(BLOB_PARAM, input)?;
        return proto::decode(&decode_blob(&blob)?);
    };

    let mut blob = None;
    let mut locale = Localization::default();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            BLOB_PARAM => blob = Some(percent_decode(BLOB_PARAM, value)?),
            LANGUAGE_PARAM => locale.language = percent_decode("language", value)?,
            COUNTRY_PARAM => locale.country = percent_decode("country", value)?,
            CURRENCY_PARAM => locale.currency = percent_decode("currency", value)?,
            _ => tracing::debug!(param = key, "ignoring query parameter"),
        }
    }

    let blob = blob.ok_or(DecodeError::MissingField(BLOB_PARAM))?;
    let mut request = proto::decode(&decode_blob(&blob)?)?;
    request.locale = locale;
    Ok(request)
}
