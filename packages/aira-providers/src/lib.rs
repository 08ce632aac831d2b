pub mod chat;
pub mod embedding;
pub mod web_search;

use color_eyre::{Result, eyre};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// Bearer authorization plus the configured default headers.
pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	extend_headers(&mut headers, default_headers)?;

	Ok(headers)
}

/// API-key header auth (`X-API-KEY` style) plus the configured default headers.
pub fn api_key_headers(
	header_name: &str,
	api_key: &str,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(HeaderName::from_bytes(header_name.as_bytes())?, api_key.parse()?);
	extend_headers(&mut headers, default_headers)?;

	Ok(headers)
}

fn extend_headers(headers: &mut HeaderMap, default_headers: &Map<String, Value>) -> Result<()> {
	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header values must be strings."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(())
}
