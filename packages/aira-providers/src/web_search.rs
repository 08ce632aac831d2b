//! Serper-compatible web search.

use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;
use serde_json::Value;
use time::OffsetDateTime;

use aira_domain::text::WordIndex;

/// Operators appended to every query to keep social media out of the results.
pub const SOCIAL_MEDIA_EXCLUSIONS: &[&str] = &[
	"-site:instagram.com",
	"-site:facebook.com",
	"-site:tiktok.com",
	"-site:twitter.com",
	"-site:youtube.com",
	"-site:pinterest.com",
];

/// Education and admission terms that restrict results to `.az` domains.
pub const OFFICIAL_SOURCE_TRIGGERS: &[&str] = &[
	"bal",
	"qəbul",
	"keçid",
	"dim",
	"universitet",
	"university",
	"imtahan",
	"exam",
	"admission",
	"score",
	"magistr",
	"bakalavr",
	"plan yeri",
	"ixtisas",
	"fakültə",
];

/// Time-sensitive terms that get the current year appended.
pub const TEMPORAL_TRIGGERS: &[&str] = &[
	"maaş",
	"salary",
	"qiymət",
	"price",
	"hal-hazırda",
	"now",
	"trend",
	"trends",
	"statistic",
	"statistics",
	"orta",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebHit {
	pub title: String,
	pub link: String,
	pub snippet: String,
	pub date: Option<String>,
}

pub async fn search(
	cfg: &aira_config::WebSearchProviderConfig,
	query: &str,
) -> Result<Vec<WebHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let optimized = optimize_query(query, OffsetDateTime::now_utc().year());

	tracing::debug!(query = %optimized, "Sending web search.");

	let body = serde_json::json!({
		"q": optimized,
		"gl": cfg.country,
		"hl": cfg.language,
		"num": cfg.num_results,
	});
	let res = client
		.post(url)
		.headers(crate::api_key_headers("X-API-KEY", &cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(parse_search_response(&json))
}

/// Rewrites a user query for the search backend.
///
/// Trigger terms are matched on word boundaries, so "dim" does not fire inside "dimension".
pub fn optimize_query(query: &str, current_year: i32) -> String {
	let words = WordIndex::new(query);
	let mut optimized = query.trim().to_string();

	for exclusion in SOCIAL_MEDIA_EXCLUSIONS {
		optimized.push(' ');
		optimized.push_str(exclusion);
	}

	if words.contains_any(OFFICIAL_SOURCE_TRIGGERS) {
		optimized.push_str(" site:.az");
	}
	if words.contains_any(TEMPORAL_TRIGGERS)
		&& !query.contains(&current_year.to_string())
		&& !query.contains(&(current_year - 1).to_string())
	{
		optimized.push(' ');
		optimized.push_str(&current_year.to_string());
	}

	optimized
}

/// Organic results in rank order. A response without an `organic` array has no hits.
pub fn parse_search_response(json: &Value) -> Vec<WebHit> {
	let Some(organic) = json.get("organic").and_then(Value::as_array) else {
		return Vec::new();
	};

	organic
		.iter()
		.map(|item| {
			let field =
				|key: &str| item.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

			WebHit {
				title: field("title"),
				link: field("link"),
				snippet: field("snippet"),
				date: item
					.get("date")
					.and_then(Value::as_str)
					.filter(|date| !date.is_empty())
					.map(str::to_string),
			}
		})
		.collect()
}
