mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Agent, Config, EmbeddingProviderConfig, LlmProviderConfig, Matching, Providers, Qdrant,
	Security, Service, Storage, WebSearchProviderConfig,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}

	for (label, collection) in [
		("storage.qdrant.courses_collection", &cfg.storage.qdrant.courses_collection),
		("storage.qdrant.mentors_collection", &cfg.storage.qdrant.mentors_collection),
	] {
		if collection.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if !cfg.providers.llm.temperature.is_finite() || cfg.providers.llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if cfg.providers.llm.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.llm.max_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.web_search.num_results == 0 {
		return Err(Error::Validation {
			message: "providers.web_search.num_results must be greater than zero.".to_string(),
		});
	}

	for (label, timeout_ms) in [
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.llm.timeout_ms", cfg.providers.llm.timeout_ms),
		("providers.web_search.timeout_ms", cfg.providers.web_search.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
		("web_search", &cfg.providers.web_search.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	validate_matching(cfg)?;
	validate_agent(cfg)?;

	Ok(())
}

fn validate_matching(cfg: &Config) -> Result<()> {
	let matching = &cfg.matching;

	for (label, value) in [
		("matching.exact_threshold", matching.exact_threshold),
		("matching.related_threshold", matching.related_threshold),
		("matching.admission_threshold", matching.admission_threshold),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if matching.admission_threshold > matching.related_threshold {
		return Err(Error::Validation {
			message: "matching.admission_threshold must not exceed matching.related_threshold."
				.to_string(),
		});
	}
	if matching.related_threshold > matching.exact_threshold {
		return Err(Error::Validation {
			message: "matching.related_threshold must not exceed matching.exact_threshold."
				.to_string(),
		});
	}

	for (label, value) in [
		("matching.default_limit", matching.default_limit),
		("matching.keyword_top_k", matching.keyword_top_k),
		("matching.fallback_count", matching.fallback_count),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if !matching.budget_price_ceiling.is_finite() || matching.budget_price_ceiling < 0.0 {
		return Err(Error::Validation {
			message: "matching.budget_price_ceiling must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if matching.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "matching.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_agent(cfg: &Config) -> Result<()> {
	let agent = &cfg.agent;

	for (label, value) in [
		("agent.max_iterations", agent.max_iterations),
		("agent.max_sources", agent.max_sources),
		("agent.max_recommendations", agent.max_recommendations),
		("agent.max_query_chars", agent.max_query_chars),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if agent.tool_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "agent.tool_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let level = cfg.service.log_level.trim();

	cfg.service.log_level = if level.is_empty() { "info".to_string() } else { level.to_string() };
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
	cfg.providers.llm.api_base = cfg.providers.llm.api_base.trim_end_matches('/').to_string();
	cfg.providers.web_search.api_base =
		cfg.providers.web_search.api_base.trim_end_matches('/').to_string();
}
