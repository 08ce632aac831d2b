use serde_json::{Map, Value};

/// One scored point from a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
	/// Point id rendered as a string; numeric ids become their decimal form.
	pub external_id: String,
	/// Cosine similarity.
	pub score: f32,
	pub payload: Map<String, Value>,
}
impl SearchHit {
	pub fn str_field(&self, key: &str) -> Option<&str> {
		self.payload.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
	}

	pub fn f64_field(&self, key: &str) -> Option<f64> {
		self.payload.get(key).and_then(Value::as_f64)
	}

	pub fn u64_field(&self, key: &str) -> Option<u64> {
		let value = self.payload.get(key)?;

		value.as_u64().or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
	}

	/// The payload `id` when present, the point id otherwise.
	pub fn id(&self) -> String {
		match self.payload.get("id") {
			Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
			Some(Value::Number(id)) => id.to_string(),
			_ => self.external_id.clone(),
		}
	}
}
