use std::collections::HashMap;

use qdrant_client::qdrant::{
	PointId, Query, QueryPointsBuilder, ScoredPoint, Value as QdrantValue, point_id::PointIdOptions,
	value::Kind,
};
use serde_json::{Map, Number, Value};

use crate::{Error, Result, models::SearchHit};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &aira_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, vector_dim: cfg.vector_dim })
	}

	/// Nearest neighbours of `vector` scoring at least `score_threshold`, best first.
	pub async fn search(
		&self,
		collection: &str,
		vector: &[f32],
		limit: u64,
		score_threshold: f32,
	) -> Result<Vec<SearchHit>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions, expected {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let query = QueryPointsBuilder::new(collection.to_string())
			.query(Query::new_nearest(vector.to_vec()))
			.limit(limit)
			.score_threshold(score_threshold)
			.with_payload(true);
		let response = self.client.query(query).await?;

		tracing::debug!(collection, hits = response.result.len(), "Vector query finished.");

		Ok(response.result.into_iter().map(scored_point_to_hit).collect())
	}
}

fn scored_point_to_hit(point: ScoredPoint) -> SearchHit {
	let external_id = point.id.as_ref().map(point_id_to_string).unwrap_or_default();

	SearchHit { external_id, score: point.score, payload: payload_to_json(point.payload) }
}

pub fn point_id_to_string(point_id: &PointId) -> String {
	match &point_id.point_id_options {
		Some(PointIdOptions::Num(id)) => id.to_string(),
		Some(PointIdOptions::Uuid(id)) => id.clone(),
		None => String::new(),
	}
}

pub fn payload_to_json(payload: HashMap<String, QdrantValue>) -> Map<String, Value> {
	payload.into_iter().map(|(key, value)| (key, value_to_json(value))).collect()
}

fn value_to_json(value: QdrantValue) -> Value {
	match value.kind {
		None | Some(Kind::NullValue(_)) => Value::Null,
		Some(Kind::BoolValue(flag)) => Value::Bool(flag),
		Some(Kind::IntegerValue(number)) => Value::Number(number.into()),
		Some(Kind::DoubleValue(number)) =>
			Number::from_f64(number).map_or(Value::Null, Value::Number),
		Some(Kind::StringValue(text)) => Value::String(text),
		Some(Kind::ListValue(list)) =>
			Value::Array(list.values.into_iter().map(value_to_json).collect()),
		Some(Kind::StructValue(object)) => Value::Object(payload_to_json(object.fields)),
	}
}

#[cfg(test)]
mod tests {
	use qdrant_client::qdrant::{ListValue, Struct};

	use super::*;

	fn value(kind: Kind) -> QdrantValue {
		QdrantValue { kind: Some(kind) }
	}

	#[test]
	fn converts_nested_payloads() {
		let mut skills = HashMap::new();

		skills.insert(
			"skills".to_string(),
			value(Kind::ListValue(ListValue {
				values: vec![
					value(Kind::StringValue("python".to_string())),
					value(Kind::StringValue("sql".to_string())),
				],
			})),
		);
		skills.insert("experience_years".to_string(), value(Kind::IntegerValue(6)));
		skills.insert("rating".to_string(), value(Kind::DoubleValue(4.5)));
		skills.insert("active".to_string(), value(Kind::BoolValue(true)));
		skills.insert(
			"meta".to_string(),
			value(Kind::StructValue(Struct {
				fields: HashMap::from([(
					"level".to_string(),
					value(Kind::StringValue("senior".to_string())),
				)]),
			})),
		);

		let json = payload_to_json(skills);

		assert_eq!(json["skills"], serde_json::json!(["python", "sql"]));
		assert_eq!(json["experience_years"], 6);
		assert_eq!(json["rating"], 4.5);
		assert_eq!(json["active"], true);
		assert_eq!(json["meta"]["level"], "senior");
	}

	#[test]
	fn renders_point_ids() {
		let numeric = PointId { point_id_options: Some(PointIdOptions::Num(17)) };
		let uuid = PointId {
			point_id_options: Some(PointIdOptions::Uuid(
				"6f1c4f7e-8a55-4c3e-9a57-0d5b4f0e2a11".to_string(),
			)),
		};

		assert_eq!(point_id_to_string(&numeric), "17");
		assert_eq!(point_id_to_string(&uuid), "6f1c4f7e-8a55-4c3e-9a57-0d5b4f0e2a11");
		assert_eq!(point_id_to_string(&PointId { point_id_options: None }), "");
	}
}
