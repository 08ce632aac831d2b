use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Model error: {message}")]
	Model { message: String },
	#[error("Retrieval error: {message}")]
	Retrieval { message: String },
	#[error("Search error: {message}")]
	Search { message: String },
}
impl Error {
	pub(crate) fn model(err: impl std::fmt::Display) -> Self {
		Self::Model { message: err.to_string() }
	}

	pub(crate) fn retrieval(err: impl std::fmt::Display) -> Self {
		Self::Retrieval { message: err.to_string() }
	}

	pub(crate) fn search(err: impl std::fmt::Display) -> Self {
		Self::Search { message: err.to_string() }
	}
}

pub(crate) fn timeout_message(operation: &str, limit: Duration) -> String {
	format!("{operation} timed out after {} ms.", limit.as_millis())
}
