use std::sync::Arc;

use aira_service::AiraService;
use aira_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<AiraService>,
}
impl AppState {
	pub fn new(config: aira_config::Config) -> color_eyre::Result<Self> {
		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let service = AiraService::new(config, Arc::new(qdrant));

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: AiraService) -> Self {
		Self { service: Arc::new(service) }
	}
}
