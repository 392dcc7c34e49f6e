mod daglo_client;
mod transcription_provider_factory;

pub use daglo_client::{DAGLO_BASE_URL, DagloClient};
pub use transcription_provider_factory::TranscriptionProviderFactory;
