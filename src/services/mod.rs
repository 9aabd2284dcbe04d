pub mod backend_gateway;
pub mod recording_simulator;
pub mod score_reconciler;
pub mod upload_simulator;

pub use backend_gateway::BackendGateway;
pub use recording_simulator::CANNED_ANSWERS;
pub use score_reconciler::{ScoreReconciler, PLACEHOLDER_CEILING};
pub use upload_simulator::UploadProgress;
