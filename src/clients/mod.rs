pub mod backend_client;

pub use backend_client::{EvaluationBackend, EvaluationRequest, EvaluationResponse, HttpBackend};
