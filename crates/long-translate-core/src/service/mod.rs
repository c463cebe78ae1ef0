mod traits;
mod http;

pub use traits::{JobHandle, JobService, ResultStatus, TranslatedText, TranslationRequest};
pub use http::{HttpJobService, RESULT_PATH, SUBMIT_PATH};

use crate::config::ServiceConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create a job service from configuration
pub fn create_service(config: &ServiceConfig) -> Result<Arc<dyn JobService>> {
    Ok(Arc::new(HttpJobService::new(config)?))
}
