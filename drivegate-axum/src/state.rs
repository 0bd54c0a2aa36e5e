use std::sync::Arc;

use crate::handler::{Failure, RequestHandler};
use crate::GateAxumError;

/// Shared by every request on the router.
#[derive(Clone)]
pub struct GateState {
    pub handler: Arc<RequestHandler>,
    pub homepage: Option<Arc<str>>,
}

impl GateState {
    pub fn new(handler: RequestHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            homepage: None,
        }
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(Arc::from(homepage.into()));
        self
    }

    pub fn error(&self, failure: Failure) -> GateAxumError {
        GateAxumError::new(failure.error, self.homepage.clone()).with_no_cache(failure.protected)
    }
}
