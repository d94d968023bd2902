//! Test utilities & fixtures: a scripted stand-in for the hosted model.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use escaperoom::relay::client::{ModelClient, ModelError, ModelRequest};
use escaperoom::relay::Relay;

/// Replays canned replies in order and records every request.
pub struct ScriptedModel {
    configured: bool,
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

#[allow(dead_code)] // not every test binary uses every helper
impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: ModelError) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            replies: Mutex::new(VecDeque::from([Err(error)])),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, request: ModelRequest) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::EmptyReply))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

#[allow(dead_code)]
pub fn relay(model: &Arc<ScriptedModel>) -> Arc<Relay> {
    Arc::new(Relay::new(model.clone()))
}
