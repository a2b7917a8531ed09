//! Shared fixtures for integration tests
//!
//! `StubCaller` scripts replies per model name so patterns can be exercised
//! without any network access.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use triproute::collector::MetricsCollector;
use triproute::error::{ModelCallError, UnavailableKind};
use triproute::metrics::Metrics;
use triproute::models::{ModelCaller, ModelHandle, ModelRegistry, ModelRole};
use triproute::orchestration::{OrchestrationContext, Orchestrator};

pub const FAST: &str = "gemini_25_flash";
pub const STRONG: &str = "gemini_25_pro";
pub const CHEAP: &str = "gemini_20_flash";
pub const CREATIVE: &str = "openai_creative";

/// Long, assertive, no hedging: passes every quality rule
pub const CONFIDENT_ANSWER: &str = "Kyoto is best in early April when the cherry blossoms \
    line the Philosopher's Path and the temples are open late.";

#[derive(Debug, Clone)]
pub enum Reply {
    Answer(String),
    Fail(ModelCallError),
}

pub fn answer(text: &str) -> Reply {
    Reply::Answer(text.to_string())
}

pub fn unavailable(model: &str) -> Reply {
    Reply::Fail(ModelCallError::Unavailable {
        model: model.to_string(),
        kind: UnavailableKind::NotFound,
        detail: format!("models/{model} is not found for API version v1beta"),
    })
}

pub fn server_error(model: &str) -> Reply {
    Reply::Fail(ModelCallError::Http {
        model: model.to_string(),
        status: 500,
        body: "internal error".to_string(),
    })
}

/// Scripted model caller
///
/// Each model has a queue of replies consumed in call order; the last
/// reply repeats once the queue is down to one. Unscripted models fail
/// with a transport error.
#[derive(Default)]
pub struct StubCaller {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubCaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, model: &str, reply: Reply) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Every (model, prompt) pair in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|(model, _)| model).collect()
    }

    pub fn calls_to(&self, model: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == model).count()
    }
}

#[async_trait]
impl ModelCaller for StubCaller {
    async fn invoke(&self, handle: &ModelHandle, prompt: &str) -> Result<String, ModelCallError> {
        self.calls
            .lock()
            .unwrap()
            .push((handle.name().to_string(), prompt.to_string()));

        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(handle.name()) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Answer(text)) => Ok(text),
            Some(Reply::Fail(e)) => Err(e),
            None => Err(ModelCallError::Transport {
                model: handle.name().to_string(),
                message: "no scripted reply".to_string(),
            }),
        }
    }
}

pub fn registry(with_creative: bool) -> ModelRegistry {
    let registry = ModelRegistry::new(
        ModelHandle::new(ModelRole::Fast, FAST, "gemini-2.5-flash"),
        ModelHandle::new(ModelRole::Strong, STRONG, "gemini-2.5-pro"),
        ModelHandle::new(ModelRole::Cheap, CHEAP, "gemini-2.0-flash"),
    )
    .expect("fixture names are distinct");
    if with_creative {
        registry
            .with_creative(ModelHandle::new(ModelRole::Creative, CREATIVE, "gpt-4o"))
            .expect("fixture names are distinct")
    } else {
        registry
    }
}

pub struct Harness {
    pub caller: Arc<StubCaller>,
    pub collector: Arc<MetricsCollector>,
    pub metrics: Arc<Metrics>,
    pub orchestrator: Orchestrator,
}

pub fn harness(caller: StubCaller, with_creative: bool) -> Harness {
    let caller = Arc::new(caller);
    let metrics = Arc::new(Metrics::new().expect("should create Metrics"));
    let collector = Arc::new(MetricsCollector::new().with_metrics(metrics.clone()));
    let ctx = OrchestrationContext::new(
        Arc::new(registry(with_creative)),
        caller.clone(),
        collector.clone(),
    );

    Harness {
        caller,
        collector,
        metrics,
        orchestrator: Orchestrator::new(ctx),
    }
}
