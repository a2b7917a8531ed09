//! The set of model handles the orchestration patterns draw from

use crate::config::{Config, ModelEndpoint};
use crate::error::{AppError, AppResult};
use crate::models::{ModelHandle, ModelRole};
use std::collections::HashSet;

/// Immutable registry of handles by role
///
/// `fast`, `strong` and `cheap` always exist; `creative` is optional.
/// Logical names are unique: ensemble answers and ledger rows are keyed by
/// them.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    fast: ModelHandle,
    strong: ModelHandle,
    cheap: ModelHandle,
    creative: Option<ModelHandle>,
}

impl ModelRegistry {
    /// Fails if two handles share a logical name
    pub fn new(fast: ModelHandle, strong: ModelHandle, cheap: ModelHandle) -> AppResult<Self> {
        let registry = Self {
            fast,
            strong,
            cheap,
            creative: None,
        };
        registry.ensure_unique_names()?;
        Ok(registry)
    }

    /// Fails if the creative handle reuses another role's logical name
    pub fn with_creative(mut self, creative: ModelHandle) -> AppResult<Self> {
        self.creative = Some(creative);
        self.ensure_unique_names()?;
        Ok(self)
    }

    fn ensure_unique_names(&self) -> AppResult<()> {
        let mut seen = HashSet::new();
        for handle in self.handles() {
            if !seen.insert(handle.name()) {
                return Err(AppError::Config(format!(
                    "models.{}: duplicate model name '{}'. \
                    Logical names must be unique across fast, strong, cheap and creative.",
                    handle.role(),
                    handle.name()
                )));
            }
        }
        Ok(())
    }

    /// Build handles for every configured role
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let handle = |role: ModelRole, endpoint: &ModelEndpoint| {
            ModelHandle::from_endpoint(role, endpoint, config.timeout_for(role))
        };

        let models = &config.models;
        let registry = Self::new(
            handle(ModelRole::Fast, &models.fast),
            handle(ModelRole::Strong, &models.strong),
            handle(ModelRole::Cheap, &models.cheap),
        )?;

        let registry = match &models.creative {
            Some(endpoint) => registry.with_creative(handle(ModelRole::Creative, endpoint))?,
            None => registry,
        };

        tracing::info!(
            fast = %registry.fast.name(),
            strong = %registry.strong.name(),
            cheap = %registry.cheap.name(),
            creative = registry.creative.as_ref().map(|h| h.name()).unwrap_or("<none>"),
            "Model registry initialized"
        );

        Ok(registry)
    }

    pub fn fast(&self) -> &ModelHandle {
        &self.fast
    }

    pub fn strong(&self) -> &ModelHandle {
        &self.strong
    }

    pub fn cheap(&self) -> &ModelHandle {
        &self.cheap
    }

    pub fn creative(&self) -> Option<&ModelHandle> {
        self.creative.as_ref()
    }

    /// Handle for a role, `None` only for an unconfigured creative model
    pub fn get(&self, role: ModelRole) -> Option<&ModelHandle> {
        match role {
            ModelRole::Fast => Some(&self.fast),
            ModelRole::Strong => Some(&self.strong),
            ModelRole::Cheap => Some(&self.cheap),
            ModelRole::Creative => self.creative.as_ref(),
        }
    }

    /// All configured handles in role order
    pub fn handles(&self) -> impl Iterator<Item = &ModelHandle> {
        [Some(&self.fast), Some(&self.strong), Some(&self.cheap), self.creative.as_ref()]
            .into_iter()
            .flatten()
    }
}
