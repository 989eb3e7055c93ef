use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// A model addressed as `provider/modelId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderModel {
    pub provider: String,
    pub model_id: String,
}

impl ProviderModel {
    pub fn new(provider: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_id: model_id.into(),
        }
    }

    /// Parse `provider/modelId`. Only the first `/` separates; the model id may
    /// contain more slashes. Both sides must be non-empty.
    pub fn parse(raw: &str) -> Result<Self, TaskError> {
        let trimmed = raw.trim();
        match trimmed.split_once('/') {
            Some((provider, model_id)) if !provider.is_empty() && !model_id.is_empty() => {
                Ok(Self::new(provider, model_id))
            }
            _ => Err(TaskError::ConfigResolution(format!(
                "Invalid model \"{raw}\": expected \"provider/modelId\""
            ))),
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.provider, self.model_id)
    }
}

impl fmt::Display for ProviderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_and_model() {
        let m = ProviderModel::parse("acme/modelZ").unwrap();
        assert_eq!(m.provider, "acme");
        assert_eq!(m.model_id, "modelZ");
        assert_eq!(m.label(), "acme/modelZ");

        let nested = ProviderModel::parse("router/vendor/model-1").unwrap();
        assert_eq!(nested.provider, "router");
        assert_eq!(nested.model_id, "vendor/model-1");
    }

    #[test]
    fn rejects_malformed_models() {
        for raw in ["acme", "/modelZ", "acme/", "", "/"] {
            let err = ProviderModel::parse(raw).unwrap_err();
            assert!(matches!(err, TaskError::ConfigResolution(_)), "{raw}");
            assert!(err.to_string().contains("provider/modelId"));
        }
    }
}
