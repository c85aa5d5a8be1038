use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroCapacity { field: &'static str },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fixed capacities for the stacks of one execution context. Buffers are
/// sized from these once and never grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    pub call_stack_size: usize,
    pub eval_stack_size: usize,
    pub container_stack_size: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            call_stack_size: 512,
            eval_stack_size: 256,
            container_stack_size: 128,
        }
    }
}

impl StackConfig {
    /// Parse from JSON; missing fields keep their defaults.
    pub fn from_json(src: &str) -> Result<Self, ConfigError> {
        let config: StackConfig = serde_json::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, size) in [
            ("call_stack_size", self.call_stack_size),
            ("eval_stack_size", self.eval_stack_size),
            ("container_stack_size", self.container_stack_size),
        ] {
            if size == 0 {
                return Err(ConfigError::ZeroCapacity { field });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = StackConfig::default();
        assert_eq!(c.call_stack_size, 512);
        assert_eq!(c.eval_stack_size, 256);
        assert_eq!(c.container_stack_size, 128);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = StackConfig::from_json(r#"{"eval_stack_size": 8}"#).unwrap();
        assert_eq!(c.eval_stack_size, 8);
        assert_eq!(c.call_stack_size, 512);
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = StackConfig::from_json(r#"{"call_stack_size": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroCapacity { field: "call_stack_size" }));
        assert_eq!(err.to_string(), "call_stack_size must be greater than zero");
    }

    #[test]
    fn unknown_field_rejected() {
        let err = StackConfig::from_json(r#"{"heap_size": 4}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
