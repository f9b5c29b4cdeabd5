use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_FIELD_MANAGER: &str = "wordpress-operator";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Namespace to watch. `None` watches every namespace.
    pub watch_namespace: Option<String>,
    /// Delay before the next pass after a child was created.
    pub retry_delay: Duration,
    /// Delay before retrying a pass that failed with a transient error.
    pub error_requeue: Duration,
    pub field_manager: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            retry_delay: Duration::from_secs(1),
            error_requeue: Duration::from_secs(60),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl OperatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup, starting from the defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("WATCH_NAMESPACE") {
            if !val.is_empty() {
                config.watch_namespace = Some(val);
            }
        }

        if let Some(val) = lookup("RETRY_DELAY_SECS") {
            config.retry_delay = parse_secs("RETRY_DELAY_SECS", &val)?;
        }

        if let Some(val) = lookup("ERROR_REQUEUE_SECS") {
            config.error_requeue = parse_secs("ERROR_REQUEUE_SECS", &val)?;
        }

        if let Some(val) = lookup("FIELD_MANAGER") {
            config.field_manager = val;
        }

        Ok(config)
    }

    pub fn watch_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.watch_namespace = Some(namespace.into());
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn error_requeue(mut self, delay: Duration) -> Self {
        self.error_requeue = delay;
        self
    }

    pub fn field_manager(mut self, name: impl Into<String>) -> Self {
        self.field_manager = name.into();
        self
    }
}

fn parse_secs(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::InvalidConfig(format!("Invalid {name}: {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = OperatorConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, OperatorConfig::default());
        assert_eq!(config.watch_namespace, None);
        assert_eq!(config.field_manager, "wordpress-operator");
    }

    #[test]
    fn reads_every_variable() {
        let config = OperatorConfig::from_vars(vars(&[
            ("WATCH_NAMESPACE", "blogs"),
            ("RETRY_DELAY_SECS", "5"),
            ("ERROR_REQUEUE_SECS", " 30 "),
            ("FIELD_MANAGER", "wp-test"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            OperatorConfig::new()
                .watch_namespace("blogs")
                .retry_delay(Duration::from_secs(5))
                .error_requeue(Duration::from_secs(30))
                .field_manager("wp-test")
        );
    }

    #[test]
    fn empty_namespace_means_all() {
        let config = OperatorConfig::from_vars(vars(&[("WATCH_NAMESPACE", "")])).unwrap();
        assert_eq!(config.watch_namespace, None);
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let err = OperatorConfig::from_vars(vars(&[("RETRY_DELAY_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("RETRY_DELAY_SECS"));
    }
}
