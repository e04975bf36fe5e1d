//! Style Sheet Configuration

use serde::Deserialize;

use crate::hash::Hasher;

/// Style sheet configuration options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix generated ids with caller display names
    pub debug: bool,

    /// Id hash function
    #[serde(skip)]
    pub hasher: Hasher,
}

impl Config {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.debug);
        assert_eq!(config.hasher.hash("a"), "3t1g");
    }

    #[test]
    fn test_deserialize_config() {
        let config: Config = serde_json::from_str(r#"{ "debug": true }"#).unwrap();
        assert!(config.debug);

        let empty: Config = serde_json::from_str("{}").unwrap();
        assert!(!empty.debug);
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_debug(true)
            .with_hasher(Hasher::new(|text| text.to_uppercase()));
        assert!(config.debug);
        assert_eq!(config.hasher.hash("ab"), "AB");
    }
}
