#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings of an [`OrbNode`](crate::OrbNode).
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NodeSettings {
    /// The maximum number of features published per image
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_nfeatures"))]
    pub nfeatures: usize,
}

impl NodeSettings {
    /// The detector configuration these settings select.
    pub fn orb(&self) -> orb::Orb {
        orb::Orb::new(self.nfeatures)
    }
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            nfeatures: default_nfeatures(),
        }
    }
}

fn default_nfeatures() -> usize {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_detector() {
        let settings = NodeSettings::default();
        assert_eq!(settings.nfeatures, 500);
        assert_eq!(settings.orb(), orb::Orb::default());
    }

    #[cfg(feature = "serde-serialize")]
    #[test]
    fn missing_fields_take_defaults() {
        let settings: NodeSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, NodeSettings::default());
        let settings: NodeSettings = serde_json::from_str(r#"{"nfeatures": 42}"#).unwrap();
        assert_eq!(settings.nfeatures, 42);
    }
}
