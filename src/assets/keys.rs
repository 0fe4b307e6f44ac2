//! The fixed set of model identities

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three supported models, each bound to a static asset path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKey {
    Sprout,
    Lantern,
    Automaton,
}

impl ModelKey {
    /// Every supported model, in preload order
    pub const ALL: [ModelKey; 3] = [ModelKey::Sprout, ModelKey::Lantern, ModelKey::Automaton];

    /// Static asset path of the model resource
    pub fn asset_path(&self) -> &'static str {
        match self {
            ModelKey::Sprout => "assets/models/sprout.glb",
            ModelKey::Lantern => "assets/models/lantern.glb",
            ModelKey::Automaton => "assets/models/automaton.glb",
        }
    }

    /// Placeholder tint used when the real asset fails to load
    ///
    /// A fixed function of the key so a degraded session still tells the
    /// models apart.
    pub fn placeholder_color(&self) -> [f32; 3] {
        match self {
            ModelKey::Sprout => [0.30, 0.69, 0.31],
            ModelKey::Lantern => [1.00, 0.76, 0.03],
            ModelKey::Automaton => [0.38, 0.49, 0.55],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelKey::Sprout => "sprout",
            ModelKey::Lantern => "lantern",
            ModelKey::Automaton => "automaton",
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ModelKey::Sprout)]
    #[test_case(ModelKey::Lantern)]
    #[test_case(ModelKey::Automaton)]
    fn test_asset_path_is_fixed(key: ModelKey) {
        assert!(key.asset_path().starts_with("assets/models/"));
        assert!(key.asset_path().ends_with(".glb"));
    }

    #[test]
    fn test_placeholder_colors_are_distinct() {
        let colors: Vec<_> = ModelKey::ALL
            .iter()
            .map(|k| k.placeholder_color().map(|c| (c * 1000.0) as u32))
            .collect();
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&ModelKey::Lantern).expect("serialize");
        assert_eq!(json, "\"lantern\"");
        let key: ModelKey = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(key, ModelKey::Lantern);
    }
}
