use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Represents an Anthropic model identifier.
///
/// This can be a predefined model version or a custom string value
/// for models that may be added in the future.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier (for future models or private models)
    Custom(String),
}

/// Known Anthropic model versions
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KnownModel {
    /// Claude Sonnet 4 (2025-05-14 version); the counselor's default.
    ClaudeSonnet4_20250514,

    /// Claude Sonnet 4 (alias)
    ClaudeSonnet40,

    /// Claude Opus 4.1 (alias)
    ClaudeOpus41,

    /// Claude Haiku 4.5 (alias)
    ClaudeHaiku45,
}

impl KnownModel {
    const ALL: [KnownModel; 4] = [
        KnownModel::ClaudeSonnet4_20250514,
        KnownModel::ClaudeSonnet40,
        KnownModel::ClaudeOpus41,
        KnownModel::ClaudeHaiku45,
    ];

    /// The identifier sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::ClaudeSonnet4_20250514 => "claude-sonnet-4-20250514",
            KnownModel::ClaudeSonnet40 => "claude-sonnet-4-0",
            KnownModel::ClaudeOpus41 => "claude-opus-4-1",
            KnownModel::ClaudeHaiku45 => "claude-haiku-4-5",
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::ClaudeSonnet4_20250514)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{known_model}"),
            Model::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    /// Known identifiers map to [`Model::Known`]; anything else is kept verbatim.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(KnownModel::ALL
            .iter()
            .find(|known| known.as_str() == s)
            .map(|known| Model::Known(*known))
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        match model.parse::<Model>() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::from(model.as_str())
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_sonnet_4() {
        assert_eq!(Model::default().to_string(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn known_model_serialization() {
        let model = Model::Known(KnownModel::ClaudeHaiku45);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""claude-haiku-4-5""#);
    }

    #[test]
    fn custom_model_serialization() {
        let model = Model::Custom("claude-5-custom".to_string());
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""claude-5-custom""#);
    }

    #[test]
    fn model_deserialization() {
        let model: Model = serde_json::from_str(r#""claude-sonnet-4-0""#).unwrap();
        assert_eq!(model, Model::Known(KnownModel::ClaudeSonnet40));

        let model: Model = serde_json::from_str(r#""claude-5-custom""#).unwrap();
        assert_eq!(model, Model::Custom("claude-5-custom".to_string()));
    }

    #[test]
    fn parse_trims_whitespace() {
        let model: Model = "  claude-opus-4-1 ".parse().unwrap();
        assert_eq!(model, Model::Known(KnownModel::ClaudeOpus41));
    }
}
