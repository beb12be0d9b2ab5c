//! Built-in model catalog
//!
//! The set of supported models is the [`ModelId`] enumeration. Token ceilings
//! and pricing are embedded from `builtin_models.toml` at build time and are
//! checked against that enumeration before first use, so a model with limits
//! but no pricing (or the reverse) is rejected instead of silently served.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

const BUILTIN_CATALOG: &str = include_str!("../builtin_models.toml");

static CATALOG: LazyLock<ModelCatalog> = LazyLock::new(|| {
    ModelCatalog::from_toml(BUILTIN_CATALOG)
        .unwrap_or_else(|err| panic!("builtin_models.toml is inconsistent: {err}"))
});

/// The validated built-in catalog.
pub fn catalog() -> &'static ModelCatalog {
    &CATALOG
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelId {
    Gpt35Turbo,
    Gpt35Turbo16k,
    Gpt4,
    Gpt4_32k,
    Gpt4TurboPreview,
    Gpt4o,
    Claude3Opus,
    CommandRPlus,
    MistralMedium,
    MistralLarge,
    GeminiPro,
    Glm4,
    Abab65Chat,
    MoonshotV1_128k,
    ErnieBot4,
    SparkDesk,
    SenseChat5,
    Qwen15_110bChat,
    Baichuan4,
}

impl ModelId {
    /// Supported models in display and selection order.
    pub const ALL: [ModelId; 19] = [
        ModelId::Gpt35Turbo,
        ModelId::Gpt35Turbo16k,
        ModelId::Gpt4,
        ModelId::Gpt4_32k,
        ModelId::Gpt4TurboPreview,
        ModelId::Gpt4o,
        ModelId::Claude3Opus,
        ModelId::CommandRPlus,
        ModelId::MistralMedium,
        ModelId::MistralLarge,
        ModelId::GeminiPro,
        ModelId::Glm4,
        ModelId::Abab65Chat,
        ModelId::MoonshotV1_128k,
        ModelId::ErnieBot4,
        ModelId::SparkDesk,
        ModelId::SenseChat5,
        ModelId::Qwen15_110bChat,
        ModelId::Baichuan4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
            ModelId::Gpt35Turbo16k => "gpt-3.5-turbo-16k",
            ModelId::Gpt4 => "gpt-4",
            ModelId::Gpt4_32k => "gpt-4-32k",
            ModelId::Gpt4TurboPreview => "gpt-4-turbo-preview",
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Claude3Opus => "claude-3-opus",
            ModelId::CommandRPlus => "command-r-plus",
            ModelId::MistralMedium => "mistral-medium",
            ModelId::MistralLarge => "mistral-large",
            ModelId::GeminiPro => "gemini-pro",
            ModelId::Glm4 => "glm-4",
            ModelId::Abab65Chat => "abab6.5-chat",
            ModelId::MoonshotV1_128k => "moonshot-v1-128k",
            ModelId::ErnieBot4 => "ERNIE-Bot-4",
            ModelId::SparkDesk => "SparkDesk",
            ModelId::SenseChat5 => "SenseChat-5",
            ModelId::Qwen15_110bChat => "qwen1.5-110b-chat",
            ModelId::Baichuan4 => "Baichuan4",
        }
    }

    /// Token ceiling for one exchange (prompt + completion).
    pub fn limits(self) -> ModelLimits {
        catalog().limits(self)
    }

    pub fn pricing(self) -> ModelPricing {
        catalog().pricing(self)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl Default for ModelId {
    fn default() -> Self {
        catalog().default_model()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ModelId {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // "gpt-4-o" was written to older session payloads.
        if value == "gpt-4-o" {
            return Ok(ModelId::Gpt4o);
        }
        ModelId::ALL
            .into_iter()
            .find(|id| id.as_str() == value)
            .ok_or_else(|| format!("unsupported model: {value}"))
    }
}

impl TryFrom<String> for ModelId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl From<ModelId> for String {
    fn from(value: ModelId) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLimits {
    pub max_tokens: u32,
}

/// A per-token price: `amount` USD for every `unit` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub unit: u32,
}

impl Price {
    pub fn cost(&self, tokens: u64) -> f64 {
        self.amount * tokens as f64 / f64::from(self.unit)
    }

    fn is_valid(&self) -> bool {
        self.amount.is_finite() && self.amount >= 0.0 && self.unit > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub prompt: Price,
    pub completion: Price,
}

impl ModelPricing {
    /// Estimated USD cost of one exchange.
    pub fn estimate(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        self.prompt.cost(prompt_tokens) + self.completion.cost(completion_tokens)
    }
}

/// Catalog tables as written in the catalog file, keyed by model string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogTables {
    pub default_model: String,
    #[serde(default)]
    pub limits: BTreeMap<String, u32>,
    #[serde(default)]
    pub pricing: BTreeMap<String, ModelPricing>,
}

#[derive(Debug)]
pub enum CatalogError {
    Parse(toml::de::Error),
    /// A table names a model outside [`ModelId::ALL`].
    UnknownModel {
        table: &'static str,
        id: String,
    },
    /// Two keys in one table resolve to the same model.
    Duplicate {
        table: &'static str,
        model: ModelId,
    },
    MissingLimits(ModelId),
    MissingPricing(ModelId),
    ZeroLimit(ModelId),
    InvalidPrice(ModelId),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Parse(source) => write!(f, "failed to parse model catalog: {source}"),
            CatalogError::UnknownModel { table, id } => {
                write!(f, "{table} table references unsupported model '{id}'")
            }
            CatalogError::Duplicate { table, model } => {
                write!(f, "{table} table lists model '{model}' more than once")
            }
            CatalogError::MissingLimits(model) => write!(f, "no token limit for model '{model}'"),
            CatalogError::MissingPricing(model) => write!(f, "no pricing for model '{model}'"),
            CatalogError::ZeroLimit(model) => write!(f, "token limit for '{model}' is zero"),
            CatalogError::InvalidPrice(model) => write!(
                f,
                "pricing for '{model}' must use non-negative amounts and a positive unit"
            ),
        }
    }
}

impl StdError for CatalogError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CatalogError::Parse(source) => Some(source),
            _ => None,
        }
    }
}

fn resolve_keys<V>(
    table: &'static str,
    entries: BTreeMap<String, V>,
) -> Result<BTreeMap<ModelId, V>, CatalogError> {
    let mut resolved = BTreeMap::new();
    for (id, value) in entries {
        let model = ModelId::try_from(id.as_str())
            .map_err(|_| CatalogError::UnknownModel { table, id })?;
        if resolved.insert(model, value).is_some() {
            return Err(CatalogError::Duplicate { table, model });
        }
    }
    Ok(resolved)
}

impl CatalogTables {
    /// Check that the supported list, the limits table and the pricing table
    /// cover exactly the same models.
    pub fn validate(self) -> Result<ModelCatalog, CatalogError> {
        let default_model = ModelId::try_from(self.default_model.as_str()).map_err(|_| {
            CatalogError::UnknownModel {
                table: "default_model",
                id: self.default_model.clone(),
            }
        })?;
        let limits = resolve_keys("limits", self.limits)?;
        let pricing = resolve_keys("pricing", self.pricing)?;

        let mut ordered_limits = Vec::with_capacity(ModelId::ALL.len());
        let mut ordered_pricing = Vec::with_capacity(ModelId::ALL.len());
        for model in ModelId::ALL {
            let max_tokens = *limits
                .get(&model)
                .ok_or(CatalogError::MissingLimits(model))?;
            if max_tokens == 0 {
                return Err(CatalogError::ZeroLimit(model));
            }
            let price = *pricing
                .get(&model)
                .ok_or(CatalogError::MissingPricing(model))?;
            if !price.prompt.is_valid() || !price.completion.is_valid() {
                return Err(CatalogError::InvalidPrice(model));
            }
            ordered_limits.push(ModelLimits { max_tokens });
            ordered_pricing.push(price);
        }

        Ok(ModelCatalog {
            default_model,
            limits: ordered_limits,
            pricing: ordered_pricing,
        })
    }
}

/// Validated catalog; lookups are indexed by [`ModelId`] position.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    default_model: ModelId,
    limits: Vec<ModelLimits>,
    pricing: Vec<ModelPricing>,
}

impl ModelCatalog {
    pub fn from_toml(contents: &str) -> Result<Self, CatalogError> {
        let tables: CatalogTables = toml::from_str(contents).map_err(CatalogError::Parse)?;
        tables.validate()
    }

    pub fn models(&self) -> &'static [ModelId] {
        &ModelId::ALL
    }

    pub fn default_model(&self) -> ModelId {
        self.default_model
    }

    pub fn limits(&self, model: ModelId) -> ModelLimits {
        self.limits[model.index()]
    }

    pub fn pricing(&self, model: ModelId) -> ModelPricing {
        self.pricing[model.index()]
    }
}
