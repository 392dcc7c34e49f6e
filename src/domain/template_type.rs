use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects the analysis prompt variant: `Raw` keeps speaker wording close to the
/// transcript, `Refined` asks for an edited summary per item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Raw,
    #[default]
    Refined,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Raw => "raw",
            TemplateType::Refined => "refined",
        }
    }
}

impl FromStr for TemplateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw" => Ok(TemplateType::Raw),
            "refined" => Ok(TemplateType::Refined),
            other => Err(format!(
                "Invalid template type: {}. Expected: raw or refined",
                other
            )),
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
