use serde::{Deserialize, Serialize};

/// A measured quantity, e.g. `TMK` (daily mean temperature, °C)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub code: String,
    pub description: String,
    pub unit: String,
}

impl Parameter {
    pub fn new(code: &str, description: &str, unit: &str) -> Self {
        Self {
            code: code.trim().to_string(),
            description: description.trim().to_string(),
            unit: unit.trim().to_string(),
        }
    }
}
