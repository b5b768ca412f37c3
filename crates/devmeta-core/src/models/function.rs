//! Function models

use serde::{Deserialize, Serialize};

/// Id prefix shared by all measuring functions
pub const MEASURING_FUNCTION_PREFIX: &str = "urn:infai:ses:measuring-function:";

/// Id prefix shared by all controlling functions
pub const CONTROLLING_FUNCTION_PREFIX: &str = "urn:infai:ses:controlling-function:";

/// Whether a function produces or accepts a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    /// Produces a value (e.g. getTemperature)
    Measuring,
    /// Accepts a value (e.g. setTargetTemperature)
    Controlling,
}

impl FunctionKind {
    /// Classify a function by its id prefix
    pub fn from_id(function_id: &str) -> Option<Self> {
        if function_id.starts_with(MEASURING_FUNCTION_PREFIX) {
            Some(FunctionKind::Measuring)
        } else if function_id.starts_with(CONTROLLING_FUNCTION_PREFIX) {
            Some(FunctionKind::Controlling)
        } else {
            None
        }
    }
}

impl std::fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionKind::Measuring => f.write_str("measuring"),
            FunctionKind::Controlling => f.write_str("controlling"),
        }
    }
}

/// A capability verb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Concept describing the function's value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    /// Measuring or controlling; derived from the id when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdf_type: Option<FunctionKind>,
}

impl Function {
    /// Fill in `rdf_type` from the id prefix if the author left it out.
    ///
    /// Storage backends call this once when a function enters the system so
    /// matching never has to look at id prefixes.
    pub fn classified(mut self) -> Self {
        if self.rdf_type.is_none() {
            self.rdf_type = FunctionKind::from_id(&self.id);
        }
        self
    }

    /// Measuring or controlling, if known
    pub fn kind(&self) -> Option<FunctionKind> {
        self.rdf_type.or_else(|| FunctionKind::from_id(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_prefix() {
        assert_eq!(
            FunctionKind::from_id("urn:infai:ses:measuring-function:temp"),
            Some(FunctionKind::Measuring)
        );
        assert_eq!(
            FunctionKind::from_id("urn:infai:ses:controlling-function:on"),
            Some(FunctionKind::Controlling)
        );
        assert_eq!(FunctionKind::from_id("urn:infai:ses:function:x"), None);
    }

    #[test]
    fn explicit_rdf_type_wins() {
        let function = Function {
            id: "custom-function".to_string(),
            name: "Custom".to_string(),
            description: None,
            concept_id: None,
            rdf_type: Some(FunctionKind::Controlling),
        }
        .classified();
        assert_eq!(function.kind(), Some(FunctionKind::Controlling));
    }
}
