use serde_json::json;

use crate::geofile::feature::Feature;

/// Boolean test deciding whether a feature is displayed.
///
/// Mirrors the subset of the Mapbox filter expression language the map needs, so a predicate can
/// be evaluated locally and handed to a display as an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The feature has the attribute, whatever its value.
    Has(String),
    /// The attribute is present and equals the value exactly.
    Eq(String, String),
    Any(Vec<Predicate>),
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn has(key: &str) -> Self {
        Predicate::Has(key.to_string())
    }

    pub fn equals(key: &str, value: &str) -> Self {
        Predicate::Eq(key.to_string(), value.to_string())
    }

    pub fn evaluate(&self, feature: &Feature) -> bool {
        match self {
            Predicate::Has(key) => feature.has_attribute(key),
            Predicate::Eq(key, value) => feature.attribute(key) == Some(value.as_str()),
            Predicate::Any(predicates) => predicates.iter().any(|p| p.evaluate(feature)),
            Predicate::All(predicates) => predicates.iter().all(|p| p.evaluate(feature)),
        }
    }

    /// Render as a Mapbox style filter expression.
    pub fn to_expression(&self) -> serde_json::Value {
        match self {
            Predicate::Has(key) => json!(["has", key]),
            Predicate::Eq(key, value) => json!(["==", ["get", key], value]),
            Predicate::Any(predicates) => Self::compound("any", predicates),
            Predicate::All(predicates) => Self::compound("all", predicates),
        }
    }

    fn compound(operator: &str, predicates: &[Predicate]) -> serde_json::Value {
        let mut expression = vec![json!(operator)];
        expression.extend(predicates.iter().map(Predicate::to_expression));
        serde_json::Value::Array(expression)
    }
}
