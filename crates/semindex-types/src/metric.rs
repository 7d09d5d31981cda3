//! Distance metric selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Distance used by the ANN backend.
///
/// Lower distance always means more similar:
/// - `Euclidean` reports squared L2 distance
/// - `Cosine` reports `1 - cos(a, b)`
/// - `InnerProduct` reports `1 - a·b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Cosine,
    InnerProduct,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::InnerProduct => "inner_product",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "cosine" | "cos" => Ok(DistanceMetric::Cosine),
            "inner_product" | "ip" | "dot" => Ok(DistanceMetric::InnerProduct),
            other => Err(format!("unknown distance metric: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_euclidean() {
        assert_eq!(DistanceMetric::default(), DistanceMetric::Euclidean);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("L2".parse::<DistanceMetric>().unwrap(), DistanceMetric::Euclidean);
        assert_eq!("cos".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!(
            "inner_product".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::InnerProduct
        );
        assert!("manhattan".parse::<DistanceMetric>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&DistanceMetric::InnerProduct).unwrap();
        assert_eq!(json, "\"inner_product\"");
        let decoded: DistanceMetric = serde_json::from_str("\"cosine\"").unwrap();
        assert_eq!(decoded, DistanceMetric::Cosine);
    }
}
