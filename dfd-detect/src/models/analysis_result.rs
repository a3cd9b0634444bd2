//! Analysis result returned by an engine
//!
//! Serialized in camelCase; this is both the API shape and the wire
//! contract with remote engines.

use crate::models::DetectionError;
use dfd_common::events::SourceType;
use serde::{Deserialize, Serialize};

/// Lower bound for confidence and feature scores
pub const MIN_SCORE: f64 = 0.0;

/// Upper bound for confidence and feature scores
pub const MAX_SCORE: f64 = 100.0;

/// Named evidence signal with its own score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFeature {
    pub name: String,
    /// Score in [0, 100]
    pub value: f64,
}

impl AnalysisFeature {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Verdict, confidence and ordered evidence for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub is_deepfake: bool,
    /// Engine certainty in [0, 100]
    pub confidence: f64,
    /// Non-empty, display order is significant
    pub features: Vec<AnalysisFeature>,
    pub source_type: SourceType,
}

impl AnalysisResult {
    /// Check the result contract
    ///
    /// Confidence and every feature value must be finite and within
    /// [0, 100], and at least one feature must be present.
    pub fn validate(&self) -> Result<(), DetectionError> {
        check_score("confidence", self.confidence)?;

        if self.features.is_empty() {
            return Err(DetectionError::AnalysisEngine(
                "Result contains no features".to_string(),
            ));
        }

        for feature in &self.features {
            if feature.name.trim().is_empty() {
                return Err(DetectionError::AnalysisEngine(
                    "Result contains a feature with an empty name".to_string(),
                ));
            }
            check_score(&feature.name, feature.value)?;
        }

        Ok(())
    }
}

fn check_score(field: &str, value: f64) -> Result<(), DetectionError> {
    if !value.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        return Err(DetectionError::AnalysisEngine(format!(
            "{} score {} outside [{}, {}]",
            field, value, MIN_SCORE, MAX_SCORE
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            is_deepfake: false,
            confidence: 91.0,
            features: vec![
                AnalysisFeature::new("Visual Artifacts", 88.0),
                AnalysisFeature::new("Frame Consistency", 100.0),
            ],
            source_type: SourceType::Video,
        }
    }

    #[test]
    fn test_valid_result() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut result = sample();
        result.confidence = 0.0;
        result.features[0].value = 100.0;
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_confidence_out_of_range() {
        let mut result = sample();
        result.confidence = 100.5;
        assert!(matches!(
            result.validate(),
            Err(DetectionError::AnalysisEngine(_))
        ));

        result.confidence = f64::NAN;
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_feature_out_of_range() {
        let mut result = sample();
        result.features[1].value = -1.0;
        let err = result.validate().unwrap_err();
        assert!(err.message().contains("Frame Consistency"));
    }

    #[test]
    fn test_empty_features_rejected() {
        let mut result = sample();
        result.features.clear();
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["isDeepfake"], false);
        assert_eq!(json["sourceType"], "video");
        assert_eq!(json["features"][0]["name"], "Visual Artifacts");

        let parsed: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, sample());
    }
}
