use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::region::FaceRegion;

/// Most likely gender reported by the model.
///
/// Unrecognized labels are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Man,
    Woman,
    Other(String),
}

impl Gender {
    pub fn as_str(&self) -> &str {
        match self {
            Gender::Man => "Man",
            Gender::Woman => "Woman",
            Gender::Other(label) => label,
        }
    }
}

impl From<String> for Gender {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Man" => Gender::Man,
            "Woman" => Gender::Woman,
            _ => Gender::Other(label),
        }
    }
}

impl From<&str> for Gender {
    fn from(label: &str) -> Self {
        Gender::from(label.to_string())
    }
}

impl From<Gender> for String {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most likely facial expression reported by the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
    Other(String),
}

impl Emotion {
    pub fn as_str(&self) -> &str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
            Emotion::Other(label) => label,
        }
    }
}

impl From<String> for Emotion {
    fn from(label: String) -> Self {
        // Models disagree on casing; known labels are matched case-insensitively.
        match label.to_lowercase().as_str() {
            "angry" => Emotion::Angry,
            "disgust" => Emotion::Disgust,
            "fear" => Emotion::Fear,
            "happy" => Emotion::Happy,
            "sad" => Emotion::Sad,
            "surprise" => Emotion::Surprise,
            "neutral" => Emotion::Neutral,
            _ => Emotion::Other(label),
        }
    }
}

impl From<&str> for Emotion {
    fn from(label: &str) -> Self {
        Emotion::from(label.to_string())
    }
}

impl From<Emotion> for String {
    fn from(emotion: Emotion) -> Self {
        match emotion {
            Emotion::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute estimates for one detected face.
///
/// Results carry no identity: each completed analysis replaces the previous
/// set wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub age: f64,
    pub dominant_gender: Gender,
    pub dominant_emotion: Emotion,
    #[serde(default)]
    pub region: FaceRegion,
}

impl AnalysisResult {
    pub fn new(
        age: f64,
        dominant_gender: impl Into<Gender>,
        dominant_emotion: impl Into<Emotion>,
        region: FaceRegion,
    ) -> Self {
        Self {
            age,
            dominant_gender: dominant_gender.into(),
            dominant_emotion: dominant_emotion.into(),
            region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Man", Gender::Man)]
    #[case("Woman", Gender::Woman)]
    #[case("Nonbinary", Gender::Other("Nonbinary".into()))]
    fn test_gender_from_label(#[case] label: &str, #[case] expected: Gender) {
        assert_eq!(Gender::from(label), expected);
    }

    #[rstest]
    #[case("happy", Emotion::Happy)]
    #[case("HAPPY", Emotion::Happy)]
    #[case("surprise", Emotion::Surprise)]
    #[case("contempt", Emotion::Other("contempt".into()))]
    fn test_emotion_from_label(#[case] label: &str, #[case] expected: Emotion) {
        assert_eq!(Emotion::from(label), expected);
    }

    #[test]
    fn test_other_labels_keep_original_text() {
        assert_eq!(String::from(Emotion::from("Contempt")), "Contempt");
        assert_eq!(Gender::from("unknown").to_string(), "unknown");
    }

    #[test]
    fn test_result_deserializes_from_model_output() {
        let json = r#"{
            "age": 30,
            "dominant_gender": "Man",
            "dominant_emotion": "happy",
            "region": {"x": 10, "y": 10, "w": 50, "h": 50}
        }"#;

        let result: AnalysisResult = serde_json::from_str(json).unwrap();

        assert_relative_eq!(result.age, 30.0);
        assert_eq!(result.dominant_gender, Gender::Man);
        assert_eq!(result.dominant_emotion, Emotion::Happy);
        assert_eq!(result.region, FaceRegion::new(10, 10, 50, 50));
    }

    #[test]
    fn test_missing_region_defaults_to_zero_box() {
        let json = r#"{"age": 41.5, "dominant_gender": "Woman", "dominant_emotion": "sad"}"#;

        let result: AnalysisResult = serde_json::from_str(json).unwrap();

        assert!(result.region.is_unavailable());
    }

    #[test]
    fn test_result_serializes_labels_as_strings() {
        let result = AnalysisResult::new(25.0, "Woman", "neutral", FaceRegion::default());

        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["dominant_gender"], "Woman");
        assert_eq!(value["dominant_emotion"], "neutral");
    }
}
