use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Face detector used by the inference collaborator before attribute
/// estimation. Ordered roughly from most to least accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    RetinaFace,
    Mtcnn,
    Ssd,
    OpenCv,
}

impl DetectorBackend {
    pub const ALL: &[DetectorBackend] = &[
        DetectorBackend::RetinaFace,
        DetectorBackend::Mtcnn,
        DetectorBackend::Ssd,
        DetectorBackend::OpenCv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorBackend::RetinaFace => "retinaface",
            DetectorBackend::Mtcnn => "mtcnn",
            DetectorBackend::Ssd => "ssd",
            DetectorBackend::OpenCv => "opencv",
        }
    }
}

impl fmt::Display for DetectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        DetectorBackend::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == lowered)
            .ok_or_else(|| format!("unknown detector backend: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("retinaface", DetectorBackend::RetinaFace)]
    #[case("RetinaFace", DetectorBackend::RetinaFace)]
    #[case(" opencv ", DetectorBackend::OpenCv)]
    #[case("mtcnn", DetectorBackend::Mtcnn)]
    #[case("ssd", DetectorBackend::Ssd)]
    fn test_parse_known_backends(#[case] input: &str, #[case] expected: DetectorBackend) {
        assert_eq!(input.parse::<DetectorBackend>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_backend_errors() {
        let err = "yolo".parse::<DetectorBackend>().unwrap_err();
        assert!(err.contains("yolo"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for backend in DetectorBackend::ALL {
            assert_eq!(backend.to_string().parse::<DetectorBackend>().unwrap(), *backend);
        }
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&DetectorBackend::OpenCv).unwrap();
        assert_eq!(json, "\"opencv\"");
    }
}
