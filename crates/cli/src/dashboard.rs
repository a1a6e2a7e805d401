use serde::Serialize;

use face_insight_core::analysis::domain::analysis_result::{AnalysisResult, Emotion, Gender};
use face_insight_core::shared::region::FaceRegion;

/// Display-ready summary of one face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceCard {
    pub number: usize,
    pub age: u32,
    pub gender: String,
    pub gender_icon: &'static str,
    pub emotion: String,
    pub emotion_icon: &'static str,
    /// Happy faces are rendered highlighted.
    pub highlighted: bool,
    pub region: FaceRegion,
}

impl FaceCard {
    pub fn from_result(number: usize, result: &AnalysisResult) -> Self {
        let (gender, gender_icon) = gender_label(&result.dominant_gender);
        let (emotion, emotion_icon) = emotion_label(&result.dominant_emotion);
        Self {
            number,
            age: result.age.max(0.0).round() as u32,
            gender,
            gender_icon,
            emotion,
            emotion_icon,
            highlighted: result.dominant_emotion == Emotion::Happy,
            region: result.region,
        }
    }

    pub fn render(&self) -> String {
        let marker = if self.highlighted { " *" } else { "" };
        let mut line = format!(
            "  #{} {} {}, {} years  {} {}{marker}",
            self.number, self.gender_icon, self.gender, self.age, self.emotion_icon, self.emotion
        );
        if !self.region.is_unavailable() {
            let r = &self.region;
            line.push_str(&format!("  at ({},{}) {}x{}", r.x, r.y, r.w, r.h));
        }
        line
    }
}

/// What the dashboard shows after polling the store for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardState {
    pub frame: usize,
    pub faces: Vec<FaceCard>,
}

impl DashboardState {
    pub fn new(frame: usize, results: &[AnalysisResult]) -> Self {
        let faces = results
            .iter()
            .enumerate()
            .map(|(i, r)| FaceCard::from_result(i + 1, r))
            .collect();
        Self { frame, faces }
    }

    pub fn render(&self) -> String {
        if self.faces.is_empty() {
            return format!("[frame {}] No face detected", self.frame);
        }
        let mut lines = vec![format!(
            "[frame {}] {} face(s)",
            self.frame,
            self.faces.len()
        )];
        lines.extend(self.faces.iter().map(FaceCard::render));
        lines.join("\n")
    }
}

fn gender_label(gender: &Gender) -> (String, &'static str) {
    match gender {
        Gender::Man => ("Male".into(), "👨"),
        Gender::Woman => ("Female".into(), "👩"),
        Gender::Other(label) => (label.clone(), "👤"),
    }
}

fn emotion_label(emotion: &Emotion) -> (String, &'static str) {
    let (label, icon) = match emotion {
        Emotion::Angry => ("Angry", "😠"),
        Emotion::Disgust => ("Disgust", "🤢"),
        Emotion::Fear => ("Fear", "😨"),
        Emotion::Happy => ("Happy", "😄"),
        Emotion::Sad => ("Sad", "😢"),
        Emotion::Surprise => ("Surprise", "😲"),
        Emotion::Neutral => ("Neutral", "😐"),
        Emotion::Other(label) => return (label.clone(), "🤔"),
    };
    (label.into(), icon)
}
