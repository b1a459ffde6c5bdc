//! Cover letter style: maps the caller's style label to a writing instruction.
//!
//! The set is closed. Any label we do not recognize is treated as `Standard`.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverLetterStyle {
    #[default]
    Standard,
    Modern,
    Creative,
}

impl CoverLetterStyle {
    /// Case-insensitive; unknown labels fall back to `Standard`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "modern" => CoverLetterStyle::Modern,
            "creative" => CoverLetterStyle::Creative,
            _ => CoverLetterStyle::Standard,
        }
    }

    /// Tone instruction inserted into the cover letter prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            CoverLetterStyle::Standard => {
                "Write in a neutral, professional tone. Use a conventional business letter \
                 structure: greeting, opening paragraph, one or two body paragraphs, closing."
            }
            CoverLetterStyle::Modern => {
                "Write in a confident, contemporary tone. Lead sentences with strong action \
                 verbs, keep paragraphs short, and emphasize measurable results."
            }
            CoverLetterStyle::Creative => {
                "Write in an engaging, personable tone. Open with a memorable hook and feel \
                 free to depart from the conventional letter structure while staying professional."
            }
        }
    }
}

// Lenient: a bad label must not reject the whole request.
impl<'de> Deserialize<'de> for CoverLetterStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(CoverLetterStyle::from_label(&label))
    }
}
