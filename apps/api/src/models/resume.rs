use serde::{Deserialize, Serialize};

/// Contact block of a structured resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    /// `None` means the position is current.
    pub end_date: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGroup {
    pub category: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub link: Option<String>,
}

/// Structured resume input for the build use case.
///
/// `certifications` and `projects` distinguish "not supplied" (`None`, section
/// omitted from the prompt) from "supplied but empty" (`Some(vec![])`, empty
/// section rendered).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeData {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    pub summary: Option<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<SkillGroup>,
    pub certifications: Option<Vec<Certification>>,
    pub projects: Option<Vec<Project>>,
    pub target_role: Option<String>,
    pub target_description: Option<String>,
}

/// Every document the pipeline accepts as input, borrowed from the caller for
/// the duration of one invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputDocument<'a> {
    ResumeStructured(&'a ResumeData),
    ResumeFreeText(&'a str),
    JobDescriptionText(&'a str),
}

impl InputDocument<'_> {
    /// Human label used in document-level error messages.
    pub fn label(&self) -> &'static str {
        match self {
            InputDocument::ResumeStructured(_) => "resume data",
            InputDocument::ResumeFreeText(_) => "resume text",
            InputDocument::JobDescriptionText(_) => "job description",
        }
    }

    /// A document is empty when there is nothing a prompt could be built from.
    pub fn is_empty(&self) -> bool {
        match self {
            InputDocument::ResumeStructured(data) => data.personal_info.full_name.trim().is_empty(),
            InputDocument::ResumeFreeText(text) | InputDocument::JobDescriptionText(text) => {
                text.trim().is_empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_data_deserializes_camel_case_with_defaults() {
        let json = serde_json::json!({
            "personalInfo": {"fullName": "Ada Lovelace", "email": "ada@example.com"},
            "experience": [{
                "company": "Analytical Engines Ltd",
                "title": "Engineer",
                "startDate": "1842"
            }]
        });
        let data: ResumeData = serde_json::from_value(json).unwrap();
        assert_eq!(data.personal_info.full_name, "Ada Lovelace");
        assert!(data.personal_info.phone.is_none());
        assert!(data.experience[0].responsibilities.is_empty());
        assert!(data.experience[0].end_date.is_none());
        assert!(data.certifications.is_none());
        assert!(data.skills.is_empty());
    }

    #[test]
    fn test_empty_certifications_are_kept_distinct_from_absent() {
        let json = serde_json::json!({
            "personalInfo": {"fullName": "A", "email": "a@b.c"},
            "certifications": []
        });
        let data: ResumeData = serde_json::from_value(json).unwrap();
        assert_eq!(data.certifications, Some(vec![]));
        assert!(data.projects.is_none());
    }

    #[test]
    fn test_input_document_emptiness() {
        assert!(InputDocument::ResumeFreeText(" \n\t").is_empty());
        assert!(!InputDocument::JobDescriptionText("Rust").is_empty());
        assert!(InputDocument::ResumeStructured(&ResumeData::default()).is_empty());
    }
}
