//! Prompt construction for every pipeline use case.
//!
//! All builders are pure: the same input always yields the same prompt, with no
//! timestamps or randomness. User content only ever enters a prompt through
//! `llm_client::prompts::section`, never through template substitution, so text
//! like `{job_description}` inside a resume stays literal.

use serde::Deserialize;

use crate::llm_client::prompts::{section, JSON_ONLY_INSTRUCTION, PLAIN_TEXT_INSTRUCTION};
use crate::models::resume::{
    Certification, Education, Experience, PersonalInfo, Project, ResumeData, SkillGroup,
};
use crate::pipeline::style::CoverLetterStyle;

// ────────────────────────────────────────────────────────────────────────────
// Templates
// ────────────────────────────────────────────────────────────────────────────

pub const ANALYSIS_HEADER: &str = "You are an expert resume reviewer and applicant tracking \
    system (ATS) specialist. Evaluate the resume below for overall quality, formatting, \
    content strength, keyword coverage, measurable impact, and ATS compatibility. \
    Be specific and actionable in every suggestion.";

pub const ANALYSIS_JSON_SHAPE: &str = r#"Return a JSON object with this EXACT shape:
{
  "overallScore": 0-100 (number),
  "categoryScores": {
    "formatting": 0-100 (number),
    "content": 0-100 (number),
    "keywords": 0-100 (number),
    "impact": 0-100 (number),
    "atsCompatibility": 0-100 (number)
  },
  "strengths": ["string"],
  "weaknesses": ["string"],
  "missingKeywords": ["string"],
  "suggestions": ["string"],
  "summary": "string"
}"#;

pub const MATCH_HEADER: &str = "You are an expert technical recruiter. Compare the resume \
    against the job description below. Identify which keywords and requirements from the job \
    description the resume already demonstrates, which are missing, and how the candidate \
    could close the gap.";

pub const MATCH_JSON_SHAPE: &str = r#"Return a JSON object with this EXACT shape:
{
  "matchScore": 0-100 (number),
  "matchingKeywords": ["string"],
  "missingKeywords": ["string"],
  "suggestions": ["string"],
  "summary": "string"
}"#;

pub const RESUME_HEADER: &str = "You are a professional resume writer. Using ONLY the \
    information provided below, write a complete, polished, ATS-friendly resume in plain text. \
    Do NOT invent employers, dates, degrees, or metrics that are not present in the input.";

pub const RESUME_LAYOUT_INSTRUCTION: &str = "Structure the resume with these headings in order: \
    contact header, PROFESSIONAL SUMMARY, EXPERIENCE, EDUCATION, SKILLS, then CERTIFICATIONS \
    and PROJECTS only if those sections were provided. Rewrite responsibilities as concise \
    achievement-oriented bullet points. If a target role is given, tailor the wording toward it.";

pub const COVER_LETTER_HEADER: &str = "You are an expert career coach writing a tailored cover \
    letter. Ground every claim in the resume below and connect it to the job description.";

pub const COVER_LETTER_LENGTH_INSTRUCTION: &str = "Keep the letter between 250 and 400 words \
    and sign it with the applicant's name when one is provided.";

// ────────────────────────────────────────────────────────────────────────────
// Cover letter input
// ────────────────────────────────────────────────────────────────────────────

/// Parameters for the cover letter use case.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterInput {
    pub resume_text: String,
    pub job_description: String,
    pub company_name: String,
    pub job_title: Option<String>,
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub style: CoverLetterStyle,
}

// ────────────────────────────────────────────────────────────────────────────
// Builders
// ────────────────────────────────────────────────────────────────────────────

/// Prompt for the resume quality analysis use case.
pub fn build_analysis_prompt(resume_text: &str, target_role: Option<&str>) -> String {
    let mut parts = vec![ANALYSIS_HEADER.to_string()];
    if let Some(role) = non_blank(target_role) {
        parts.push(section("TARGET ROLE", role));
    }
    parts.push(section("RESUME", resume_text));
    parts.push(ANALYSIS_JSON_SHAPE.to_string());
    parts.push(JSON_ONLY_INSTRUCTION.to_string());
    parts.join("\n\n")
}

/// Prompt for the resume ↔ job description match use case.
pub fn build_match_prompt(resume_text: &str, job_description: &str) -> String {
    [
        MATCH_HEADER.to_string(),
        section("RESUME", resume_text),
        section("JOB DESCRIPTION", job_description),
        MATCH_JSON_SHAPE.to_string(),
        JSON_ONLY_INSTRUCTION.to_string(),
    ]
    .join("\n\n")
}

/// Prompt for generating a full resume from structured data.
pub fn build_resume_prompt(data: &ResumeData) -> String {
    let mut parts = vec![
        RESUME_HEADER.to_string(),
        section("PERSONAL INFORMATION", &render_personal_info(&data.personal_info)),
    ];

    if let Some(summary) = non_blank(data.summary.as_deref()) {
        parts.push(section("SUMMARY", summary));
    }
    parts.push(section("EXPERIENCE", &render_experience(&data.experience)));
    parts.push(section("EDUCATION", &render_education(&data.education)));
    parts.push(section("SKILLS", &render_skills(&data.skills)));
    if let Some(certifications) = &data.certifications {
        parts.push(section("CERTIFICATIONS", &render_certifications(certifications)));
    }
    if let Some(projects) = &data.projects {
        parts.push(section("PROJECTS", &render_projects(projects)));
    }
    if let Some(role) = non_blank(data.target_role.as_deref()) {
        parts.push(section("TARGET ROLE", role));
    }
    if let Some(description) = non_blank(data.target_description.as_deref()) {
        parts.push(section("TARGET JOB DESCRIPTION", description));
    }

    parts.push(RESUME_LAYOUT_INSTRUCTION.to_string());
    parts.push(PLAIN_TEXT_INSTRUCTION.to_string());
    parts.join("\n\n")
}

/// Prompt for the cover letter use case.
pub fn build_cover_letter_prompt(input: &CoverLetterInput) -> String {
    let mut parts = vec![
        COVER_LETTER_HEADER.to_string(),
        input.style.instruction().to_string(),
    ];

    let mut position = Vec::new();
    if let Some(company) = non_blank(Some(&input.company_name)) {
        position.push(format!("Company: {company}"));
    }
    if let Some(title) = non_blank(input.job_title.as_deref()) {
        position.push(format!("Position: {title}"));
    }
    if let Some(name) = non_blank(input.applicant_name.as_deref()) {
        position.push(format!("Applicant: {name}"));
    }
    parts.push(section("APPLICATION DETAILS", &position.join("\n")));
    parts.push(section("RESUME", &input.resume_text));
    parts.push(section("JOB DESCRIPTION", &input.job_description));
    parts.push(COVER_LETTER_LENGTH_INSTRUCTION.to_string());
    parts.push(PLAIN_TEXT_INSTRUCTION.to_string());
    parts.join("\n\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Section renderers
// ────────────────────────────────────────────────────────────────────────────

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn render_personal_info(info: &PersonalInfo) -> String {
    let mut lines = vec![format!("Name: {}", info.full_name.trim())];
    if let Some(email) = non_blank(Some(&info.email)) {
        lines.push(format!("Email: {email}"));
    }
    let optional = [
        ("Phone", info.phone.as_deref()),
        ("Location", info.location.as_deref()),
        ("LinkedIn", info.linkedin.as_deref()),
        ("Website", info.website.as_deref()),
    ];
    for (label, value) in optional {
        if let Some(value) = non_blank(value) {
            lines.push(format!("{label}: {value}"));
        }
    }
    lines.join("\n")
}

fn date_range(start: Option<&str>, end: Option<&str>) -> Option<String> {
    match (non_blank(start), non_blank(end)) {
        (Some(start), Some(end)) => Some(format!("{start} - {end}")),
        (Some(start), None) => Some(format!("{start} - Present")),
        (None, Some(end)) => Some(format!("until {end}")),
        (None, None) => None,
    }
}

fn render_experience(entries: &[Experience]) -> String {
    entries
        .iter()
        .map(|exp| {
            let mut heading = format!("{} at {}", exp.title.trim(), exp.company.trim());
            if let Some(location) = non_blank(exp.location.as_deref()) {
                heading.push_str(&format!(", {location}"));
            }
            if let Some(range) = date_range(exp.start_date.as_deref(), exp.end_date.as_deref()) {
                heading.push_str(&format!(" ({range})"));
            }
            let bullets = exp
                .responsibilities
                .iter()
                .filter_map(|r| non_blank(Some(r)))
                .map(|r| format!("  - {r}"));
            std::iter::once(heading)
                .chain(bullets)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_education(entries: &[Education]) -> String {
    entries
        .iter()
        .map(|edu| {
            let mut line = format!("- {}", edu.degree.trim());
            if let Some(field) = non_blank(edu.field.as_deref()) {
                line.push_str(&format!(" in {field}"));
            }
            line.push_str(&format!(", {}", edu.institution.trim()));
            if let Some(range) = date_range(edu.start_date.as_deref(), edu.end_date.as_deref()) {
                line.push_str(&format!(" ({range})"));
            }
            if let Some(gpa) = non_blank(edu.gpa.as_deref()) {
                line.push_str(&format!(", GPA: {gpa}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_skills(groups: &[SkillGroup]) -> String {
    groups
        .iter()
        .map(|group| {
            let items = group
                .items
                .iter()
                .filter_map(|i| non_blank(Some(i)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: {}", group.category.trim(), items)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_certifications(certifications: &[Certification]) -> String {
    certifications
        .iter()
        .map(|cert| {
            let mut line = format!("- {}", cert.name.trim());
            if let Some(issuer) = non_blank(cert.issuer.as_deref()) {
                line.push_str(&format!(", {issuer}"));
            }
            if let Some(date) = non_blank(cert.date.as_deref()) {
                line.push_str(&format!(" ({date})"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_projects(projects: &[Project]) -> String {
    projects
        .iter()
        .map(|project| {
            let mut lines = vec![format!("- {}", project.name.trim())];
            if let Some(description) = non_blank(Some(&project.description)) {
                lines.push(format!("  {description}"));
            }
            if !project.technologies.is_empty() {
                lines.push(format!("  Technologies: {}", project.technologies.join(", ")));
            }
            if let Some(link) = non_blank(project.link.as_deref()) {
                lines.push(format!("  Link: {link}"));
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
