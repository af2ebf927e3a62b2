// Prompt templates for resume analysis.
// The scoring rubrics live here as prompt text; nothing in code re-implements them.

use crate::analysis::models::{JobContext, NOT_SPECIFIED};

/// Stands in for the resume body when the resume travels as an attached file.
pub const ATTACHED_RESUME_PLACEHOLDER: &str = "(see attached file)";

/// General analysis prompt. Resume text is appended directly after it
/// (inline mode) or the resume file is attached alongside it.
pub const RESUME_ANALYSIS_PROMPT: &str = r#"You are an expert HR recruiter assistant. Analyze the following resume and extract structured information.

Return a JSON object with EXACTLY this structure (no markdown, just raw JSON):
{
  "name": "Full name of the candidate",
  "email": "Email address",
  "phone": "Phone number or null if not found",
  "priorityScore": <number 0-100 based on overall quality>,
  "summary": "2-3 sentence professional summary",
  "keySkills": ["skill1", "skill2", ...up to 10 most relevant skills],
  "experience": "Brief summary of work experience (years, notable companies, roles)",
  "education": "Highest education level and institution",
  "highlights": ["standout achievement 1", "standout achievement 2", ...up to 5],
  "concerns": ["potential concern 1", ...up to 3, or empty array if none]
}

Scoring guidelines for priorityScore:
- 90-100: Exceptional candidate with strong relevant experience and achievements
- 70-89: Strong candidate with good experience
- 50-69: Average candidate, meets basic requirements
- 30-49: Below average, missing key qualifications
- 0-29: Poor fit, major gaps or concerns

Resume content:
"#;

/// Job-match prompt template.
/// Replace: {job_title}, {job_requirements}, {job_description}, {resume_content}
pub const JOB_MATCH_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter. Evaluate how well the candidate's resume matches the job posting below.

JOB TITLE:
{job_title}

JOB REQUIREMENTS:
{job_requirements}

JOB DESCRIPTION:
{job_description}

RESUME:
{resume_content}

Return a JSON object with EXACTLY this structure (no markdown, just raw JSON):
{
  "jobRelevancyScore": <number 0-100 describing fit for THIS job>,
  "jobMatchSummary": "2-3 sentence assessment of the candidate's fit for this role",
  "skillMatches": ["required skill the candidate has", ...up to 10],
  "skillGaps": ["required skill the candidate lacks", ...up to 10, or empty array if none],
  "strengths": ["strength relevant to this role", ...up to 5],
  "recommendations": ["interview focus or hiring recommendation", ...up to 3]
}

Scoring guidelines for jobRelevancyScore:
- 90-100: Excellent match, meets or exceeds nearly every requirement
- 70-89: Good match, meets most requirements with minor gaps
- 50-69: Moderate match, meets some requirements but has notable gaps
- 30-49: Weak match, missing several key requirements
- 0-29: Poor match, background does not align with the role"#;

/// Renders the job-match prompt. Blank or missing requirements and
/// description are rendered as "Not specified".
pub fn render_job_match_prompt(job: &JobContext<'_>, resume_content: &str) -> String {
    fill_template(
        JOB_MATCH_PROMPT_TEMPLATE,
        &[
            ("{job_title}", job.title),
            ("{job_requirements}", or_not_specified(job.requirements)),
            ("{job_description}", or_not_specified(job.description)),
            ("{resume_content}", resume_content),
        ],
    )
}

fn or_not_specified(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_SPECIFIED,
    }
}

/// Single-pass placeholder substitution. Values are never rescanned, so a
/// resume that happens to contain "{job_title}" is left untouched.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];
        match vars.iter().find(|(key, _)| candidate.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &candidate[key.len()..];
            }
            None => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_job() -> JobContext<'static> {
        JobContext {
            title: "Backend Engineer",
            requirements: Some("Python, AWS, 3+ years"),
            description: None,
        }
    }

    #[test]
    fn test_job_prompt_interpolates_all_fields() {
        let prompt = render_job_match_prompt(&backend_job(), "5 years Python, AWS");
        assert!(prompt.contains("JOB TITLE:\nBackend Engineer"));
        assert!(prompt.contains("JOB REQUIREMENTS:\nPython, AWS, 3+ years"));
        assert!(prompt.contains("RESUME:\n5 years Python, AWS"));
        assert!(!prompt.contains("{job_title}"));
        assert!(!prompt.contains("{resume_content}"));
    }

    #[test]
    fn test_missing_description_renders_not_specified() {
        let prompt = render_job_match_prompt(&backend_job(), "text");
        assert!(prompt.contains("JOB DESCRIPTION:\nNot specified"));
    }

    #[test]
    fn test_blank_requirements_render_not_specified() {
        let job = JobContext {
            title: "Designer",
            requirements: Some("   "),
            description: Some("Design things"),
        };
        let prompt = render_job_match_prompt(&job, "text");
        assert!(prompt.contains("JOB REQUIREMENTS:\nNot specified"));
        assert!(prompt.contains("JOB DESCRIPTION:\nDesign things"));
    }

    #[test]
    fn test_schema_braces_survive_rendering() {
        let prompt = render_job_match_prompt(&backend_job(), "text");
        assert!(prompt.contains("\"jobRelevancyScore\""));
        assert!(prompt.contains("{\n  \"jobRelevancyScore\""));
    }

    #[test]
    fn test_placeholder_inside_value_is_not_rescanned() {
        let prompt = render_job_match_prompt(&backend_job(), "I love {job_title} tokens");
        assert!(prompt.contains("I love {job_title} tokens"));
    }

    #[test]
    fn test_general_prompt_carries_rubric_and_ends_before_resume() {
        assert!(RESUME_ANALYSIS_PROMPT.contains("90-100: Exceptional"));
        assert!(RESUME_ANALYSIS_PROMPT.contains("0-29: Poor fit"));
        assert!(RESUME_ANALYSIS_PROMPT.ends_with("Resume content:\n"));
    }
}
