//! Response normalizer: raw model text → fully populated analysis records.
//!
//! Two phases. Parsing is strict: text that is not a JSON object after fence
//! stripping is an error. Projection is lenient: missing, mistyped or
//! out-of-range fields are repaired with defaults and never fail.

use serde::de::Error as _;
use serde_json::{Map, Value};

use crate::analysis::models::{
    JobMatchAnalysis, ResumeAnalysis, DEFAULT_SCORE, MAX_CONCERNS, MAX_HIGHLIGHTS,
    MAX_KEY_SKILLS, MAX_RECOMMENDATIONS, MAX_SKILL_GAPS, MAX_SKILL_MATCHES, MAX_STRENGTHS,
    NOT_SPECIFIED, NO_SUMMARY, UNKNOWN_EMAIL, UNKNOWN_NAME,
};

/// Strips ```json ... ``` or ``` ... ``` fences wrapped around model output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Normalizes a general-analysis reply.
pub fn normalize_resume_analysis(text: &str) -> Result<ResumeAnalysis, serde_json::Error> {
    let reply = parse_reply(text)?;

    Ok(ResumeAnalysis {
        name: string_or(&reply, "name", UNKNOWN_NAME),
        email: string_or(&reply, "email", UNKNOWN_EMAIL),
        phone: optional_string(&reply, "phone"),
        priority_score: score(&reply, "priorityScore"),
        summary: string_or(&reply, "summary", NO_SUMMARY),
        key_skills: string_list(&reply, "keySkills", MAX_KEY_SKILLS),
        experience: prose_or(&reply, "experience", NOT_SPECIFIED),
        education: prose_or(&reply, "education", NOT_SPECIFIED),
        highlights: string_list(&reply, "highlights", MAX_HIGHLIGHTS),
        concerns: string_list(&reply, "concerns", MAX_CONCERNS),
    })
}

/// Normalizes a job-match reply.
pub fn normalize_job_match(text: &str) -> Result<JobMatchAnalysis, serde_json::Error> {
    let reply = parse_reply(text)?;

    Ok(JobMatchAnalysis {
        job_relevancy_score: score(&reply, "jobRelevancyScore"),
        job_match_summary: string_or(&reply, "jobMatchSummary", NO_SUMMARY),
        skill_matches: string_list(&reply, "skillMatches", MAX_SKILL_MATCHES),
        skill_gaps: string_list(&reply, "skillGaps", MAX_SKILL_GAPS),
        strengths: string_list(&reply, "strengths", MAX_STRENGTHS),
        recommendations: string_list(&reply, "recommendations", MAX_RECOMMENDATIONS),
    })
}

fn parse_reply(text: &str) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::from_str::<Value>(strip_code_fences(text))? {
        Value::Object(map) => Ok(map),
        other => Err(serde_json::Error::custom(format!(
            "expected a JSON object, found {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field projection
// ────────────────────────────────────────────────────────────────────────────

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or(reply: &Map<String, Value>, key: &str, fallback: &str) -> String {
    reply
        .get(key)
        .and_then(text_of)
        .unwrap_or_else(|| fallback.to_string())
}

/// Like `string_or`, but a list or object of text entries is joined with "; "
/// rather than discarded.
fn prose_or(reply: &Map<String, Value>, key: &str, fallback: &str) -> String {
    let joined = match reply.get(key) {
        Some(Value::Array(items)) => join_text(items.iter().filter_map(text_of)),
        Some(Value::Object(fields)) => join_text(
            fields
                .iter()
                .filter_map(|(k, v)| text_of(v).map(|v| format!("{k}: {v}"))),
        ),
        Some(other) => text_of(other),
        None => None,
    };
    joined.unwrap_or_else(|| fallback.to_string())
}

fn join_text(parts: impl Iterator<Item = String>) -> Option<String> {
    let joined = parts.collect::<Vec<_>>().join("; ");
    (!joined.is_empty()).then_some(joined)
}

fn optional_string(reply: &Map<String, Value>, key: &str) -> Option<String> {
    reply.get(key).and_then(text_of)
}

/// Clamps into [0, 100]. Non-numeric or missing values become `DEFAULT_SCORE`.
fn score(reply: &Map<String, Value>, key: &str) -> i32 {
    let raw = match reply.get(key) {
        Some(Value::Number(n)) => n.as_i64().map(|i| i as f64).or_else(|| n.as_f64()),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    };
    raw.map(|f| f.round().clamp(0.0, 100.0) as i32)
        .unwrap_or(DEFAULT_SCORE)
}

/// The first `max` entries of an array, minus any that are blank or not
/// text. Null, absent or non-array values produce an empty list.
fn string_list(reply: &Map<String, Value>, key: &str, max: usize) -> Vec<String> {
    reply
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().take(max).filter_map(text_of).collect())
        .unwrap_or_default()
}
