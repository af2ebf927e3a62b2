//! Analysis orchestrator.
//!
//! Flow: (resume text | resume file) [+ job context] → prompt → model →
//!       normalizer → record.
//!
//! ".txt" files are decoded and inlined into the prompt. Every other file is
//! uploaded to the model service and attached to the prompt.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::analysis::error::{AnalysisError, AnalysisFailure, AnalysisOperation};
use crate::analysis::file_kind::ResumeFileKind;
use crate::analysis::models::{JobContext, JobMatchAnalysis, ResumeAnalysis};
use crate::analysis::normalize::{normalize_job_match, normalize_resume_analysis};
use crate::analysis::prompts::{
    render_job_match_prompt, ATTACHED_RESUME_PLACEHOLDER, RESUME_ANALYSIS_PROMPT,
};
use crate::llm_client::{GenerativeModel, UploadedFile};

/// A resume loaded from disk, ready for one of the two invocation modes.
enum ResumeSource {
    Text(String),
    Attachment {
        data: Vec<u8>,
        mime_type: &'static str,
        display_name: String,
    },
}

/// A loaded resume in the form the model receives it.
enum PreparedResume {
    Inline(String),
    Attached(UploadedFile),
}

/// Runs resume analyses against a generative model. Cheap to clone; holds no
/// per-request state.
#[derive(Clone)]
pub struct ResumeAnalyzer {
    model: Arc<dyn GenerativeModel>,
}

impl ResumeAnalyzer {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// General analysis of inline resume text.
    pub async fn analyze_resume(&self, resume_text: &str) -> Result<ResumeAnalysis, AnalysisError> {
        self.general_from_text(resume_text)
            .await
            .map_err(|f| AnalysisError::new(AnalysisOperation::Resume, f))
    }

    /// General analysis of a resume file on disk.
    pub async fn analyze_resume_file(&self, path: &Path) -> Result<ResumeAnalysis, AnalysisError> {
        self.general_from_file(path)
            .await
            .map_err(|f| AnalysisError::new(AnalysisOperation::ResumeFile, f))
    }

    /// Job-specific match analysis of inline resume text.
    pub async fn analyze_resume_for_job(
        &self,
        resume_text: &str,
        job: &JobContext<'_>,
    ) -> Result<JobMatchAnalysis, AnalysisError> {
        self.job_match_from_text(resume_text, job)
            .await
            .map_err(|f| AnalysisError::new(AnalysisOperation::ResumeForJob, f))
    }

    /// Job-specific match analysis of a resume file on disk.
    pub async fn analyze_resume_file_for_job(
        &self,
        path: &Path,
        job: &JobContext<'_>,
    ) -> Result<JobMatchAnalysis, AnalysisError> {
        self.job_match_from_file(path, job)
            .await
            .map_err(|f| AnalysisError::new(AnalysisOperation::ResumeFileForJob, f))
    }

    /// General and job-match analysis of one resume file. The file is read
    /// and uploaded once; both prompts then run concurrently.
    pub async fn analyze_resume_file_with_job(
        &self,
        path: &Path,
        job: &JobContext<'_>,
    ) -> Result<(ResumeAnalysis, JobMatchAnalysis), AnalysisError> {
        let resume = self
            .prepare(path)
            .await
            .map_err(|f| AnalysisError::new(AnalysisOperation::ResumeFile, f))?;

        tokio::try_join!(
            async {
                self.general_from_prepared(&resume)
                    .await
                    .map_err(|f| AnalysisError::new(AnalysisOperation::ResumeFile, f))
            },
            async {
                self.job_match_from_prepared(&resume, job)
                    .await
                    .map_err(|f| AnalysisError::new(AnalysisOperation::ResumeFileForJob, f))
            },
        )
    }

    // ────────────────────────────────────────────────────────────────────────
    // Pipelines
    // ────────────────────────────────────────────────────────────────────────

    async fn general_from_text(&self, resume_text: &str) -> Result<ResumeAnalysis, AnalysisFailure> {
        let prompt = format!("{RESUME_ANALYSIS_PROMPT}{resume_text}");
        let reply = self.model.generate(&prompt).await?;
        Ok(normalize_resume_analysis(&reply)?)
    }

    async fn general_from_file(&self, path: &Path) -> Result<ResumeAnalysis, AnalysisFailure> {
        let resume = self.prepare(path).await?;
        self.general_from_prepared(&resume).await
    }

    async fn general_from_prepared(
        &self,
        resume: &PreparedResume,
    ) -> Result<ResumeAnalysis, AnalysisFailure> {
        match resume {
            PreparedResume::Inline(text) => self.general_from_text(text).await,
            PreparedResume::Attached(file) => {
                let reply = self
                    .model
                    .generate_with_file(RESUME_ANALYSIS_PROMPT, file)
                    .await?;
                Ok(normalize_resume_analysis(&reply)?)
            }
        }
    }

    async fn job_match_from_text(
        &self,
        resume_text: &str,
        job: &JobContext<'_>,
    ) -> Result<JobMatchAnalysis, AnalysisFailure> {
        let prompt = render_job_match_prompt(job, resume_text);
        let reply = self.model.generate(&prompt).await?;
        Ok(normalize_job_match(&reply)?)
    }

    async fn job_match_from_file(
        &self,
        path: &Path,
        job: &JobContext<'_>,
    ) -> Result<JobMatchAnalysis, AnalysisFailure> {
        let resume = self.prepare(path).await?;
        self.job_match_from_prepared(&resume, job).await
    }

    async fn job_match_from_prepared(
        &self,
        resume: &PreparedResume,
        job: &JobContext<'_>,
    ) -> Result<JobMatchAnalysis, AnalysisFailure> {
        match resume {
            PreparedResume::Inline(text) => self.job_match_from_text(text, job).await,
            PreparedResume::Attached(file) => {
                let prompt = render_job_match_prompt(job, ATTACHED_RESUME_PLACEHOLDER);
                let reply = self.model.generate_with_file(&prompt, file).await?;
                Ok(normalize_job_match(&reply)?)
            }
        }
    }

    /// Loads the resume and, for non-text files, uploads it to the model service.
    async fn prepare(&self, path: &Path) -> Result<PreparedResume, AnalysisFailure> {
        match load_resume(path).await? {
            ResumeSource::Text(text) => Ok(PreparedResume::Inline(text)),
            ResumeSource::Attachment {
                data,
                mime_type,
                display_name,
            } => {
                let file = self.attach(data, mime_type, &display_name).await?;
                Ok(PreparedResume::Attached(file))
            }
        }
    }

    async fn attach(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, AnalysisFailure> {
        Ok(self.model.upload_file(data, mime_type, display_name).await?)
    }
}

/// Reads a resume from disk. Text files are decoded as UTF-8; other files
/// are read as raw bytes and never decoded.
async fn load_resume(path: &Path) -> Result<ResumeSource, AnalysisFailure> {
    let kind = ResumeFileKind::from_path(path);

    if kind.is_inline_text() {
        info!("Processing text resume {}", path.display());
        let text = tokio::fs::read_to_string(path).await?;
        return Ok(ResumeSource::Text(text));
    }

    let mime_type = kind.attachment_mime_type();
    info!(
        "Processing resume file {} as attachment (mime_type: {})",
        path.display(),
        mime_type
    );
    let data = tokio::fs::read(path).await?;
    let display_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("resume")
        .to_string();

    Ok(ResumeSource::Attachment {
        data,
        mime_type,
        display_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm_client::LlmError;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Generate(String),
        Upload {
            len: usize,
            mime_type: String,
            display_name: String,
        },
        GenerateWithFile {
            prompt: String,
            file_uri: String,
        },
    }

    /// Records every call and answers with a canned reply.
    struct RecordingModel {
        reply: String,
        fail_upload: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                fail_upload: false,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing_upload() -> Arc<Self> {
            Arc::new(Self {
                reply: String::new(),
                fail_upload: true,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeModel for RecordingModel {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Generate(prompt.to_string()));
            Ok(self.reply.clone())
        }

        async fn upload_file(
            &self,
            data: Vec<u8>,
            mime_type: &str,
            display_name: &str,
        ) -> Result<UploadedFile, LlmError> {
            self.calls.lock().unwrap().push(Call::Upload {
                len: data.len(),
                mime_type: mime_type.to_string(),
                display_name: display_name.to_string(),
            });
            if self.fail_upload {
                return Err(LlmError::Api {
                    status: 500,
                    message: "upload rejected".to_string(),
                });
            }
            Ok(UploadedFile {
                name: "files/test".to_string(),
                uri: "https://files/test".to_string(),
                mime_type: mime_type.to_string(),
            })
        }

        async fn generate_with_file(
            &self,
            prompt: &str,
            file: &UploadedFile,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(Call::GenerateWithFile {
                prompt: prompt.to_string(),
                file_uri: file.uri.clone(),
            });
            Ok(self.reply.clone())
        }
    }

    /// A model whose key is missing: every call fails like the real client does.
    struct UnconfiguredModel;

    #[async_trait]
    impl GenerativeModel for UnconfiguredModel {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::NotConfigured)
        }

        async fn upload_file(
            &self,
            _data: Vec<u8>,
            _mime_type: &str,
            _display_name: &str,
        ) -> Result<UploadedFile, LlmError> {
            Err(LlmError::NotConfigured)
        }

        async fn generate_with_file(
            &self,
            _prompt: &str,
            _file: &UploadedFile,
        ) -> Result<String, LlmError> {
            Err(LlmError::NotConfigured)
        }
    }

    const GENERAL_REPLY: &str = r#"```json
{"name": "Grace Hopper", "email": "grace@navy.mil", "priorityScore": 93,
 "keySkills": ["COBOL", "Compilers"], "highlights": ["Invented the compiler"]}
```"#;

    const JOB_REPLY: &str = r#"{"jobRelevancyScore": 85, "jobMatchSummary": "Strong fit", "skillMatches": ["Python","AWS"], "skillGaps": [], "strengths": ["experience"], "recommendations": []}"#;

    fn backend_job() -> JobContext<'static> {
        JobContext {
            title: "Backend Engineer",
            requirements: Some("Python, AWS, 3+ years"),
            description: None,
        }
    }

    fn resume_file(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn test_analyze_resume_inlines_text_after_prompt() {
        let model = RecordingModel::replying(GENERAL_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());

        let analysis = analyzer.analyze_resume("Grace Hopper, Rear Admiral").await.unwrap();

        assert_eq!(analysis.name, "Grace Hopper");
        assert_eq!(analysis.priority_score, 93);
        assert_eq!(
            model.calls(),
            vec![Call::Generate(format!(
                "{RESUME_ANALYSIS_PROMPT}Grace Hopper, Rear Admiral"
            ))]
        );
    }

    #[tokio::test]
    async fn test_txt_file_is_decoded_and_inlined_once_without_upload() {
        let model = RecordingModel::replying(GENERAL_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());
        let file = resume_file(".txt", "Grace Hopper — naïve résumé".as_bytes());

        let analysis = analyzer.analyze_resume_file(file.path()).await.unwrap();

        assert_eq!(analysis.email, "grace@navy.mil");
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Generate(prompt) => {
                assert!(prompt.ends_with("Grace Hopper — naïve résumé"));
            }
            other => panic!("expected inline generate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pdf_file_is_uploaded_as_pdf_and_never_decoded() {
        let model = RecordingModel::replying(GENERAL_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());
        // Invalid UTF-8 on purpose: decoding would fail the analysis.
        let bytes = b"%PDF-1.4\n\xff\xfe\x00binary";
        let file = resume_file(".pdf", bytes);

        let analysis = analyzer.analyze_resume_file(file.path()).await.unwrap();

        assert_eq!(analysis.name, "Grace Hopper");
        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Upload { len, mime_type, .. } => {
                assert_eq!(*len, bytes.len());
                assert_eq!(mime_type, "application/pdf");
            }
            other => panic!("expected upload first, got {other:?}"),
        }
        assert_eq!(
            calls[1],
            Call::GenerateWithFile {
                prompt: RESUME_ANALYSIS_PROMPT.to_string(),
                file_uri: "https://files/test".to_string(),
            }
        );
        assert!(!calls.iter().any(|c| matches!(c, Call::Generate(_))));
    }

    #[tokio::test]
    async fn test_docx_and_unknown_extensions_pick_mime_from_table() {
        for (suffix, expected) in [
            (".docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            (".DOC", "application/msword"),
            (".rtf", "application/pdf"),
        ] {
            let model = RecordingModel::replying(GENERAL_REPLY);
            let analyzer = ResumeAnalyzer::new(model.clone());
            let file = resume_file(suffix, b"binary");

            analyzer.analyze_resume_file(file.path()).await.unwrap();

            match &model.calls()[0] {
                Call::Upload { mime_type, .. } => assert_eq!(mime_type, expected, "{suffix}"),
                other => panic!("expected upload for {suffix}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_analyze_for_job_end_to_end() {
        let model = RecordingModel::replying(JOB_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());

        let analysis = analyzer
            .analyze_resume_for_job("5 years Python, AWS", &backend_job())
            .await
            .unwrap();

        assert_eq!(analysis.job_relevancy_score, 85);
        assert_eq!(analysis.skill_gaps, Vec::<String>::new());
        assert_eq!(analysis.skill_matches, vec!["Python", "AWS"]);

        match &model.calls()[0] {
            Call::Generate(prompt) => {
                assert!(prompt.contains("Backend Engineer"));
                assert!(prompt.contains("Python, AWS, 3+ years"));
                assert!(prompt.contains("JOB DESCRIPTION:\nNot specified"));
                assert!(prompt.contains("RESUME:\n5 years Python, AWS"));
            }
            other => panic!("expected inline generate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_attached_file_for_job_uses_placeholder() {
        let model = RecordingModel::replying(JOB_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());
        let file = resume_file(".pdf", b"%PDF");

        let analysis = analyzer
            .analyze_resume_file_for_job(file.path(), &backend_job())
            .await
            .unwrap();

        assert_eq!(analysis.job_relevancy_score, 85);
        match &model.calls()[1] {
            Call::GenerateWithFile { prompt, .. } => {
                assert!(prompt.contains("RESUME:\n(see attached file)"));
            }
            other => panic!("expected attachment generate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_txt_file_for_job_inlines_text() {
        let model = RecordingModel::replying(JOB_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());
        let file = resume_file(".txt", b"5 years Python, AWS");

        analyzer
            .analyze_resume_file_for_job(file.path(), &backend_job())
            .await
            .unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Generate(p) if p.contains("RESUME:\n5 years Python, AWS")));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_a_single_parse_failure() {
        let model = RecordingModel::replying("I cannot analyze this.");
        let analyzer = ResumeAnalyzer::new(model);

        let err = analyzer.analyze_resume("anything").await.unwrap_err();

        assert_eq!(err.operation, AnalysisOperation::Resume);
        assert!(matches!(err.failure, AnalysisFailure::UpstreamParse(_)));
        assert!(err
            .to_string()
            .starts_with("Failed to analyze resume: Failed to parse AI response"));
    }

    #[tokio::test]
    async fn test_empty_reply_is_a_parse_failure() {
        let model = RecordingModel::replying("");
        let analyzer = ResumeAnalyzer::new(model);

        let err = analyzer
            .analyze_resume_for_job("text", &backend_job())
            .await
            .unwrap_err();

        assert_eq!(err.operation, AnalysisOperation::ResumeForJob);
        assert!(matches!(err.failure, AnalysisFailure::UpstreamParse(_)));
    }

    #[tokio::test]
    async fn test_txt_failure_is_reported_once_as_file_operation() {
        let model = RecordingModel::replying("not json");
        let analyzer = ResumeAnalyzer::new(model);
        let file = resume_file(".txt", b"resume");

        let err = analyzer.analyze_resume_file(file.path()).await.unwrap_err();

        assert_eq!(err.operation, AnalysisOperation::ResumeFile);
        assert_eq!(err.to_string().matches("Failed to analyze").count(), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_surfaces_as_upstream_call() {
        let model = RecordingModel::failing_upload();
        let analyzer = ResumeAnalyzer::new(model.clone());
        let file = resume_file(".pdf", b"%PDF");

        let err = analyzer
            .analyze_resume_file_for_job(file.path(), &backend_job())
            .await
            .unwrap_err();

        assert_eq!(err.operation, AnalysisOperation::ResumeFileForJob);
        assert!(matches!(err.failure, AnalysisFailure::UpstreamCall(_)));
        // No generation after a failed upload.
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_credentials_are_a_configuration_failure() {
        let analyzer = ResumeAnalyzer::new(Arc::new(UnconfiguredModel));

        let err = analyzer.analyze_resume("text").await.unwrap_err();

        assert!(matches!(err.failure, AnalysisFailure::Configuration));
    }

    #[tokio::test]
    async fn test_invalid_utf8_txt_is_a_file_failure() {
        let model = RecordingModel::replying(GENERAL_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());
        let file = resume_file(".txt", b"\xff\xfe\xfd");

        let err = analyzer.analyze_resume_file(file.path()).await.unwrap_err();

        assert!(matches!(err.failure, AnalysisFailure::ResumeFile(_)));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_file_failure() {
        let model = RecordingModel::replying(GENERAL_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());

        let err = analyzer
            .analyze_resume_file(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err.failure, AnalysisFailure::ResumeFile(_)));
        assert!(model.calls().is_empty());
    }

    const COMBINED_REPLY: &str = r#"{"name": "Grace Hopper", "priorityScore": 90, "jobRelevancyScore": 72, "skillMatches": ["COBOL"]}"#;

    #[tokio::test]
    async fn test_file_with_job_uploads_once_for_both_prompts() {
        let model = RecordingModel::replying(COMBINED_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());
        let file = resume_file(".pdf", b"%PDF-1.4");

        let (general, job_match) = analyzer
            .analyze_resume_file_with_job(file.path(), &backend_job())
            .await
            .unwrap();

        assert_eq!(general.priority_score, 90);
        assert_eq!(job_match.job_relevancy_score, 72);
        let calls = model.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::Upload { .. })).count(),
            1
        );
        assert!(matches!(calls[0], Call::Upload { .. }));
        assert!(calls.iter().any(|c| matches!(
            c,
            Call::GenerateWithFile { prompt, .. } if prompt == RESUME_ANALYSIS_PROMPT
        )));
        assert!(calls.iter().any(|c| matches!(
            c,
            Call::GenerateWithFile { prompt, .. } if prompt.contains("RESUME:\n(see attached file)")
        )));
    }

    #[tokio::test]
    async fn test_txt_file_with_job_inlines_text_in_both_prompts() {
        let model = RecordingModel::replying(COMBINED_REPLY);
        let analyzer = ResumeAnalyzer::new(model.clone());
        let file = resume_file(".txt", b"COBOL since 1959");

        analyzer
            .analyze_resume_file_with_job(file.path(), &backend_job())
            .await
            .unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|c| matches!(c, Call::Generate(p) if p.contains("COBOL since 1959"))));
    }

    #[tokio::test]
    async fn test_file_with_job_upload_failure_skips_generation() {
        let model = RecordingModel::failing_upload();
        let analyzer = ResumeAnalyzer::new(model.clone());
        let file = resume_file(".docx", b"PK");

        let err = analyzer
            .analyze_resume_file_with_job(file.path(), &backend_job())
            .await
            .unwrap_err();

        assert_eq!(err.operation, AnalysisOperation::ResumeFile);
        assert!(matches!(err.failure, AnalysisFailure::UpstreamCall(_)));
        assert_eq!(model.calls().len(), 1);
    }
}
