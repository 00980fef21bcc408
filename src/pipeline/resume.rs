use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::chat::client::CompletionClient;
use crate::error::{Error, Result};
use crate::models::job::JobDescription;
use crate::models::profile::{ExperienceInput, ResumeFacts};
use crate::utils::config::PipelineConfig;
use crate::utils::log::JobLog;

/// Appended to every prompt whose output feeds a structured decode step.
const FORM_CLAUSE: &str =
    "Return only a JSON array of strings wrapped in a ```json fence, with no other text.";

/// Job-side skill extractions consumed by every per-employer stage.
#[derive(Debug, Clone)]
pub struct SkillProfile {
    pub tech_skills: String,
    pub tech_tools: String,
    pub soft_skills: String,
}

impl SkillProfile {
    fn combined(&self) -> String {
        format!("{} {} {}", self.tech_skills, self.tech_tools, self.soft_skills)
    }
}

// Per-employer stage types. Each stage consumes the previous one, so a bullet
// list can never skip a transition or go backward.

/// Stage 4 output: bullets relevant to the job's skill profile.
#[derive(Debug, Clone)]
pub struct FilteredExperience {
    input: ExperienceInput,
    relevant: Vec<String>,
}

/// Stage 5 output: down-selected to the configured target count.
#[derive(Debug, Clone)]
pub struct ShortlistedExperience {
    input: ExperienceInput,
    shortlist: Vec<String>,
}

/// Stage 6 output: rewritten for clarity with skill terms preserved.
#[derive(Debug, Clone)]
pub struct RewrittenExperience {
    input: ExperienceInput,
    formatted: Vec<String>,
}

impl RewrittenExperience {
    /// Final transition; applying a role title needs no model call, so title
    /// overrides can bypass the completion client entirely.
    pub fn finalize(self, role_title: String) -> ExperienceEntry {
        ExperienceEntry {
            employer: self.input.employer,
            role_title,
            employment_start: self.input.employment_start,
            employment_end: self.input.employment_end,
            responsibilities: self.formatted,
        }
    }
}

/// Finalized per-employer record handed to the document renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub employer: String,
    pub role_title: String,
    pub employment_start: String,
    pub employment_end: String,
    pub responsibilities: Vec<String>,
}

/// Strips the expected ```json fence and parses the payload as a string
/// array. Fence variants the model occasionally produces (bare fence, no
/// fence) are tolerated, and an empty array is a valid result (an employer
/// may have no relevant bullets); anything that fails to parse is a
/// [`Error::ModelOutputFormat`].
pub fn decode_fenced_list(response: &str) -> Result<Vec<String>> {
    let trimmed = response.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let inner = inner.strip_suffix("```").unwrap_or(inner).trim();

    serde_json::from_str(inner)
        .map_err(|e| Error::ModelOutputFormat(format!("{e}: {}", truncated(response))))
}

/// Re-wraps a decoded list so it can be fed back to the model in the same
/// shape it was produced in.
pub fn encode_fenced_list(items: &[String]) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::to_string(items).unwrap_or_default()
    )
}

/// The model sometimes over-returns; the target count is a hard cap.
fn clamp_shortlist(mut items: Vec<String>, target: usize) -> Vec<String> {
    items.truncate(target);
    items
}

fn truncated(text: &str) -> String {
    text.chars().take(80).collect()
}

/// Fixed, unbranching sequence of completion calls that turns raw employer
/// facts into tailored experience entries. Any stage failure aborts the whole
/// run; no partial resume is ever produced.
pub struct ResumePipeline<'a> {
    client: &'a CompletionClient,
    config: &'a PipelineConfig,
    job: &'a JobDescription,
    joblog: &'a JobLog,
    max_tokens: u32,
}

impl<'a> ResumePipeline<'a> {
    pub fn new(
        client: &'a CompletionClient,
        config: &'a PipelineConfig,
        job: &'a JobDescription,
        joblog: &'a JobLog,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            config,
            job,
            joblog,
            max_tokens,
        }
    }

    pub async fn run(&self, facts: &ResumeFacts) -> Result<(SkillProfile, Vec<ExperienceEntry>)> {
        info!("generating resume content");

        let profile = self.extract_skill_profile().await?;

        let mut entries = Vec::with_capacity(facts.professional_experience.len());
        for (i, input) in facts.professional_experience.iter().enumerate() {
            let filtered = self.filter(input, &profile).await?;
            let shortlisted = self
                .shortlist(filtered, &profile, self.config.target_count(i))
                .await?;
            let rewritten = self.rewrite(shortlisted, &profile).await?;
            let entry = self.assign_title(rewritten, self.config.title_override(i)).await?;
            entries.push(entry);
        }

        let mut titles = String::from("generated role titles:\n");
        for entry in &entries {
            titles.push_str(&format!("  {}: {}\n", entry.employer, entry.role_title));
        }
        info!("{}", titles.trim_end());
        self.joblog.append(titles.trim_end())?;

        Ok((profile, entries))
    }

    /// Stages 1-3: one extraction call each against the role description.
    async fn extract_skill_profile(&self) -> Result<SkillProfile> {
        let tech_skills = self
            .client
            .complete(
                &format!(
                    "Extract the technical skills required within this job description: {} \
                     Do not return any other additional skills",
                    self.job.role_description
                ),
                self.max_tokens,
            )
            .await?;
        self.joblog.append(&format!("tech skills: {tech_skills}"))?;

        let tech_tools = self
            .client
            .complete(
                &format!(
                    "Extract all technology tools, e.g. coding languages, cloud development \
                     tools, and any specific development methodologies required within this \
                     job description: {} Do not return any other additional skills",
                    self.job.role_description
                ),
                self.max_tokens,
            )
            .await?;
        self.joblog.append(&format!("tech tools: {tech_tools}"))?;

        let soft_skills = self
            .client
            .complete(
                &format!(
                    "Extract the key soft skills from this job description: {}",
                    self.job.role_description
                ),
                self.max_tokens,
            )
            .await?;
        self.joblog.append(&format!("soft skills: {soft_skills}"))?;

        Ok(SkillProfile {
            tech_skills,
            tech_tools,
            soft_skills,
        })
    }

    /// Stage 4: select the bullets relevant to the combined skill profile.
    async fn filter(
        &self,
        input: &ExperienceInput,
        profile: &SkillProfile,
    ) -> Result<FilteredExperience> {
        debug!("filtering responsibilities for {}", input.employer);

        let response = self
            .client
            .complete(
                &format!(
                    "From this list: {} select the elements that correspond to the following \
                     skills: {} . {FORM_CLAUSE}",
                    encode_fenced_list(&input.responsibilities),
                    profile.combined()
                ),
                self.max_tokens,
            )
            .await?;

        let relevant = decode_fenced_list(&response)?;
        self.joblog
            .append(&format!("{}: {} relevant bullets", input.employer, relevant.len()))?;

        Ok(FilteredExperience {
            input: input.clone(),
            relevant,
        })
    }

    /// Stage 5: down-select to at most `target` bullets, preserving as much
    /// skill coverage as possible.
    async fn shortlist(
        &self,
        filtered: FilteredExperience,
        profile: &SkillProfile,
        target: usize,
    ) -> Result<ShortlistedExperience> {
        debug!(
            "shortlisting {} bullets to {target} for {}",
            filtered.relevant.len(),
            filtered.input.employer
        );

        let response = self
            .client
            .complete(
                &format!(
                    "Select the most relevant {target} responsibilities from this list: {} . \
                     That cover as many of these areas as possible: {} . {FORM_CLAUSE}",
                    encode_fenced_list(&filtered.relevant),
                    profile.combined()
                ),
                self.max_tokens,
            )
            .await?;

        let shortlist = clamp_shortlist(decode_fenced_list(&response)?, target);

        Ok(ShortlistedExperience {
            input: filtered.input,
            shortlist,
        })
    }

    /// Stage 6: rewrite the shortlist for readability while keeping every
    /// skill term present.
    async fn rewrite(
        &self,
        shortlisted: ShortlistedExperience,
        profile: &SkillProfile,
    ) -> Result<RewrittenExperience> {
        debug!("rewriting bullets for {}", shortlisted.input.employer);

        let response = self
            .client
            .complete(
                &format!(
                    "Increase the readability of the elements in this list: {} . Every \
                     statement should be clear and concise. Remove unnecessary punctuation. \
                     Ensure that all skills included here are preserved in the final output: \
                     {} . Additional extraneous skills may be removed if an element is overly \
                     long. {FORM_CLAUSE}",
                    encode_fenced_list(&shortlisted.shortlist),
                    profile.combined()
                ),
                self.max_tokens,
            )
            .await?;

        let formatted = decode_fenced_list(&response)?;

        Ok(RewrittenExperience {
            input: shortlisted.input,
            formatted,
        })
    }

    /// Stage 7: a non-empty override bypasses the model call entirely.
    async fn assign_title(
        &self,
        rewritten: RewrittenExperience,
        title_override: Option<&str>,
    ) -> Result<ExperienceEntry> {
        if let Some(title) = title_override {
            debug!("using role title override for {}", rewritten.input.employer);
            return Ok(rewritten.finalize(title.to_string()));
        }

        let response = self
            .client
            .complete(
                &format!(
                    "Return only one job title given the following list: {}",
                    encode_fenced_list(&rewritten.formatted)
                ),
                self.max_tokens,
            )
            .await?;

        Ok(rewritten.finalize(response.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Education, PersonalInfo};
    use crate::utils::config::LLMConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn input() -> ExperienceInput {
        ExperienceInput {
            employer: "Initech".to_string(),
            employment_start: "2019".to_string(),
            employment_end: "2023".to_string(),
            responsibilities: vec!["Built ETL pipelines".to_string()],
        }
    }

    #[test]
    fn decodes_json_fenced_list() {
        let response = "```json\n[\"Built ETL pipelines\", \"Led a team\"]\n```";
        let items = decode_fenced_list(response).unwrap();
        assert_eq!(items, vec!["Built ETL pipelines", "Led a team"]);
    }

    #[test]
    fn decodes_bare_fence_and_unfenced() {
        assert_eq!(
            decode_fenced_list("```\n[\"a\"]\n```").unwrap(),
            vec!["a".to_string()]
        );
        assert_eq!(
            decode_fenced_list("[\"a\", \"b\"]").unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn malformed_payload_is_model_output_format_error() {
        let err = decode_fenced_list("Sure! Here are the bullets you asked for.").unwrap_err();
        assert!(matches!(err, Error::ModelOutputFormat(_)));
    }

    #[test]
    fn empty_list_is_a_valid_stage_result() {
        assert!(decode_fenced_list("```json\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let items = vec!["one".to_string(), "two, with comma".to_string()];
        assert_eq!(decode_fenced_list(&encode_fenced_list(&items)).unwrap(), items);
    }

    #[test]
    fn shortlist_never_exceeds_target() {
        let items: Vec<String> = (0..10).map(|i| format!("bullet {i}")).collect();
        assert_eq!(clamp_shortlist(items.clone(), 4).len(), 4);
        assert_eq!(clamp_shortlist(items.clone(), 10).len(), 10);
        assert_eq!(clamp_shortlist(items, 12).len(), 10);
    }

    #[test]
    fn finalize_carries_static_dates_through() {
        let rewritten = RewrittenExperience {
            input: input(),
            formatted: vec!["Designed ETL pipelines in Python".to_string()],
        };

        let entry = rewritten.finalize("Senior Data Engineer".to_string());
        assert_eq!(entry.employer, "Initech");
        assert_eq!(entry.role_title, "Senior Data Engineer");
        assert_eq!(entry.employment_start, "2019");
        assert_eq!(entry.employment_end, "2023");
        assert_eq!(entry.responsibilities.len(), 1);
    }

    fn facts() -> ResumeFacts {
        ResumeFacts {
            personal_info: PersonalInfo {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone_number: "555-0100".to_string(),
                linkedin_url: "linkedin.com/in/janedoe".to_string(),
            },
            professional_experience: vec![input()],
            education: Education {
                degree: "B.S.".to_string(),
                major: "Computer Science".to_string(),
                minor: None,
                institution: "State University".to_string(),
                education_start: "2012".to_string(),
                education_end: "2016".to_string(),
            },
            military_experience: None,
            hard_skills: vec![],
        }
    }

    fn job() -> JobDescription {
        JobDescription {
            company_name: "Quora".to_string(),
            role_title: "Data Scientist".to_string(),
            name_param: "quora-data-scientist".to_string(),
            role_description: "Analyze product data.".to_string(),
            key_skills: vec![],
            company_sectors: vec![],
        }
    }

    fn llm_config(endpoint: String) -> LLMConfig {
        LLMConfig {
            api_key: Some("test-key".to_string()),
            model: "test-model".to_string(),
            endpoint,
            max_retries: 1,
            retry_delay_secs: 0,
            exponential_backoff: false,
            max_tokens: 256,
            verbose_prompt: false,
            verbose_output: false,
        }
    }

    fn pipeline_config(role_title_overrides: Vec<String>) -> PipelineConfig {
        PipelineConfig {
            responsibility_count: vec![4],
            role_title_overrides,
            persist_content: false,
        }
    }

    /// A fenced list doubles as a plain-text response for the extraction
    /// stages, so one catch-all mock covers every stage.
    fn fenced_list_body() -> serde_json::Value {
        serde_json::json!({
            "content": [{"type": "text", "text": "```json\n[\"Built ETL pipelines\"]\n```"}],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        })
    }

    #[tokio::test]
    async fn title_override_skips_the_titling_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fenced_list_body()))
            .mount(&server)
            .await;

        let client = CompletionClient::new(llm_config(server.uri())).unwrap();
        let config = pipeline_config(vec!["Staff Engineer".to_string()]);
        let job = job();
        let dir = std::env::temp_dir().join(format!("pipeline-override-{}", std::process::id()));
        let joblog = JobLog::create(&dir, &job.name_param).unwrap();

        let pipeline = ResumePipeline::new(&client, &config, &job, &joblog, 256);
        let (_, entries) = pipeline.run(&facts()).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role_title, "Staff Engineer");
        assert_eq!(entries[0].responsibilities, vec!["Built ETL pipelines"]);
        // 3 skill extractions + filter + shortlist + rewrite; no titling round trip
        assert_eq!(server.received_requests().await.unwrap().len(), 6);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn stage_failure_aborts_the_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error": {"type": "invalid_request_error", "message": "bad"}}"#,
            ))
            .mount(&server)
            .await;

        let client = CompletionClient::new(llm_config(server.uri())).unwrap();
        let config = pipeline_config(vec![]);
        let job = job();
        let dir = std::env::temp_dir().join(format!("pipeline-abort-{}", std::process::id()));
        let joblog = JobLog::create(&dir, &job.name_param).unwrap();

        let pipeline = ResumePipeline::new(&client, &config, &job, &joblog, 256);
        let err = pipeline.run(&facts()).await.unwrap_err();
        assert!(matches!(err, Error::Completion(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn experience_entry_serializes_for_reuse() {
        let entry = ExperienceEntry {
            employer: "Initech".to_string(),
            role_title: "Data Engineer".to_string(),
            employment_start: "2019".to_string(),
            employment_end: "2023".to_string(),
            responsibilities: vec!["Shipped things".to_string()],
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: ExperienceEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
