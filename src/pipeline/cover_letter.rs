use std::path::Path;

use log::info;

use crate::chat::client::CompletionClient;
use crate::error::Result;
use crate::models::job::JobDescription;
use crate::pipeline::resume::ExperienceEntry;

/// Generates the cover letter body text. Consumes the tailored resume entries
/// as context, so it can only run after a successful resume pipeline.
pub struct CoverLetterPipeline<'a> {
    client: &'a CompletionClient,
    job: &'a JobDescription,
    content_dir: &'a Path,
    max_tokens: u32,
}

impl<'a> CoverLetterPipeline<'a> {
    pub fn new(
        client: &'a CompletionClient,
        job: &'a JobDescription,
        content_dir: &'a Path,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            job,
            content_dir,
            max_tokens,
        }
    }

    pub async fn generate(&self, resume: &[ExperienceEntry]) -> Result<String> {
        info!("generating cover letter content");

        let user_content = self.read_user_content()?;

        let company_info = self
            .client
            .complete(
                &format!(
                    "Give me a summary about this company and tell me about its values: {}",
                    self.job.company_name
                ),
                self.max_tokens,
            )
            .await?;

        let experience = serde_json::to_string(resume)?;

        let prompt = match &user_content {
            Some(content) => format!(
                "An individual has this experience: {experience}. \
                 They are applying for this job: {}. \
                 at this company: {company_info}. \
                 Write them a cover letter following these instructions: \
                 1. Incorporate this content ```{content}``` in a logical fashion; perform \
                 grammatical and structural improvements to this content if need be. \
                 2. Output should contain the body of the cover letter and not the address \
                 or salutation. \
                 3. Focus on why the applicant is interested in the key areas of the role \
                 and the company. \
                 4. Do not use the word 'excitement' or any synonym in the first sentence. \
                 5. Do not overly emphasize the applicant's experience, this should not be \
                 a duplicate of their resume. \
                 6. Do not include a complimentary closing. \
                 7. Limit the output to 4 paragraphs.",
                self.job.role_description
            ),
            None => format!(
                "An individual has this experience: {experience}. \
                 They are applying for this job: {}. \
                 at this company: {company_info}. \
                 Write them a cover letter following these instructions: \
                 1. Output should contain the body of the cover letter and not the address \
                 or salutation. \
                 2. Focus on why the applicant is interested in the key areas of the role \
                 and the company. \
                 3. Do not use the word 'excitement' or any synonym in the first sentence. \
                 4. Do not overly emphasize the applicant's experience, this should not be \
                 a duplicate of their resume. \
                 5. Do not include a complimentary closing. \
                 6. Limit the output to 4 paragraphs.",
                self.job.role_description
            ),
        };

        let body = self.client.complete(&prompt, self.max_tokens).await?;

        info!("cover letter content generated");
        Ok(body.trim().to_string())
    }

    /// User-supplied talking points for this company, when such a file exists.
    fn read_user_content(&self) -> Result<Option<String>> {
        let path = self
            .content_dir
            .join(format!("{}.txt", self.job.company_name));

        if path.exists() {
            info!("found cover letter content file: {}", path.display());
            Ok(Some(std::fs::read_to_string(&path)?))
        } else {
            Ok(None)
        }
    }
}
