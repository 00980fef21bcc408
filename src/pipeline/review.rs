use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use log::info;

use crate::chat::client::CompletionClient;
use crate::error::Result;
use crate::models::job::JobDescription;
use crate::models::profile::ResumeFacts;

/// Asks the model where the candidate's qualifications fall short of the job
/// description and appends the answer to the cumulative areas-of-improvement
/// file under a per-job heading.
pub async fn check_qualifications(
    client: &CompletionClient,
    job: &JobDescription,
    facts: &ResumeFacts,
    areas_path: &Path,
    max_tokens: u32,
) -> Result<()> {
    info!("checking qualifications against the job description");

    let name = format!(
        "{} {}",
        facts.personal_info.first_name, facts.personal_info.last_name
    );
    let experience = serde_json::to_string(&facts.professional_experience)?;

    let content = client
        .complete(
            &format!(
                "The following json data describes the job skills of {name}: ```{experience}``` \
                 Follow these instructions: \
                 1. Compare the qualifications of {name} to the following job description: \
                 ```{}``` \
                 2. Locate areas where {name}'s qualifications may be lacking \
                 3. Return only areas where qualifications may be lacking",
                job.role_description
            ),
            max_tokens,
        )
        .await?;

    if let Some(parent) = areas_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(areas_path)?;
    writeln!(file, "## {}", job.name_param)?;
    writeln!(file, "{content}")?;
    writeln!(file)?;

    info!(
        "areas of improvement appended to {}",
        areas_path.display()
    );
    Ok(())
}
