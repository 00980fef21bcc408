mod chat;
mod docx;
mod error;
mod models;
mod pipeline;
mod scraper;
mod utils;

use clap::Parser;
use colored::Colorize;
use eyre::Result;
use log::{debug, info};

use crate::chat::client::CompletionClient;
use crate::docx::cover_letter::CoverLetterRenderer;
use crate::docx::resume::ResumeRenderer;
use crate::models::job::JobDescription;
use crate::models::profile::ResumeFacts;
use crate::pipeline::cover_letter::CoverLetterPipeline;
use crate::pipeline::resume::ResumePipeline;
use crate::pipeline::review;
use crate::scraper::linkedin::LinkedinScraper;
use crate::scraper::otta::OttaScraper;
use crate::utils::cli::Args;
use crate::utils::config::{Config, config};
use crate::utils::log::{JobLog, Logger};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    Logger::init(args.verbosity);

    info!(
        "starting resume-tailor {}",
        format!("v{}", env!("CARGO_PKG_VERSION")).magenta()
    );

    let config: Config = config(args.config.clone())?;

    let job = get_job_description(&args, &config).await?;
    info!(
        "job description loaded: {} at {}",
        job.role_title.cyan(),
        job.company_name.cyan()
    );
    debug!("job description: {:#?}", job);

    let facts = ResumeFacts::load(&config.paths.resume_input, &config.paths.resume_input_sample)?;

    let client = CompletionClient::new(config.llm.clone())?;
    let joblog = JobLog::create(&config.paths.log_dir, &job.name_param)?;
    debug!("job log at {}", joblog.path().display());

    review::check_qualifications(
        &client,
        &job,
        &facts,
        &config.paths.areas_of_improvement,
        config.llm.max_tokens,
    )
    .await?;

    let resume_pipeline = ResumePipeline::new(
        &client,
        &config.pipeline,
        &job,
        &joblog,
        config.llm.max_tokens,
    );
    let (_profile, entries) = resume_pipeline.run(&facts).await?;

    if config.pipeline.persist_content {
        let path = config
            .paths
            .output_dir
            .join(format!("{}-content.json", job.name_param));
        std::fs::create_dir_all(&config.paths.output_dir)?;
        std::fs::write(&path, serde_json::to_string_pretty(&entries)?)?;
        info!("tailored content persisted to {}", path.display());
    }

    let resume_path = ResumeRenderer::new(&config.doc, &config.paths.output_dir).render(
        &facts,
        &entries,
        &job.name_param,
    )?;
    info!("resume ready: {}", resume_path.display().to_string().green());

    if args.cover_letter {
        let body = CoverLetterPipeline::new(
            &client,
            &job,
            &config.paths.cover_letter_content_dir,
            config.llm.max_tokens,
        )
        .generate(&entries)
        .await?;

        let letter_path = CoverLetterRenderer::new(&config.doc, &config.paths.output_dir).render(
            &facts.personal_info,
            &body,
            &job.name_param,
        )?;
        info!(
            "cover letter ready: {}",
            letter_path.display().to_string().green()
        );
    }

    Ok(())
}

/// Resolves the job description from whichever source flag was given. Scraped
/// postings are written back to the input directory so later runs can replay
/// them with `--job-description`.
async fn get_job_description(args: &Args, config: &Config) -> Result<JobDescription> {
    if let Some(ref file) = args.job_description {
        return Ok(JobDescription::from_input_dir(
            &config.paths.job_description_dir,
            file,
        )?);
    }

    let job = if let Some(ref url) = args.otta {
        OttaScraper::new(url, config.scrape.clone()).scrape().await?
    } else if let Some(ref url) = args.linkedin {
        LinkedinScraper::new(url, config.scrape.clone())
            .scrape()
            .await?
    } else {
        unreachable!("clap enforces exactly one source flag");
    };

    let saved = job.write_to_dir(&config.paths.job_description_dir)?;
    info!("scraped job description saved to {}", saved.display());

    Ok(job)
}
