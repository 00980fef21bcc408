use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "resume-tailor")]
#[command(about = "Generate a resume and cover letter tailored to a job posting", long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["job_description", "otta", "linkedin"])
))]
pub struct Args {
    /// Job description JSON filename, resolved against the configured input directory
    #[arg(short = 'j', long, value_name = "FILE")]
    pub job_description: Option<String>,

    /// Otta job posting URL to scrape
    #[arg(short = 'o', long, value_name = "URL")]
    pub otta: Option<String>,

    /// LinkedIn job posting URL to scrape
    #[arg(short = 'l', long, value_name = "URL")]
    pub linkedin: Option<String>,

    /// Also generate a cover letter from the tailored resume content
    #[arg(long)]
    pub cover_letter: bool,

    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Sets the logger's verbosity level
    #[arg(short, long, value_name = "VERBOSITY", default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,
}
