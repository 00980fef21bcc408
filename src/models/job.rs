use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normalized job posting record. Produced once per run by exactly one source
/// adapter (file, Otta, LinkedIn) and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub company_name: String,
    pub role_title: String,
    pub name_param: String,
    pub role_description: String,
    #[serde(default)]
    pub key_skills: Vec<String>,
    #[serde(default)]
    pub company_sectors: Vec<String>,
}

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^a-zA-Z0-9]").unwrap());
static HYPHEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("-{2,}").unwrap());

/// Derives the filesystem/URL-safe slug used to name every artifact of a run.
///
/// Canonical ordering is `{company}-{role}`: non-alphanumeric characters become
/// hyphens, runs of hyphens collapse, everything lowercased.
pub fn derive_name_param(company_name: &str, role_title: &str) -> Result<String> {
    if company_name.trim().is_empty() || role_title.trim().is_empty() {
        return Err(Error::Extraction(
            "cannot generate name parameter; missing company name or role title".to_string(),
        ));
    }

    let company = NON_ALNUM.replace_all(company_name, "-").to_lowercase();
    let role = NON_ALNUM.replace_all(role_title, "-").to_lowercase();

    let joined = format!("{company}-{role}");
    let collapsed = HYPHEN_RUN.replace_all(&joined, "-");

    Ok(collapsed.trim_matches('-').to_string())
}

impl JobDescription {
    /// Reads a job description JSON file. Fields are returned exactly as
    /// stored; nothing is re-derived.
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("reading job description from file: {}", path.display());

        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path)?;
        let jd: JobDescription = serde_json::from_str(&raw)?;

        info!("job description loaded: {}", jd.role_title);
        Ok(jd)
    }

    /// Resolves a bare filename against the configured input directory.
    pub fn from_input_dir(dir: &Path, file: &str) -> Result<Self> {
        Self::from_file(&dir.join(file))
    }

    /// Writes the record to `{dir}/{name_param}.json` so a scraped posting can
    /// be re-used through the file adapter without re-scraping.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.name_param));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;

        info!("job description written to: {}", path.display());
        Ok(path)
    }
}
