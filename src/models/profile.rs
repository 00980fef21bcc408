use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Static personal/professional facts loaded once at startup and read-only for
/// the remainder of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeFacts {
    pub personal_info: PersonalInfo,
    pub professional_experience: Vec<ExperienceInput>,
    pub education: Education,
    pub military_experience: Option<MilitaryExperience>,
    #[serde(default)]
    pub hard_skills: Vec<HardSkill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub linkedin_url: String,
}

/// One employer's raw facts before any tailoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceInput {
    pub employer: String,
    pub employment_start: String,
    pub employment_end: String,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub major: String,
    pub minor: Option<String>,
    pub institution: String,
    pub education_start: String,
    pub education_end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilitaryExperience {
    pub role_title: String,
    pub branch: String,
    pub service_start: String,
    pub service_end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardSkill {
    pub name: String,
    pub detail: String,
}

impl ResumeFacts {
    /// Loads the facts file, falling back to the sample file when the primary
    /// path does not exist yet.
    pub fn load(path: &Path, sample_path: &Path) -> Result<Self> {
        let chosen = if path.exists() {
            path
        } else if sample_path.exists() {
            warn!(
                "resume facts not found at {}, using sample file",
                path.display()
            );
            sample_path
        } else {
            return Err(Error::NotFound(path.to_path_buf()));
        };

        let raw = std::fs::read_to_string(chosen)?;
        let facts: ResumeFacts = serde_json::from_str(&raw)?;

        info!(
            "resume facts loaded for {} {} ({} employers)",
            facts.personal_info.first_name,
            facts.personal_info.last_name,
            facts.professional_experience.len()
        );
        Ok(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "personal_info": {
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "jane@example.com",
            "phone_number": "555-0100",
            "linkedin_url": "linkedin.com/in/janedoe"
        },
        "professional_experience": [
            {
                "employer": "Initech",
                "employment_start": "2019",
                "employment_end": "2023",
                "responsibilities": ["Built TPS report automation", "Led a team of 4"]
            }
        ],
        "education": {
            "degree": "B.S.",
            "major": "Computer Science",
            "minor": null,
            "institution": "State University",
            "education_start": "2012",
            "education_end": "2016"
        },
        "military_experience": null,
        "hard_skills": [
            { "name": "Languages", "detail": "Python, SQL, Rust" }
        ]
    }"#;

    #[test]
    fn loads_primary_file() {
        let dir = std::env::temp_dir().join(format!("facts-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("resume.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let facts = ResumeFacts::load(&path, &dir.join("missing.json")).unwrap();
        assert_eq!(facts.personal_info.first_name, "Jane");
        assert_eq!(facts.professional_experience.len(), 1);
        assert!(facts.military_experience.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn falls_back_to_sample() {
        let dir = std::env::temp_dir().join(format!("facts-sample-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let sample = dir.join("resume.sample.json");
        std::fs::write(&sample, SAMPLE).unwrap();

        let facts = ResumeFacts::load(&dir.join("resume.json"), &sample).unwrap();
        assert_eq!(facts.personal_info.last_name, "Doe");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_both_paths_is_not_found() {
        let err = ResumeFacts::load(
            Path::new("/nonexistent/resume.json"),
            Path::new("/nonexistent/resume.sample.json"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
