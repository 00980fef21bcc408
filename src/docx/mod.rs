use std::path::{Path, PathBuf};

use crate::models::profile::PersonalInfo;

pub mod cover_letter;
pub mod resume;
pub mod style;

/// Deterministic artifact path: `{dir}/{first}-{last}-{name_param}-{kind}.docx`.
pub fn output_path(
    output_dir: &Path,
    personal: &PersonalInfo,
    name_param: &str,
    kind: &str,
) -> PathBuf {
    output_dir.join(format!(
        "{}-{}-{}-{}.docx",
        personal.first_name.to_lowercase(),
        personal.last_name.to_lowercase(),
        name_param,
        kind
    ))
}
