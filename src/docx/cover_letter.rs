use std::path::{Path, PathBuf};

use log::info;

use crate::docx::output_path;
use crate::docx::style;
use crate::error::Result;
use crate::models::profile::PersonalInfo;
use crate::utils::config::DocConfig;

/// Renders the cover letter body into a .docx file with a fixed salutation
/// and closing around it.
pub struct CoverLetterRenderer<'a> {
    config: &'a DocConfig,
    output_dir: &'a Path,
}

impl<'a> CoverLetterRenderer<'a> {
    pub fn new(config: &'a DocConfig, output_dir: &'a Path) -> Self {
        Self { config, output_dir }
    }

    pub fn render(
        &self,
        personal: &PersonalInfo,
        body: &str,
        name_param: &str,
    ) -> Result<PathBuf> {
        info!("writing cover letter");

        let spec = &self.config.cover_letter;

        let mut docx = style::base_document();
        docx = style::add_header(docx, personal, self.config, true)?;

        docx = docx
            .add_paragraph(style::blank(spec))
            .add_paragraph(style::blank(spec))
            .add_paragraph(style::line("Dear Hiring Manager,", spec))
            .add_paragraph(style::blank(spec));

        for paragraph in body.split("\n\n").filter(|p| !p.trim().is_empty()) {
            docx = docx
                .add_paragraph(style::line(paragraph.trim(), spec))
                .add_paragraph(style::blank(spec));
        }

        docx = docx.add_paragraph(style::line("Looking forward to meeting you,", spec));
        docx = docx.add_paragraph(style::line(
            &format!("{} {}", personal.first_name, personal.last_name),
            spec,
        ));

        let path = output_path(self.output_dir, personal, name_param, "cover-letter");
        style::save(docx, &path)?;

        info!("cover letter saved to {}", path.display());
        Ok(path)
    }
}
