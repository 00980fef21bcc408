use std::path::{Path, PathBuf};

use docx_rs::{AlignmentType, Paragraph, Table, TableCell, TableRow, WidthType};
use log::info;

use crate::docx::output_path;
use crate::docx::style;
use crate::error::Result;
use crate::models::profile::ResumeFacts;
use crate::pipeline::resume::ExperienceEntry;
use crate::utils::config::DocConfig;

const LEFT_COL_DXA: usize = 6480; // 4.5in
const RIGHT_COL_DXA: usize = 2880; // 2.0in

/// Renders the tailored resume to a .docx file. Sections are built in a fixed
/// order; an existing file at the output path is overwritten.
pub struct ResumeRenderer<'a> {
    config: &'a DocConfig,
    output_dir: &'a Path,
}

impl<'a> ResumeRenderer<'a> {
    pub fn new(config: &'a DocConfig, output_dir: &'a Path) -> Self {
        Self { config, output_dir }
    }

    pub fn render(
        &self,
        facts: &ResumeFacts,
        entries: &[ExperienceEntry],
        name_param: &str,
    ) -> Result<PathBuf> {
        info!("writing resume");

        let mut entries = entries.to_vec();
        if self.config.currently_employed
            && let Some(first) = entries.first_mut()
        {
            first.employment_end = String::new();
        }

        let mut docx = style::base_document();
        docx = style::add_header(docx, &facts.personal_info, self.config, false)?;
        docx = docx.add_paragraph(style::blank(&self.config.normal));

        // professional experience
        docx = docx.add_paragraph(style::heading("PROFESSIONAL EXPERIENCE", &self.config.h1));
        for entry in &entries {
            docx = docx.add_table(self.section_row(
                &format!("{}, {}", entry.role_title, entry.employer),
                &format!("{}-{}", entry.employment_start, entry.employment_end),
            ));
            for responsibility in &entry.responsibilities {
                docx = docx.add_paragraph(style::bullet(responsibility, &self.config.normal));
            }
            docx = docx.add_paragraph(style::blank(&self.config.normal));
        }

        // education
        let education = &facts.education;
        docx = docx.add_paragraph(style::heading("EDUCATION", &self.config.h1));
        docx = docx.add_table(self.section_row(
            &format!(
                "{} {}, {}",
                education.degree, education.major, education.institution
            ),
            &format!("{}-{}", education.education_start, education.education_end),
        ));
        if let Some(minor) = &education.minor {
            docx = docx.add_paragraph(style::bullet(minor, &self.config.normal));
        }
        docx = docx.add_paragraph(style::blank(&self.config.normal));

        // military experience
        if let Some(military) = &facts.military_experience {
            docx = docx.add_paragraph(style::heading("MILITARY EXPERIENCE", &self.config.h1));
            docx = docx.add_table(self.section_row(
                &format!("{}, {}", military.role_title, military.branch),
                &format!("{}-{}", military.service_start, military.service_end),
            ));
            docx = docx.add_paragraph(style::blank(&self.config.normal));
        }

        // hard skills
        docx = docx.add_paragraph(style::heading("HARD SKILLS", &self.config.h1));
        for skill in &facts.hard_skills {
            docx = docx.add_paragraph(style::bullet(
                &format!("{}: {}", skill.name, skill.detail),
                &self.config.normal,
            ));
        }

        let path = output_path(
            self.output_dir,
            &facts.personal_info,
            name_param,
            "resume",
        );
        style::save(docx, &path)?;

        info!("generated resume written to: {}", path.display());
        Ok(path)
    }

    /// Two-column sub-header: bolded title on the left, date range flush right.
    fn section_row(&self, left: &str, right: &str) -> Table {
        Table::new(vec![TableRow::new(vec![
            TableCell::new()
                .width(LEFT_COL_DXA, WidthType::Dxa)
                .add_paragraph(
                    Paragraph::new()
                        .add_run(style::bold_run(left, &self.config.normal))
                        .align(AlignmentType::Left),
                ),
            TableCell::new()
                .width(RIGHT_COL_DXA, WidthType::Dxa)
                .add_paragraph(
                    Paragraph::new()
                        .add_run(style::bold_run(right, &self.config.normal))
                        .align(AlignmentType::Right),
                ),
        ])])
        .set_grid(vec![LEFT_COL_DXA, RIGHT_COL_DXA])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Education, HardSkill, PersonalInfo};
    use crate::utils::config::ConfigInner;

    fn facts() -> ResumeFacts {
        ResumeFacts {
            personal_info: PersonalInfo {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone_number: "555-0100".to_string(),
                linkedin_url: "linkedin.com/in/janedoe".to_string(),
            },
            professional_experience: vec![],
            education: Education {
                degree: "B.S.".to_string(),
                major: "Computer Science".to_string(),
                minor: Some("Mathematics".to_string()),
                institution: "State University".to_string(),
                education_start: "2012".to_string(),
                education_end: "2016".to_string(),
            },
            military_experience: None,
            hard_skills: vec![HardSkill {
                name: "Languages".to_string(),
                detail: "Python, SQL, Rust".to_string(),
            }],
        }
    }

    fn entries() -> Vec<ExperienceEntry> {
        vec![ExperienceEntry {
            employer: "Initech".to_string(),
            role_title: "Data Engineer".to_string(),
            employment_start: "2019".to_string(),
            employment_end: "2023".to_string(),
            responsibilities: vec!["Built ETL pipelines in Python".to_string()],
        }]
    }

    #[test]
    fn renders_resume_file_to_disk() {
        let dir = std::env::temp_dir().join(format!("resume-render-{}", std::process::id()));
        let config = ConfigInner::default();

        let renderer = ResumeRenderer::new(&config.doc, &dir);
        let path = renderer
            .render(&facts(), &entries(), "quora-data-scientist")
            .unwrap();

        assert!(path.exists());
        assert!(path.ends_with("jane-doe-quora-data-scientist-resume.docx"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rerender_overwrites_existing_file() {
        let dir = std::env::temp_dir().join(format!("resume-overwrite-{}", std::process::id()));
        let config = ConfigInner::default();
        let renderer = ResumeRenderer::new(&config.doc, &dir);

        let first = renderer
            .render(&facts(), &entries(), "quora-data-scientist")
            .unwrap();
        let second = renderer
            .render(&facts(), &entries(), "quora-data-scientist")
            .unwrap();
        assert_eq!(first, second);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_header_image_is_render_error() {
        let dir = std::env::temp_dir().join(format!("resume-noimg-{}", std::process::id()));
        let mut config = ConfigInner::default();
        config.doc.header_image = "/nonexistent/banner.png".to_string();

        let renderer = ResumeRenderer::new(&config.doc, &dir);
        let err = renderer
            .render(&facts(), &entries(), "quora-data-scientist")
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Render(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
