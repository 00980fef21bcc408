use std::path::Path;

use docx_rs::{
    AbstractNumbering, AlignmentType, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat,
    Numbering, NumberingId, PageMargin, Paragraph, Pic, Run, RunFonts, Start,
};

use crate::error::{Error, Result};
use crate::models::profile::PersonalInfo;
use crate::utils::config::{DocConfig, FontSpec};

const BULLET_NUMBERING: usize = 1;
const TWIPS_PER_INCH: i32 = 1440;

/// One-inch margins on all sides plus the bullet-list numbering definition
/// shared by every section.
pub fn base_document() -> Docx {
    Docx::new()
        .page_margin(
            PageMargin::new()
                .top(TWIPS_PER_INCH)
                .bottom(TWIPS_PER_INCH)
                .left(TWIPS_PER_INCH)
                .right(TWIPS_PER_INCH),
        )
        .add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING).add_level(Level::new(
            0,
            Start::new(1),
            NumberFormat::new("bullet"),
            LevelText::new("•"),
            LevelJc::new("left"),
        )))
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
}

pub fn run(text: &str, spec: &FontSpec) -> Run {
    Run::new()
        .add_text(text)
        .size(spec.size_pt * 2)
        .color(spec.color.as_str())
        .fonts(RunFonts::new().ascii(&spec.font))
}

pub fn bold_run(text: &str, spec: &FontSpec) -> Run {
    run(text, spec).bold()
}

pub fn line(text: &str, spec: &FontSpec) -> Paragraph {
    Paragraph::new().add_run(run(text, spec))
}

/// Section header rendered in the h1 font, uppercased by the caller.
pub fn heading(text: &str, spec: &FontSpec) -> Paragraph {
    Paragraph::new().add_run(bold_run(text, spec))
}

pub fn bullet(text: &str, spec: &FontSpec) -> Paragraph {
    Paragraph::new()
        .add_run(run(text, spec))
        .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0))
}

pub fn blank(spec: &FontSpec) -> Paragraph {
    line("", spec)
}

/// Document header: the configured banner image when one is set, otherwise
/// the candidate's name and contact line.
pub fn add_header(
    mut docx: Docx,
    header: &PersonalInfo,
    config: &DocConfig,
    centered: bool,
) -> Result<Docx> {
    if !config.header_image.trim().is_empty() {
        let path = Path::new(&config.header_image);
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Render(format!("header image {}: {e}", path.display())))?;
        // 6.5in x 1in in EMU
        let pic = Pic::new(&bytes).size(5_943_600, 914_400);
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));
        return Ok(docx);
    }

    let name = format!(
        "{} {}",
        header.first_name.to_uppercase(),
        header.last_name.to_uppercase()
    );
    let contact = format!(
        "{}   |   {}   |   {}",
        header.email, header.linkedin_url, header.phone_number
    );

    let mut name_paragraph = Paragraph::new().add_run(bold_run(&name, &config.h1));
    let mut contact_paragraph = line(&contact, &config.normal);
    if centered {
        name_paragraph = name_paragraph.align(AlignmentType::Center);
        contact_paragraph = contact_paragraph.align(AlignmentType::Center);
    }

    Ok(docx.add_paragraph(name_paragraph).add_paragraph(contact_paragraph))
}

pub fn save(docx: Docx, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    docx.build()
        .pack(file)
        .map_err(|e| Error::Render(format!("{}: {e}", path.display())))?;
    Ok(())
}
