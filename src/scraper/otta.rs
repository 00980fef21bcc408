use std::sync::LazyLock;

use log::info;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::models::job::{JobDescription, derive_name_param};
use crate::scraper::http::Fetcher;
use crate::utils::config::ScrapeConfig;

static TITLE_SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.bkeQyr h1.kSSTOp").unwrap());
static COMPANY_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.kQkLtz").unwrap());
static SECTION_HEADER: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());
static SKILLS_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.ddpLEU").unwrap());
static SKILLS_CONTAINER_ALT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.sc-312c7ec1-0").unwrap());
static SKILL_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.isAlRM").unwrap());
static SECTOR_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.sc-791f8a83-1").unwrap());
static SECTOR_TAG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.sc-791f8a83-2").unwrap());

static CAMEL_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new("([a-z])([A-Z])").unwrap());

/// Scrapes a normalized [`JobDescription`] out of an Otta job posting page.
/// Selectors are hard-coded to the current site markup and fail loudly when
/// the layout changes.
pub struct OttaScraper {
    url: String,
    fetcher: Fetcher,
}

impl OttaScraper {
    pub fn new(url: &str, config: ScrapeConfig) -> Self {
        Self {
            url: url.to_string(),
            fetcher: Fetcher::new(config),
        }
    }

    pub async fn scrape(&self) -> Result<JobDescription> {
        info!("scraping otta job posting: {}", self.url);

        let html = self.fetcher.fetch(&self.url).await?;
        let document = Html::parse_document(&html);

        let (company_name, role_title) = extract_title_and_company(&document)?;
        let name_param = derive_name_param(&company_name, &role_title)?;
        let role_description = extract_role_description(&document)?;
        let key_skills = extract_key_skills(&document)?;
        let company_sectors = extract_company_sectors(&document)?;

        info!("otta scrape complete: {name_param}");

        Ok(JobDescription {
            company_name,
            role_title,
            name_param,
            role_description,
            key_skills,
            company_sectors,
        })
    }
}

/// The posting title is one h1 of the form "Role Title, Company"; the company
/// name is the nested anchor, the role is what remains after removing it.
fn extract_title_and_company(document: &Html) -> Result<(String, String)> {
    let h1 = document
        .select(&TITLE_SECTION)
        .next()
        .ok_or_else(|| Error::Extraction("otta title section not found".to_string()))?;

    let company = h1
        .select(&COMPANY_LINK)
        .next()
        .ok_or_else(|| Error::Extraction("otta company link not found".to_string()))?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    let full = h1.text().collect::<String>();
    let role = full.replace(&company, "").replace(',', "").trim().to_string();

    if role.is_empty() {
        return Err(Error::Extraction("otta role title is empty".to_string()));
    }

    Ok((company, role))
}

/// Finds the `h2` reading "Role" and takes its following sibling div. The raw
/// text is then re-broken into lines at the known section labels and at
/// lowercase/uppercase boundaries the markup collapsed away.
fn extract_role_description(document: &Html) -> Result<String> {
    let header = document
        .select(&SECTION_HEADER)
        .find(|h2| h2.text().collect::<String>().trim() == "Role")
        .ok_or_else(|| Error::Extraction("otta 'Role' section not found".to_string()))?;

    let content = header
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div")
        .ok_or_else(|| Error::Extraction("otta role description body not found".to_string()))?;

    let raw = content
        .text()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("");

    let formatted = raw
        .replace("Who you are", "\nWho you are\n")
        .replace("What the job involves", "\n\nWhat the job involves\n");
    let formatted = CAMEL_BOUNDARY.replace_all(&formatted, "$1\n$2");

    Ok(formatted.trim().to_string())
}

fn extract_key_skills(document: &Html) -> Result<Vec<String>> {
    let container = document
        .select(&SKILLS_CONTAINER)
        .next()
        .or_else(|| document.select(&SKILLS_CONTAINER_ALT).next())
        .ok_or_else(|| Error::Extraction("otta skills container not found".to_string()))?;

    let skills: Vec<String> = container
        .select(&SKILL_ITEM)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    Ok(skills)
}

fn extract_company_sectors(document: &Html) -> Result<Vec<String>> {
    let container = document
        .select(&SECTOR_CONTAINER)
        .next()
        .ok_or_else(|| Error::Extraction("otta sector container not found".to_string()))?;

    Ok(container
        .select(&SECTOR_TAG)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
