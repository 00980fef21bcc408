use std::sync::LazyLock;

use log::info;
use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{Error, Result};
use crate::models::job::{JobDescription, derive_name_param};
use crate::scraper::http::Fetcher;
use crate::utils::config::ScrapeConfig;

static COMPANY_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.topcard__org-name-link").unwrap());
static COMPANY_LINK_ALT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.sub-nav-cta__optional-url").unwrap());
static ROLE_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.top-card-layout__title").unwrap());
static ROLE_TITLE_ALT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.topcard__title").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.description__text").unwrap());

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());

/// Scrapes a normalized [`JobDescription`] out of a LinkedIn job posting.
///
/// LinkedIn is highly resistant to scraping; repeated use over short periods
/// will likely get the client blocked. The fetch layer's jittered delays and
/// rotated user agents only soften that.
pub struct LinkedinScraper {
    url: String,
    fetcher: Fetcher,
}

impl LinkedinScraper {
    pub fn new(url: &str, config: ScrapeConfig) -> Self {
        Self {
            url: clean_job_url(url),
            fetcher: Fetcher::new(config),
        }
    }

    pub async fn scrape(&self) -> Result<JobDescription> {
        info!("scraping linkedin job posting: {}", self.url);

        let html = self.fetcher.fetch(&self.url).await?;
        let document = Html::parse_document(&html);

        let company_name = extract_company_name(&document)?;
        let role_title = extract_role_title(&document)?;
        let name_param = derive_name_param(&company_name, &role_title)?;
        let role_description = extract_role_description(&document)?;

        info!("linkedin scrape complete: {name_param}");

        Ok(JobDescription {
            company_name,
            role_title,
            name_param,
            role_description,
            key_skills: Vec::new(),
            company_sectors: Vec::new(),
        })
    }
}

/// Reduces a shared LinkedIn URL to the minimal `/jobs/view/{id}` form,
/// dropping tracking parameters.
pub fn clean_job_url(full_url: &str) -> String {
    let without_query = full_url.split('?').next().unwrap_or(full_url);
    let job_id = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query);

    format!("https://www.linkedin.com/jobs/view/{job_id}")
}

fn extract_company_name(document: &Html) -> Result<String> {
    let element = document
        .select(&COMPANY_LINK)
        .next()
        .or_else(|| document.select(&COMPANY_LINK_ALT).next())
        .ok_or_else(|| Error::Extraction("linkedin company name not found".to_string()))?;

    Ok(element.text().collect::<String>().trim().to_string())
}

fn extract_role_title(document: &Html) -> Result<String> {
    let element = document
        .select(&ROLE_TITLE)
        .next()
        .or_else(|| document.select(&ROLE_TITLE_ALT).next())
        .ok_or_else(|| Error::Extraction("linkedin role title not found".to_string()))?;

    Ok(element.text().collect::<String>().trim().to_string())
}

fn extract_role_description(document: &Html) -> Result<String> {
    let element = document
        .select(&DESCRIPTION)
        .next()
        .ok_or_else(|| Error::Extraction("linkedin description section not found".to_string()))?;

    let text = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let collapsed = BLANK_LINES.replace_all(&text, "\n\n");
    Ok(collapsed.trim().to_string())
}
