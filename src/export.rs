//! Plain-text export of the sites list.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::storage::sites::{local_timestamp, SiteRecord};

const HEADER: &str = "=== НАЙДЕННЫЕ САЙТЫ С РАССЫЛКАМИ ===";
const RULE_WIDTH: usize = 60;

/// Render `sites` as a numbered text listing. `exported_at` goes in the header.
pub fn render(sites: &[SiteRecord], exported_at: &str) -> Result<String> {
    if sites.is_empty() {
        return Err(Error::Invalid("nothing to export, the list is empty".to_string()));
    }

    let mut text = format!("{}\n\n", HEADER);
    text.push_str(&format!("Всего найдено: {}\n", sites.len()));
    text.push_str(&format!("Дата экспорта: {}\n\n", exported_at));
    text.push_str(&"─".repeat(RULE_WIDTH));
    text.push_str("\n\n");

    for (i, site) in sites.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, site.title));
        text.push_str(&format!("   URL: {}\n", site.url));
        text.push_str(&format!("   Домен: {}\n", site.display_hostname()));
        text.push_str(&format!("   Найден: {}\n\n", site.discovered_at));
    }

    Ok(text)
}

/// `newsletter_sites_YYYY-MM-DD.txt`
pub fn filename(date: NaiveDate) -> String {
    format!("newsletter_sites_{}.txt", date.format("%Y-%m-%d"))
}

/// Write the export for today into `dir` and return the file path.
pub fn export_to_dir(sites: &[SiteRecord], dir: &Path) -> Result<PathBuf> {
    let text = render(sites, &local_timestamp())?;
    let path = dir.join(filename(Utc::now().date_naive()));

    std::fs::write(&path, text)?;
    tracing::info!("Exported {} sites to {}", sites.len(), path.display());

    Ok(path)
}
