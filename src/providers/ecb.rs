use crate::core::error::{Error, Result};
use crate::core::rate::{Quote, validate_rate};
use crate::core::source::RateSource;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

// The ECB site rejects requests that do not look like they come from a browser.
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:78.0) Gecko/20100101 Firefox/78.0";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Reads the euro foreign exchange reference rates page published by the ECB.
pub struct EcbSource {
    url: String,
}

impl EcbSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    fn fetch_error(&self, reason: impl ToString) -> Error {
        Error::Fetch {
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }

    async fn fetch_page(&self) -> Result<String> {
        debug!("Requesting rates page from {}", self.url);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| self.fetch_error(e))?;
        let response = client
            .get(&self.url)
            .header(ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .map_err(|e| self.fetch_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.fetch_error(format!("HTTP error: {status}")));
        }

        response.text().await.map_err(|e| self.fetch_error(e))
    }
}

#[async_trait]
impl RateSource for EcbSource {
    async fn fetch_rates(&self) -> Result<Vec<Quote>> {
        let page = self.fetch_page().await?;
        let quotes = parse_rates_page(&page)?;
        debug!("Parsed {} rates from {}", quotes.len(), self.url);
        Ok(quotes)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("selector '{css}': {e}")))
}

fn cell_text(row: &ElementRef, cell: &Selector) -> Option<String> {
    row.select(cell)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Extracts (currency, rate) pairs from every `table.forextable` body row.
///
/// Rows without a currency cell or a usable rate are skipped. A page with no
/// rates table at all is a parse error.
pub fn parse_rates_page(html: &str) -> Result<Vec<Quote>> {
    let table_selector = selector("table.forextable")?;
    let row_selector = selector("tbody > tr")?;
    let currency_selector = selector("td.currency")?;
    let rate_selector = selector("span.rate")?;

    let document = Html::parse_document(html);
    let tables: Vec<_> = document.select(&table_selector).collect();
    if tables.is_empty() {
        return Err(Error::Parse(
            "rates page: no table.forextable found".to_string(),
        ));
    }

    let mut quotes = Vec::new();
    for table in tables {
        for row in table.select(&row_selector) {
            let currency = cell_text(&row, &currency_selector);
            let rate = cell_text(&row, &rate_selector);
            match (currency, rate) {
                (Some(currency), Some(rate)) => match validate_rate(&rate) {
                    Ok(rate) => quotes.push(Quote {
                        currency,
                        rate: rate.to_string(),
                    }),
                    Err(e) => warn!(currency = %currency, error = %e, "Skipping row with invalid rate"),
                },
                _ => warn!(row = %row.html(), "Skipping malformed rates row"),
            }
        }
    }
    Ok(quotes)
}
