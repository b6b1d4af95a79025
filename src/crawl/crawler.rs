//! Sequential crawl over chart pages
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::cases::AccidentCase;
use crate::cli::config::CrawlConfig;
use crate::crawl::parser::{case_code, case_url, CaseSelectors, PageFetch};

/// Source of chart page bodies
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageFetch>;
}

/// Fetcher backed by reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("Failed to build crawl HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<PageFetch> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?
            .text()
            .await
            .with_context(|| format!("Failed to read body: {}", url))?;
        Ok(PageFetch::from_body(body))
    }
}

/// Totals for a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub cases: Vec<AccidentCase>,
    pub pages_fetched: usize,
    pub skipped: usize,
}

/// Walks chart pages `first_page..=last_page`, each until its sub-pages run out
pub struct CaseCrawler<F: PageFetcher = HttpFetcher> {
    config: CrawlConfig,
    fetcher: F,
    selectors: CaseSelectors,
}

impl CaseCrawler<HttpFetcher> {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: PageFetcher> CaseCrawler<F> {
    pub fn with_fetcher(config: CrawlConfig, fetcher: F) -> Result<Self> {
        Ok(Self {
            config,
            fetcher,
            selectors: CaseSelectors::new()?,
        })
    }

    /// Crawl every sub-page of one chart page
    pub async fn crawl_page(&self, page: u32, report: &mut CrawlReport) -> Result<()> {
        for sub_page in 1..=self.config.max_sub_pages {
            let code = case_code(page, sub_page);
            let url = case_url(&self.config.base_url, self.config.chart_type, &code);
            tracing::debug!(url = %url, "Fetching chart page");

            let fetched = self.fetcher.fetch(&url).await?;
            report.pages_fetched += 1;

            match fetched {
                PageFetch::NotFound => {
                    tracing::debug!(page, last_sub_page = sub_page - 1, "Chart page exhausted");
                    return Ok(());
                }
                PageFetch::Found(html) => match self.selectors.parse_case(&code, &url, &html) {
                    Some(case) => report.cases.push(case),
                    None => {
                        report.skipped += 1;
                        tracing::warn!(code = %code, "Skipping page with missing fields");
                    }
                },
            }

            if self.config.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
            }
        }

        tracing::warn!(
            page,
            max_sub_pages = self.config.max_sub_pages,
            "Sub-page limit reached"
        );
        Ok(())
    }

    /// Crawl all configured pages; `on_page` sees each finished page and the running case count
    pub async fn crawl_all<P>(&self, mut on_page: P) -> Result<CrawlReport>
    where
        P: FnMut(u32, usize),
    {
        let mut report = CrawlReport::default();

        for page in self.config.first_page..=self.config.last_page {
            self.crawl_page(page, &mut report)
                .await
                .with_context(|| format!("Crawl aborted on page {}", page))?;
            on_page(page, report.cases.len());
        }

        tracing::info!(
            cases = report.cases.len(),
            skipped = report.skipped,
            fetched = report.pages_fetched,
            "Crawl finished"
        );
        Ok(report)
    }
}
