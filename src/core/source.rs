use crate::core::config::DomConfig;
use crate::dom::html::HtmlSnapshotBuilder;
use crate::dom::raw::RawSnapshot;
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
}

/// The one capability the core needs from a driver: hand over the current page as a payload.
///
/// Implementations may block or wait on the page; the payload they return is ingested
/// synchronously afterwards.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn raw_snapshot(&self) -> Result<RawSnapshot>;

    async fn page_info(&self) -> Result<PageInfo>;
}

/// Serves a fixed HTML document through the static extractor.
pub struct HtmlSnapshotSource {
    html: String,
    page: PageInfo,
    builder: HtmlSnapshotBuilder,
}

impl HtmlSnapshotSource {
    pub fn new(url: impl Into<String>, html: impl Into<String>, config: DomConfig) -> Self {
        let html = html.into();
        let title = extract_title(&html).unwrap_or_default();
        Self {
            html,
            page: PageInfo {
                url: url.into(),
                title,
            },
            builder: HtmlSnapshotBuilder::new(config),
        }
    }
}

#[async_trait]
impl SnapshotSource for HtmlSnapshotSource {
    async fn raw_snapshot(&self) -> Result<RawSnapshot> {
        self.builder.build(&self.html)
    }

    async fn page_info(&self) -> Result<PageInfo> {
        Ok(self.page.clone())
    }
}

fn extract_title(html: &str) -> Option<String> {
    let document = scraper::Html::parse_document(html);
    let selector = scraper::Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
}
