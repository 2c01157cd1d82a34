use reqwest::Client;

use crate::config::{NewsSettings, ProviderSettings};
use crate::errors::{AnalysisError, Result};
use crate::models::NewsArticle;
use crate::providers::{api_error, build_client, NewsProvider};

/// Search feed of the public news aggregator.
#[derive(Clone)]
pub struct GoogleNewsProvider {
    client: Client,
    base_url: String,
    max_articles: usize,
}

impl GoogleNewsProvider {
    pub fn new(providers: &ProviderSettings, news: &NewsSettings) -> Result<Self> {
        Ok(GoogleNewsProvider {
            client: build_client(providers)?,
            base_url: providers.google_news_rss_url.clone(),
            max_articles: news.max_articles,
        })
    }

    pub fn feed_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&hl=en-US&gl=US&ceid=US:en",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

impl NewsProvider for GoogleNewsProvider {
    async fn articles(&self, query: &str) -> Result<Vec<NewsArticle>> {
        let feed_url = self.feed_url(query);
        tracing::info!("Fetching news feed for '{}'", query);
        tracing::debug!("URL: {}", feed_url);

        let response = self.client.get(&feed_url).send().await?;
        if !response.status().is_success() {
            return Err(api_error("News feed", response).await);
        }
        let content = response.bytes().await?;

        let articles = parse_feed(&content[..], self.max_articles)?;
        tracing::info!("Collected {} articles for '{}'", articles.len(), query);
        Ok(articles)
    }
}

/// Reads up to `max_articles` entries of an RSS/Atom document.
pub fn parse_feed(content: &[u8], max_articles: usize) -> Result<Vec<NewsArticle>> {
    let feed = feed_rs::parser::parse(content)
        .map_err(|e| AnalysisError::InvalidDataFormat(format!("RSS parse error: {}", e)))?;

    Ok(feed
        .entries
        .iter()
        .take(max_articles)
        .map(|entry| {
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_default();

            let description = entry
                .summary
                .as_ref()
                .map(|text| text.content.clone())
                .or_else(|| entry.content.as_ref().and_then(|content| content.body.clone()))
                .unwrap_or_default();

            NewsArticle {
                title,
                description,
                published: entry.published.or(entry.updated),
                url: entry.links.first().map(|link| link.href.clone()),
            }
        })
        .collect())
}
