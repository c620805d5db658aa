use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::forum::html;
use crate::models::Post;

/// Client reading all posts of a forum thread
pub struct ForumClient {
    client: Client,
}

impl ForumClient {
    /// Create a new forum client
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch every page of the thread and return its posts in thread order
    pub async fn fetch_posts(&self, thread_url: &str) -> Result<Vec<Post>> {
        let base = Url::parse(thread_url).context("Invalid thread URL")?;

        info!("Reading pages of {}...", base);
        let first_page = self.fetch_page(&base).await?;

        let page_urls: Vec<Url> = html::page_links(&first_page)
            .iter()
            .filter_map(|href| match base.join(href) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Skipping page link {}: {}", href, e);
                    None
                }
            })
            .collect();

        info!("{} pages found", page_urls.len().max(1));

        let mut posts = Vec::new();

        if page_urls.is_empty() {
            posts.extend(self.page_posts(&base, &first_page));
        }

        for url in &page_urls {
            let page = if *url == base {
                first_page.clone()
            } else {
                self.fetch_page(url).await?
            };
            posts.extend(self.page_posts(url, &page));
        }

        info!("{} posts found", posts.len());
        Ok(posts)
    }

    async fn fetch_page(&self, url: &Url) -> Result<String> {
        debug!("Fetching page: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Forum error: {} for {}", status, url);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }

    /// Posts of one page with absolute permalinks
    fn page_posts(&self, page_url: &Url, page: &str) -> Vec<Post> {
        html::extract_posts(page)
            .into_iter()
            .map(|raw| {
                let source_id = page_url
                    .join(&raw.href)
                    .map(|u| u.to_string())
                    .unwrap_or(raw.href);
                debug!("Found post: {} by {}", source_id, raw.author);
                Post::new(source_id, raw.author, raw.body)
            })
            .collect()
    }
}
