//! The per-post pipeline: fetch, extract, download, persist.
use crate::{client::SakugaClient, config::Cfg, error::Result, extract::extract_metadata};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use scraper::Html;
use std::path::PathBuf;
use tokio::fs;
use url::Url;

/// Fallback image extension when a post has no usable image URL.
const DEFAULT_EXT: &str = "jpg";

/// Drives the whole per-post flow and owns the output tree.
pub struct Scraper {
    client: SakugaClient,
    root_dir: PathBuf,
    prefix: String,
}

impl Scraper {
    /// Creates the scraper and its root output directory. Failing to create
    /// the root directory is fatal; everything downstream is per-post.
    pub fn new(cfg: &Cfg, root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        std::fs::create_dir_all(&root_dir)?;

        Ok(Self {
            client: SakugaClient::new(cfg)?,
            root_dir,
            prefix: cfg
                .file_prefix
                .clone()
                .unwrap_or_else(|| "sankaku".to_string()),
        })
    }

    /// Scrape a single post: page, metadata, image, JSON on disk.
    pub async fn scrape_post(&self, post_id: u64) -> Result<()> {
        let url = self.client.post_url(post_id);
        let (body, final_url) = self.client.fetch_page(&url).await?;

        // Html is not Send; parse and extract before the next await point.
        let metadata = {
            let doc = Html::parse_document(&body);
            extract_metadata(&doc, post_id, &final_url)?
        };

        let post_dir = self.root_dir.join(format!("post_{post_id}"));
        fs::create_dir_all(&post_dir).await?;

        let ext = metadata
            .image_url
            .as_deref()
            .map(image_extension)
            .unwrap_or_else(|| DEFAULT_EXT.to_string());
        let image_path = post_dir.join(format!("{}_{post_id}.{ext}", self.prefix));
        let metadata_path = post_dir.join(format!("{}_{post_id}.json", self.prefix));

        if let Some(image_url) = &metadata.image_url {
            self.client.download(image_url, &image_path).await?;
        }

        fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?).await?;

        Ok(())
    }

    /// Scrape a list of posts sequentially.
    ///
    /// A failing post is logged with its ID and never stops the run; output
    /// already written for it stays on disk.
    pub async fn scrape_posts(&self, post_ids: &[u64]) {
        let pb = ProgressBar::new(post_ids.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
        );

        for &post_id in post_ids {
            pb.set_message(format!("post {post_id}"));
            if let Err(e) = self.scrape_post(post_id).await {
                error!("Failed to scrape post {}: {}", post_id, e);
            }
            pb.inc(1);
        }

        pb.finish_with_message("all posts processed");
        info!("Finished scraping {} posts", post_ids.len());
    }
}

/// File extension of the image URL's last path segment, `jpg` when the URL
/// has no usable suffix.
fn image_extension(image_url: &str) -> String {
    Url::parse(image_url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back())
                .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_string()))
        })
        .unwrap_or_else(|| DEFAULT_EXT.to_string())
}
