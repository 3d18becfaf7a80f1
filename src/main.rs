use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info};
use sakuga_dl::{
    batch,
    cli::{Cli, Command},
    config::Cfg,
    scrape::Scraper,
};
use std::{path::PathBuf, process};

#[tokio::main]
async fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("Application error: {:#}", e);
        process::exit(1);
    }

    Ok(())
}

async fn run() -> Result<()> {
    let argv = Cli::parse();
    let cfg = Cfg::get().unwrap_or_default();

    match argv.command {
        Command::Scrape {
            start,
            end,
            root_dir,
        } => {
            let root_dir = root_dir.unwrap_or_else(|| {
                PathBuf::from(cfg.download_dir.as_deref().unwrap_or("downloads"))
            });

            info!(
                "Starting {} v{}: scraping posts {}..{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                start,
                end
            );

            let scraper = Scraper::new(&cfg, root_dir)?;
            let post_ids: Vec<u64> = (start..end).collect();
            scraper.scrape_posts(&post_ids).await;
        }
        Command::Enumerate {
            root_dir,
            batch_size,
            output_dir,
        } => {
            batch::enumerate_jsons(&root_dir, batch_size, output_dir.as_deref())?;
        }
    }

    Ok(())
}
