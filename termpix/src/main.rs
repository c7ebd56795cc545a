// ABOUTME: Main entry point for the termpix binary
// ABOUTME: Decodes the input image and hands it to the render pipeline

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use image::DynamicImage;

use termpix::cli::Cli;
use termpix::downloader::ImageDownloader;
use termpix::pipeline;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let config = cli.render_config()?;
    let img = load_input(&cli.input)?.to_rgba8();

    let mut stdout = std::io::stdout().lock();
    pipeline::display_image(&img, &config, &mut stdout)?;
    writeln!(stdout)?;
    Ok(())
}

// Decoding is the image crate's job; remote inputs take a detour through
// a temporary file.
fn load_input(input: &str) -> Result<DynamicImage> {
    if ImageDownloader::is_remote(input) {
        let downloader = ImageDownloader::new()?;
        let file = downloader.download_to_temp(input)?;
        image::open(file.path())
            .with_context(|| format!("failed to decode downloaded image from {input}"))
    } else {
        image::open(input).with_context(|| format!("failed to decode image {input}"))
    }
}
