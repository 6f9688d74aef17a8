pub mod doctor;
pub mod ingest;
pub mod search;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

const MODEL_REPO: &str = "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Download the ONNX embedding model and tokenizer to the cache directory.
/// Files already present are left untouched.
pub async fn model_download(config: &crate::config::EmbeddingConfig) -> Result<()> {
    let cache_dir = crate::config::expand_tilde(&config.cache_dir);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;

    let files = [
        ("onnx/model.onnx", "model.onnx", "~90MB"),
        ("tokenizer.json", "tokenizer.json", "~700KB"),
    ];

    for (remote, local, size_hint) in files {
        let dest = cache_dir.join(local);
        if dest.exists() {
            println!("{local} already exists at {}", dest.display());
            continue;
        }
        println!("Downloading {local} ({size_hint})...");
        download_file(&format!("{MODEL_REPO}/{remote}"), &dest).await?;
        println!("Saved to {}", dest.display());
    }

    println!("Model download complete. Ready for use.");
    Ok(())
}

/// Fetch one file with a progress bar, writing atomically (tmp + rename).
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;
    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    let bytes = response.bytes().await.context("error reading response")?;
    pb.inc(bytes.len() as u64);
    file.write_all(&bytes).await.context("error writing to file")?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
