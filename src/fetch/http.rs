use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use url::Url;

use super::FetchMethod;

const DIRECT_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "aac", "m4a", "flac", "ogg", "mp4", "mkv", "mov", "avi", "webm",
];

/// Plain HTTP GET for links that point straight at a media file. The body is
/// streamed to disk; no total timeout applies unless one is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpDownload {
    timeout: Option<Duration>,
}

impl HttpDownload {
    pub fn handles(url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        Path::new(parsed.path())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                DIRECT_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }

    fn client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(format!("segcut/{}", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()
            .context("Failed to create HTTP client")
    }
}

impl FetchMethod for HttpDownload {
    fn name(&self) -> &str {
        "direct download"
    }

    fn retrieve(&self, url: &str, destination: &Path) -> Result<PathBuf> {
        let mut response = self
            .client()?
            .get(url)
            .send()
            .with_context(|| format!("Failed to request {url}"))?;
        if !response.status().is_success() {
            bail!("{url} answered with HTTP {}", response.status());
        }

        let mut file = File::create(destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        let written = response.copy_to(&mut file);
        drop(file);

        match written {
            Ok(0) => {
                let _ = fs::remove_file(destination);
                bail!("{url} returned an empty body")
            }
            Ok(_) => Ok(destination.to_path_buf()),
            Err(err) => {
                let _ = fs::remove_file(destination);
                Err(err).with_context(|| format!("Failed to download {url}"))
            }
        }
    }
}
