//! Remote source retrieval.
//!
//! A fetch makes one attempt with the primary method and, only if that
//! fails, exactly one attempt with the fallback method. Both attempts see
//! the normalized URL.

mod http;
mod ytdlp;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use url::Url;

use crate::config::SegcutConfig;
use crate::error::FetchError;
use crate::ui::prelude::{Level, emit};

pub use self::http::HttpDownload;
pub use self::ytdlp::{YtDlp, YtDlpFormat};

/// Produces a local media file for a remote source.
pub trait SourceFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError>;
}

/// One way of retrieving a URL into a local file.
pub trait FetchMethod {
    fn name(&self) -> &str;
    fn retrieve(&self, url: &str, destination: &Path) -> Result<PathBuf>;
}

/// Outcome of the primary attempt, inspected before deciding on the fallback.
enum PrimaryAttempt {
    Retrieved(PathBuf),
    Failed(anyhow::Error),
}

pub struct FallbackFetcher<P, F> {
    primary: P,
    fallback: F,
}

impl<P: FetchMethod, F: FetchMethod> FallbackFetcher<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: FetchMethod, F: FetchMethod> SourceFetcher for FallbackFetcher<P, F> {
    fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError> {
        let clean_url = normalize_url(url)?;
        if clean_url != url {
            emit(
                Level::Debug,
                "segcut.fetch.normalize",
                &format!("Normalized {url} to {clean_url}"),
                None,
            );
        }

        let attempt = match self.primary.retrieve(&clean_url, destination) {
            Ok(path) => PrimaryAttempt::Retrieved(path),
            Err(err) => PrimaryAttempt::Failed(err),
        };

        let primary_err = match attempt {
            PrimaryAttempt::Retrieved(path) => return Ok(path),
            PrimaryAttempt::Failed(err) => err,
        };

        discard_partial_download(destination);

        emit(
            Level::Warn,
            "segcut.fetch.fallback",
            &format!(
                "{} failed ({:#}), falling back to {}...",
                self.primary.name(),
                primary_err,
                self.fallback.name()
            ),
            None,
        );

        self.fallback
            .retrieve(&clean_url, destination)
            .map_err(|fallback_err| FetchError::Exhausted {
                primary: format!("{primary_err:#}"),
                fallback: format!("{fallback_err:#}"),
            })
    }
}

/// A failed attempt may leave a truncated file behind; the next method must
/// not mistake it for a finished download.
fn discard_partial_download(destination: &Path) {
    if destination.exists() && fs::remove_file(destination).is_err() {
        emit(
            Level::Warn,
            "segcut.fetch.cleanup",
            &format!("Could not remove partial download {}", destination.display()),
            None,
        );
    }
}

/// Direct download for plain media links, yt-dlp progressive mp4 otherwise.
pub struct PrimaryMethod {
    http: HttpDownload,
    progressive: YtDlp,
}

impl PrimaryMethod {
    pub fn new(http: HttpDownload, progressive: YtDlp) -> Self {
        Self { http, progressive }
    }
}

impl FetchMethod for PrimaryMethod {
    fn name(&self) -> &str {
        "primary download"
    }

    fn retrieve(&self, url: &str, destination: &Path) -> Result<PathBuf> {
        if HttpDownload::handles(url) {
            self.http.retrieve(url, destination)
        } else {
            self.progressive.retrieve(url, destination)
        }
    }
}

pub type SystemFetcher = FallbackFetcher<PrimaryMethod, YtDlp>;

pub fn system_fetcher(config: &SegcutConfig) -> SystemFetcher {
    FallbackFetcher::new(
        PrimaryMethod::new(
            HttpDownload::default(),
            YtDlp::new(&config.ytdlp_path, YtDlpFormat::ProgressiveMp4),
        ),
        YtDlp::new(&config.ytdlp_path, YtDlpFormat::BestAudio),
    )
}

pub fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Rewrite YouTube short links, shorts and embeds to the canonical watch page.
/// Other URLs are returned unchanged.
pub fn normalize_url(raw: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|err| FetchError::InvalidUrl(format!("{raw}: {err}")))?;

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if host == "youtu.be" || host.ends_with(".youtu.be") {
        if let Some(id) = segments.last() {
            return Ok(watch_url(id));
        }
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v")
            && !id.is_empty()
        {
            return Ok(watch_url(&id));
        }
        if let [kind, id, ..] = segments.as_slice()
            && matches!(*kind, "shorts" | "embed" | "v" | "live")
        {
            return Ok(watch_url(id));
        }
    }

    Ok(raw.to_string())
}

fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedMethod {
        name: &'static str,
        succeed: bool,
        leave_partial: bool,
        calls: RefCell<Vec<String>>,
        found_existing: RefCell<Vec<bool>>,
    }

    impl ScriptedMethod {
        fn new(name: &'static str, succeed: bool) -> Self {
            Self {
                name,
                succeed,
                leave_partial: false,
                calls: RefCell::new(Vec::new()),
                found_existing: RefCell::new(Vec::new()),
            }
        }

        fn leaving_partial(mut self) -> Self {
            self.leave_partial = true;
            self
        }
    }

    impl FetchMethod for &ScriptedMethod {
        fn name(&self) -> &str {
            self.name
        }

        fn retrieve(&self, url: &str, destination: &Path) -> Result<PathBuf> {
            self.calls.borrow_mut().push(url.to_string());
            self.found_existing.borrow_mut().push(destination.exists());
            if self.leave_partial {
                fs::write(destination, b"truncated")?;
            }
            if self.succeed {
                Ok(destination.to_path_buf())
            } else {
                anyhow::bail!("{} refused {}", self.name, url)
            }
        }
    }

    #[test]
    fn normalizes_short_links() {
        assert_eq!(
            normalize_url("https://youtu.be/k4yXQkG2s1E?si=abc").unwrap(),
            "https://www.youtube.com/watch?v=k4yXQkG2s1E"
        );
    }

    #[test]
    fn normalizes_watch_pages_with_extra_parameters() {
        assert_eq!(
            normalize_url("https://www.youtube.com/watch?list=PL1&v=YxWlaYCA8MU&t=30").unwrap(),
            "https://www.youtube.com/watch?v=YxWlaYCA8MU"
        );
    }

    #[test]
    fn normalizes_shorts_and_embeds() {
        assert_eq!(
            normalize_url("https://youtube.com/shorts/abcDEF12345").unwrap(),
            "https://www.youtube.com/watch?v=abcDEF12345"
        );
        assert_eq!(
            normalize_url("https://www.youtube.com/embed/abcDEF12345?start=3").unwrap(),
            "https://www.youtube.com/watch?v=abcDEF12345"
        );
    }

    #[test]
    fn leaves_other_urls_alone() {
        let url = "https://example.com/media/song.mp3";
        assert_eq!(normalize_url(url).unwrap(), url);
    }

    #[test]
    fn v_parameter_only_matters_on_youtube() {
        let url = "https://cdn.example.com/song.mp3?v=3";
        assert_eq!(normalize_url(url).unwrap(), url);
        assert!(HttpDownload::handles(&normalize_url(url).unwrap()));

        assert_eq!(
            normalize_url("https://m.youtube.com/watch?v=YxWlaYCA8MU").unwrap(),
            "https://www.youtube.com/watch?v=YxWlaYCA8MU"
        );
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert!(matches!(
            normalize_url("https://"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn primary_success_skips_fallback() {
        let primary = ScriptedMethod::new("primary", true);
        let fallback = ScriptedMethod::new("fallback", true);
        let fetcher = FallbackFetcher::new(&primary, &fallback);

        let path = fetcher
            .fetch("https://youtu.be/k4yXQkG2s1E", Path::new("/tmp/media_1.mp4"))
            .unwrap();

        assert_eq!(path, PathBuf::from("/tmp/media_1.mp4"));
        assert_eq!(primary.calls.borrow().len(), 1);
        assert!(fallback.calls.borrow().is_empty());
    }

    #[test]
    fn fallback_runs_once_with_normalized_url() {
        let primary = ScriptedMethod::new("primary", false);
        let fallback = ScriptedMethod::new("fallback", true);
        let fetcher = FallbackFetcher::new(&primary, &fallback);

        fetcher
            .fetch("https://youtu.be/k4yXQkG2s1E?si=x", Path::new("/tmp/media_1.mp4"))
            .unwrap();

        let expected = "https://www.youtube.com/watch?v=k4yXQkG2s1E".to_string();
        assert_eq!(*primary.calls.borrow(), vec![expected.clone()]);
        assert_eq!(*fallback.calls.borrow(), vec![expected]);
    }

    #[test]
    fn both_failures_wrap_the_fallback_error() {
        let primary = ScriptedMethod::new("primary", false);
        let fallback = ScriptedMethod::new("fallback", false);
        let fetcher = FallbackFetcher::new(&primary, &fallback);

        let err = fetcher
            .fetch("https://example.com/watch", Path::new("/tmp/media_2.mp4"))
            .unwrap_err();

        match err {
            FetchError::Exhausted { primary: p, fallback: f } => {
                assert!(p.starts_with("primary refused"));
                assert!(f.starts_with("fallback refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fallback.calls.borrow().len(), 1);
    }

    #[test]
    fn fallback_starts_without_the_failed_partial_file() {
        let temp = tempfile::tempdir().unwrap();
        let destination = temp.path().join("media_1.mp4");
        let primary = ScriptedMethod::new("primary", false).leaving_partial();
        let fallback = ScriptedMethod::new("fallback", true);
        let fetcher = FallbackFetcher::new(&primary, &fallback);

        fetcher
            .fetch("https://youtu.be/k4yXQkG2s1E", &destination)
            .unwrap();

        assert_eq!(*fallback.found_existing.borrow(), vec![false]);
    }

    #[test]
    fn recognizes_remote_sources() {
        assert!(is_remote("https://youtu.be/x"));
        assert!(is_remote("HTTP://example.com/a.mp3"));
        assert!(!is_remote("clips/http.mp4"));
        assert!(!is_remote("ftp://example.com/a.mp3"));
    }
}
