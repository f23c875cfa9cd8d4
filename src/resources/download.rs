//! Downloaded resources: fetch an archive, verify it, unpack it, delete it.
//!
//! HTTP goes through the [`Downloader`] trait so that tests can serve
//! archives from memory without network access.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use super::digest::{Algorithm, digests_match};
use super::{Applicable, ResourceChange};
use crate::config::requirements::DownloadEntry;
use crate::error::FetchError;
use crate::exec::{Executor, path_arg};

/// Time allowed for establishing a connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed for a whole download, body included.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors arising from a single HTTP download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered 404.
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for downloading a URL to a file.
#[cfg_attr(test, mockall::automock)]
pub trait Downloader: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        let bytes = std::io::copy(&mut response.into_body().as_reader(), &mut file)?;
        Ok(bytes)
    }
}

/// Shared `ureq` agent with timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// File name of the archive behind `url`: the last path segment, with the
/// query and fragment removed.
///
/// Returns `None` when the URL has no path or ends in `/`.
#[must_use]
pub fn archive_name(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let after_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    let (_host, path) = after_scheme.split_once('/')?;
    let name = path.rsplit('/').next()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name)
}

/// An archive downloaded into a fresh directory and unpacked there.
pub struct DownloadResource<'a> {
    /// Resource entry from the requirements.
    pub entry: DownloadEntry,
    /// Directory receiving the archive content; must not exist yet.
    pub destination: PathBuf,
    executor: &'a dyn Executor,
    downloader: &'a dyn Downloader,
}

impl std::fmt::Debug for DownloadResource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadResource")
            .field("entry", &self.entry)
            .field("destination", &self.destination)
            .field("executor", &self.executor)
            .field("downloader", &"<dyn Downloader>")
            .finish()
    }
}

impl<'a> DownloadResource<'a> {
    /// Create a new download resource.
    #[must_use]
    pub const fn new(
        entry: DownloadEntry,
        destination: PathBuf,
        executor: &'a dyn Executor,
        downloader: &'a dyn Downloader,
    ) -> Self {
        Self {
            entry,
            destination,
            executor,
            downloader,
        }
    }

    fn verify(&self, archive: &Path) -> Result<(), FetchError> {
        let checks = [
            (Algorithm::Md5, self.entry.md5.as_deref()),
            (Algorithm::Sha256, self.entry.sha256.as_deref()),
        ];
        for (algorithm, expected) in checks {
            let Some(expected) = expected else {
                continue;
            };
            let actual = algorithm
                .file_digest(archive)
                .map_err(|e| FetchError::Download {
                    name: self.entry.name.clone(),
                    url: self.entry.url.clone(),
                    reason: format!("reading {}: {e}", archive.display()),
                })?;
            if !digests_match(expected, &actual) {
                return Err(FetchError::DigestMismatch {
                    name: self.entry.name.clone(),
                    algorithm: algorithm.name(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(())
    }

    fn extract(&self, archive: &Path) -> Result<(), FetchError> {
        self.executor
            .run(
                "tar",
                &[
                    "-xvf",
                    &path_arg(archive),
                    "-C",
                    &path_arg(&self.destination),
                ],
            )
            .map_err(|e| FetchError::Extract {
                name: self.entry.name.clone(),
                archive: archive.to_path_buf(),
                message: format!("{e:#}"),
            })?;
        Ok(())
    }
}

impl Applicable for DownloadResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.entry.name, self.entry.url)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let entry = &self.entry;
        if self.destination.symlink_metadata().is_ok() {
            return Err(FetchError::DestinationExists {
                name: entry.name.clone(),
                path: self.destination.clone(),
            }
            .into());
        }
        let file_name = archive_name(&entry.url).ok_or_else(|| FetchError::InvalidUrl {
            name: entry.name.clone(),
            url: entry.url.clone(),
        })?;

        crate::fs::ensure_dir(&self.destination)?;
        let archive = self.destination.join(file_name);
        self.downloader
            .download(&entry.url, &archive)
            .map_err(|e| FetchError::Download {
                name: entry.name.clone(),
                url: entry.url.clone(),
                reason: e.to_string(),
            })?;

        self.verify(&archive)?;
        self.extract(&archive)?;
        std::fs::remove_file(&archive)
            .with_context(|| format!("removing archive {}", archive.display()))?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    const SHA_HELLO: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const MD5_HELLO: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

    fn entry(md5: Option<&str>, sha256: Option<&str>) -> DownloadEntry {
        DownloadEntry {
            name: "zlib".to_string(),
            url: "https://example.com/files/zlib.tar.gz?raw=1".to_string(),
            md5: md5.map(String::from),
            sha256: sha256.map(String::from),
        }
    }

    /// A downloader that writes `hello world` to the destination.
    fn serving_hello() -> MockDownloader {
        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .times(1)
            .returning(|_, dest| {
                std::fs::write(dest, b"hello world")?;
                Ok(11)
            });
        downloader
    }

    // ------------------------------------------------------------------
    // archive_name
    // ------------------------------------------------------------------

    #[test]
    fn archive_name_strips_query_and_fragment() {
        assert_eq!(
            archive_name("https://example.com/a/b/zlib-1.3.tar.gz?download=1#top"),
            Some("zlib-1.3.tar.gz")
        );
        assert_eq!(archive_name("https://example.com/x.zip"), Some("x.zip"));
    }

    #[test]
    fn archive_name_rejects_urls_without_file() {
        assert_eq!(archive_name("https://example.com"), None);
        assert_eq!(archive_name("https://example.com/dir/"), None);
        assert_eq!(archive_name("https://example.com/.."), None);
    }

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/a.tar.gz", &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(500);
        let mapped = map_ureq_error("https://example.test/a.tar.gz", &err);
        assert!(matches!(mapped, DownloadError::HttpError { .. }));
    }

    // ------------------------------------------------------------------
    // apply
    // ------------------------------------------------------------------

    #[test]
    fn verified_archive_is_extracted_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("extern").join("zlib");
        let executor = MockExecutor::succeeding(1);
        let downloader = serving_hello();
        let resource = DownloadResource::new(
            entry(Some(MD5_HELLO), Some(SHA_HELLO)),
            dest.clone(),
            &executor,
            &downloader,
        );

        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);

        let archive = dest.join("zlib.tar.gz");
        assert_eq!(
            executor.calls(),
            [format!("tar -xvf {} -C {}", archive.display(), dest.display())]
        );
        assert!(!archive.exists(), "archive is removed after extraction");
        assert!(dest.is_dir());
    }

    #[test]
    fn upper_case_digest_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let executor = MockExecutor::succeeding(1);
        let downloader = serving_hello();
        let resource = DownloadResource::new(
            entry(None, Some(&SHA_HELLO.to_uppercase())),
            dir.path().join("zlib"),
            &executor,
            &downloader,
        );
        resource.apply().unwrap();
    }

    #[test]
    fn sha256_mismatch_prevents_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("zlib");
        let executor = MockExecutor::succeeding(1);
        let downloader = serving_hello();
        let wrong = "0".repeat(64);
        let resource = DownloadResource::new(entry(None, Some(&wrong)), dest.clone(), &executor, &downloader);

        let err = resource.apply().unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<FetchError>(),
                Some(FetchError::DigestMismatch { algorithm: "SHA256", .. })
            ),
            "unexpected error: {err}"
        );
        assert_eq!(executor.call_count(), 0, "no extraction after a mismatch");
        assert!(dest.join("zlib.tar.gz").exists(), "archive left for inspection");
    }

    #[test]
    fn md5_is_checked_before_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let executor = MockExecutor::succeeding(1);
        let downloader = serving_hello();
        let wrong_md5 = "f".repeat(32);
        let wrong_sha = "0".repeat(64);
        let resource = DownloadResource::new(
            entry(Some(&wrong_md5), Some(&wrong_sha)),
            dir.path().join("zlib"),
            &executor,
            &downloader,
        );

        let err = resource.apply().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::DigestMismatch { algorithm: "MD5", .. })
        ));
    }

    #[test]
    fn existing_destination_is_rejected_before_download() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("zlib");
        std::fs::create_dir(&dest).unwrap();
        let executor = MockExecutor::succeeding(1);
        let mut downloader = MockDownloader::new();
        downloader.expect_download().times(0);
        let resource = DownloadResource::new(entry(None, None), dest, &executor, &downloader);

        let err = resource.apply().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::DestinationExists { .. })
        ));
    }

    #[test]
    fn download_failure_names_the_resource() {
        let dir = tempfile::tempdir().unwrap();
        let executor = MockExecutor::succeeding(1);
        let mut downloader = MockDownloader::new();
        downloader.expect_download().returning(|url, _| {
            Err(DownloadError::NotFound {
                url: url.to_string(),
            })
        });
        let resource = DownloadResource::new(entry(None, None), dir.path().join("zlib"), &executor, &downloader);

        let err = resource.apply().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'zlib'"), "got: {msg}");
        assert!(msg.contains("not found"), "got: {msg}");
    }

    #[test]
    fn failed_extraction_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let executor = MockExecutor::fail();
        let downloader = serving_hello();
        let resource = DownloadResource::new(entry(None, None), dir.path().join("zlib"), &executor, &downloader);

        let err = resource.apply().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::Extract { .. })
        ));
    }
}
