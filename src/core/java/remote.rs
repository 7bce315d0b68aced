// ─── Remote Runtime Lookup ───
// Answers "where can a JDK of this major be fetched, and how large is it".
// Downloading and unpacking belong to the launcher's downloader.

use std::time::Duration;

use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::error::{GuardError, GuardResult};
use crate::core::http::build_http_client;

use super::platform::Platform;

pub const ADOPTIUM_API_BASE: &str = "https://api.adoptium.net/v3/assets/latest";
pub const CORRETTO_DOWNLOAD_BASE: &str = "https://corretto.aws/downloads/latest";
const REMOTE_ARCH: &str = "x64";
const REMOTE_IMAGE_TYPE: &str = "jdk";
const ADOPTIUM_VENDOR: &str = "eclipse";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemotePackageMeta {
    pub uri: String,
    pub size_bytes: u64,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct RemoteOptions {
    pub timeout: Duration,
    pub adoptium_base: String,
    pub corretto_base: String,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            adoptium_base: ADOPTIUM_API_BASE.to_string(),
            corretto_base: CORRETTO_DOWNLOAD_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AdoptiumRelease {
    binary: AdoptiumBinary,
    version: AdoptiumVersion,
}

#[derive(Debug, Clone, Deserialize)]
struct AdoptiumBinary {
    os: String,
    image_type: String,
    architecture: String,
    package: AdoptiumPackage,
}

#[derive(Debug, Clone, Deserialize)]
struct AdoptiumPackage {
    link: String,
    size: u64,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AdoptiumVersion {
    major: u32,
}

pub struct RemoteRuntimeLocator {
    platform: Platform,
    client: Client,
    options: RemoteOptions,
}

impl RemoteRuntimeLocator {
    pub fn new(platform: Platform, options: RemoteOptions) -> GuardResult<Self> {
        let client = build_http_client(options.timeout)?;
        Ok(Self {
            platform,
            client,
            options,
        })
    }

    /// Latest downloadable JDK for `major`, or `None` on any failure.
    #[instrument(skip(self), fields(platform = %self.platform))]
    pub async fn locate_latest(&self, major: u32) -> Option<RemotePackageMeta> {
        let lookup = match self.platform {
            // Adoptium builds were unreliable on macOS; Corretto is used there.
            Platform::MacOs => self.latest_corretto(major).await,
            Platform::Windows | Platform::Linux => self.latest_adoptium(major).await,
        };
        match lookup {
            Ok(meta) => {
                info!("Java {} available at {} ({} bytes)", major, meta.uri, meta.size_bytes);
                Some(meta)
            }
            Err(err) => {
                warn!("No downloadable Java {}: {}", major, err);
                None
            }
        }
    }

    async fn latest_adoptium(&self, major: u32) -> GuardResult<RemotePackageMeta> {
        let os = self.platform.adoptium_os();
        let url = format!(
            "{}/{}/hotspot?vendor={}&os={}&image_type={}&architecture={}",
            self.options.adoptium_base, major, ADOPTIUM_VENDOR, os, REMOTE_IMAGE_TYPE, REMOTE_ARCH
        );
        debug!("Querying {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GuardError::RemoteLookup(format!(
                "{url} returned HTTP {}",
                status.as_u16()
            )));
        }

        let releases: Vec<AdoptiumRelease> = response.json().await?;
        select_adoptium_package(releases, major, os).ok_or_else(|| {
            GuardError::RemoteLookup(format!("no {REMOTE_ARCH} {os} JDK {major} in Adoptium listing"))
        })
    }

    async fn latest_corretto(&self, major: u32) -> GuardResult<RemotePackageMeta> {
        let url = corretto_url(&self.options.corretto_base, major, self.platform);
        debug!("Probing {}", url);

        let response = self.client.head(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GuardError::RemoteLookup(format!(
                "{url} returned HTTP {}",
                status.as_u16()
            )));
        }

        let size_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| GuardError::RemoteLookup(format!("{url} sent no content length")))?;

        Ok(RemotePackageMeta {
            file_name: file_name_from_url(&url).to_string(),
            uri: url,
            size_bytes,
        })
    }
}

/// Resolve a downloadable JDK for `major` on `platform`.
pub async fn locate_latest(
    platform: Platform,
    major: u32,
    options: RemoteOptions,
) -> Option<RemotePackageMeta> {
    match RemoteRuntimeLocator::new(platform, options) {
        Ok(locator) => locator.locate_latest(major).await,
        Err(err) => {
            warn!("Cannot build HTTP client for runtime lookup: {}", err);
            None
        }
    }
}

fn select_adoptium_package(
    releases: Vec<AdoptiumRelease>,
    major: u32,
    os: &str,
) -> Option<RemotePackageMeta> {
    releases
        .into_iter()
        .find(|release| {
            release.version.major == major
                && release.binary.os == os
                && release.binary.image_type == REMOTE_IMAGE_TYPE
                && release.binary.architecture == REMOTE_ARCH
        })
        .map(|release| RemotePackageMeta {
            uri: release.binary.package.link,
            size_bytes: release.binary.package.size,
            file_name: release.binary.package.name,
        })
}

fn corretto_url(base: &str, major: u32, platform: Platform) -> String {
    let (os, ext) = platform.corretto_os_and_ext();
    format!("{base}/amazon-corretto-{major}-{REMOTE_ARCH}-{os}-{REMOTE_IMAGE_TYPE}.{ext}")
}

fn file_name_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn release(major: u32, os: &str, image_type: &str, arch: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "binary": {
                "os": os,
                "image_type": image_type,
                "architecture": arch,
                "package": {
                    "link": format!("https://github.com/adoptium/releases/{name}"),
                    "size": 190_000_000u64,
                    "name": name,
                    "checksum": "ignored"
                }
            },
            "version": { "major": major, "openjdk_version": "ignored" }
        })
    }

    fn listing() -> serde_json::Value {
        serde_json::Value::Array(vec![
            release(17, "linux", "jre", "x64", "jre-linux.tar.gz"),
            release(17, "linux", "jdk", "aarch64", "jdk-linux-arm.tar.gz"),
            release(17, "windows", "jdk", "x64", "jdk-windows.zip"),
            release(17, "linux", "jdk", "x64", "jdk-linux.tar.gz"),
        ])
    }

    /// Serves exactly one canned HTTP response and returns its base URL.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = vec![0u8; 8192];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    fn options_for(base: &str) -> RemoteOptions {
        RemoteOptions {
            timeout: Duration::from_secs(5),
            adoptium_base: base.to_string(),
            corretto_base: base.to_string(),
        }
    }

    #[test]
    fn selects_matching_adoptium_entry() {
        let releases: Vec<AdoptiumRelease> = serde_json::from_value(listing()).unwrap();
        let meta = select_adoptium_package(releases, 17, "linux").unwrap();
        assert_eq!(meta.file_name, "jdk-linux.tar.gz");
        assert_eq!(meta.size_bytes, 190_000_000);
        assert!(meta.uri.ends_with("/jdk-linux.tar.gz"));
    }

    #[test]
    fn no_adoptium_match_is_none() {
        let releases: Vec<AdoptiumRelease> = serde_json::from_value(listing()).unwrap();
        assert_eq!(select_adoptium_package(releases, 21, "linux"), None);
    }

    #[test]
    fn corretto_url_follows_template() {
        let url = corretto_url(CORRETTO_DOWNLOAD_BASE, 17, Platform::MacOs);
        assert_eq!(
            url,
            "https://corretto.aws/downloads/latest/amazon-corretto-17-x64-macos-jdk.tar.gz"
        );
        assert_eq!(file_name_from_url(&url), "amazon-corretto-17-x64-macos-jdk.tar.gz");
        assert!(corretto_url(CORRETTO_DOWNLOAD_BASE, 8, Platform::Windows).ends_with("-windows-jdk.zip"));
    }

    #[tokio::test]
    async fn adoptium_lookup_reads_package_from_body() {
        let body = listing().to_string();
        let base = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ))
        .await;

        let meta = locate_latest(Platform::Linux, 17, options_for(&base)).await.unwrap();
        assert_eq!(meta.file_name, "jdk-linux.tar.gz");
    }

    #[tokio::test]
    async fn corretto_lookup_reads_content_length() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 195123456\r\nConnection: close\r\n\r\n".to_string(),
        )
        .await;

        let meta = locate_latest(Platform::MacOs, 17, options_for(&base)).await.unwrap();
        assert_eq!(meta.size_bytes, 195_123_456);
        assert_eq!(meta.file_name, "amazon-corretto-17-x64-macos-jdk.tar.gz");
        assert_eq!(meta.uri, format!("{base}/amazon-corretto-17-x64-macos-jdk.tar.gz"));
    }

    #[tokio::test]
    async fn error_status_is_none() {
        let base = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        )
        .await;
        assert_eq!(locate_latest(Platform::Windows, 17, options_for(&base)).await, None);
    }

    #[tokio::test]
    async fn unreachable_service_is_none() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = format!("http://{addr}");
        assert_eq!(locate_latest(Platform::Linux, 17, options_for(&base)).await, None);
        assert_eq!(locate_latest(Platform::MacOs, 17, options_for(&base)).await, None);
    }
}
