//! Archive synchronisation
//!
//! Mirrors the dated campaign directories of a Level-2 archive into a local
//! directory. Each candidate file is transferred only when it is missing
//! locally, when the remote copy is newer, or when clobbering is requested.
//! `.TXT` files are converted on the way in; anything else (the `.xml`
//! metadata companions) is copied byte for byte.
//!
//! The transport sits behind [`ArchiveSource`]. Listing and fetching are the
//! only operations it offers, so credentials and sessions stay inside the
//! transport and never reach the conversion core, which only receives the
//! fetched bytes and the declared file name.

use crate::convert::{apply_mode, convert_bytes, ConvertConfig};
use crate::errors::{ConversionError, LvisError, Result};
use crate::netcdf_io::staging_file;
use crate::schema::is_convertible;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub modified: SystemTime,
    pub is_dir: bool,
}

/// Directory listing and retrieval for a remote archive
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// List a directory relative to the archive root (`""` is the root)
    async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>>;

    /// Fetch the full contents of a file relative to the archive root
    async fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

/// Archive mirrored on a local or mounted filesystem
#[derive(Debug, Clone)]
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArchiveSource for LocalArchive {
    async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(self.root.join(path)).await?;
        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                modified: metadata.modified()?,
                is_dir: metadata.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.root.join(path)).await?)
    }
}

fn listing_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<td class="indexcolname"><a href="([^"]+)""#)
            .expect("listing pattern is valid")
    })
}

fn listing_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<td class="indexcollastmod">\s*(\d{4}-\d{2}-\d{2} \d{2}:\d{2})"#)
            .expect("listing date pattern is valid")
    })
}

/// Parse an Apache `mod_autoindex` HTML table listing
///
/// Rows without a modification date (the parent directory link) and
/// absolute or query links are dropped. Dates are read as UTC.
pub fn parse_index_listing(html: &str) -> Vec<RemoteEntry> {
    html.split("<tr")
        .filter_map(|row| {
            let href = listing_name_pattern().captures(row)?.get(1)?.as_str();
            if href.starts_with('/') || href.starts_with('?') {
                return None;
            }
            let stamp = listing_date_pattern().captures(row)?.get(1)?.as_str();
            let parsed = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M").ok()?;
            let seconds = u64::try_from(parsed.and_utc().timestamp()).ok()?;
            Some(RemoteEntry {
                name: href.trim_end_matches('/').to_string(),
                modified: UNIX_EPOCH + Duration::from_secs(seconds),
                is_dir: href.ends_with('/'),
            })
        })
        .collect()
}

fn candidate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(BLVIS2|BVLIS2|ILVIS2|ILVGH2)_(GL|AQ)\d.*\.(TXT|xml)$")
            .expect("candidate pattern is valid")
    })
}

/// Settings of one sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Local working directory receiving the mirrored subdirectories
    pub directory: PathBuf,
    /// Campaign years to sync, all years when empty
    pub years: Vec<i32>,
    /// Explicit subdirectories to sync, takes precedence over `years`
    pub subdirectories: Vec<String>,
    /// Transfer even when the local copy is up to date
    pub clobber: bool,
    /// Fetches in flight at once
    pub concurrency: usize,
    pub convert: ConvertConfig,
}

impl SyncOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            years: Vec::new(),
            subdirectories: Vec::new(),
            clobber: false,
            concurrency: 1,
            convert: ConvertConfig::default(),
        }
    }

    /// Pattern selecting remote campaign subdirectories such as `2009.10.20`
    pub fn subdirectory_filter(&self) -> Result<Regex> {
        let pattern = if !self.subdirectories.is_empty() {
            let names: Vec<String> = self.subdirectories.iter().map(|s| regex::escape(s)).collect();
            format!("^({})", names.join("|"))
        } else if !self.years.is_empty() {
            let years: Vec<String> = self.years.iter().map(|y| y.to_string()).collect();
            format!(r"^({})\.\d+\.\d+", years.join("|"))
        } else {
            r"^\d+\.\d+\.\d+".to_string()
        };
        Regex::new(&pattern).map_err(|e| LvisError::Archive(format!("invalid filter: {}", e)))
    }
}

/// Why a file is being transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferReason {
    /// No local copy exists
    New,
    /// Remote copy is newer than the local one
    Overwrite,
    /// Local copy is current but clobbering was requested
    Clobber,
}

impl TransferReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Overwrite => "overwrite",
            Self::Clobber => "clobber",
        }
    }
}

/// Decide whether `local` needs to be (re)written from a remote file
pub fn transfer_reason(
    remote_modified: SystemTime,
    local: &Path,
    clobber: bool,
) -> Option<TransferReason> {
    match fs::metadata(local).and_then(|m| m.modified()) {
        Err(_) => Some(TransferReason::New),
        Ok(local_modified) if remote_modified > local_modified => Some(TransferReason::Overwrite),
        Ok(_) if clobber => Some(TransferReason::Clobber),
        Ok(_) => None,
    }
}

/// Local file name of a remote file: converted files take the output extension
pub fn local_name(remote_name: &str, config: &ConvertConfig) -> String {
    let path = Path::new(remote_name);
    if is_convertible(path) {
        path.with_extension(&config.extension)
            .to_string_lossy()
            .into_owned()
    } else {
        remote_name.to_string()
    }
}

/// One transferred file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub remote: String,
    pub local: PathBuf,
    pub reason: TransferReason,
    pub converted: bool,
}

/// Outcome of a sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    pub transferred: Vec<Transfer>,
    pub up_to_date: usize,
    pub failed: Vec<ConversionError>,
}

/// File mode adjusted for a directory: the owner keeps full access and every
/// class that may read may also search
fn directory_mode(mode: u32) -> u32 {
    mode | 0o700 | ((mode & 0o444) >> 2)
}

struct PendingTransfer {
    remote: String,
    name: String,
    local: PathBuf,
    modified: SystemTime,
    reason: TransferReason,
}

/// Write fetched bytes: convert `.TXT`, copy anything else, then stamp
/// the remote modification time and the permission mode
///
/// The mtime is set while the file is still writable; the mode comes last
/// since it may drop write permission.
fn store_transfer(
    bytes: Vec<u8>,
    pending: &PendingTransfer,
    config: &ConvertConfig,
) -> Result<bool> {
    let converted = is_convertible(Path::new(&pending.name));
    if converted {
        let unmoded = ConvertConfig {
            mode: None,
            ..config.clone()
        };
        convert_bytes(&bytes, &pending.remote, &pending.local, &unmoded)?;
        fs::File::options()
            .write(true)
            .open(&pending.local)?
            .set_modified(pending.modified)?;
    } else {
        let mut staging = staging_file(&pending.local)?;
        staging.write_all(&bytes)?;
        staging.as_file().set_modified(pending.modified)?;
        staging
            .persist(&pending.local)
            .map_err(|e| LvisError::IoError(e.error))?;
    }
    apply_mode(&pending.local, config.mode)?;
    Ok(converted)
}

async fn run_transfer<S: ArchiveSource + ?Sized>(
    source: &S,
    pending: PendingTransfer,
    config: ConvertConfig,
) -> std::result::Result<Transfer, ConversionError> {
    let local = pending.local.clone();
    let fail = |e: LvisError| ConversionError::new(local.clone(), e);

    let bytes = source.fetch(&pending.remote).await.map_err(&fail)?;
    debug!(remote = %pending.remote, bytes = bytes.len(), "fetched");

    let (converted, pending) = tokio::task::spawn_blocking(move || {
        store_transfer(bytes, &pending, &config).map(|converted| (converted, pending))
    })
    .await
    .map_err(|e| fail(LvisError::Archive(format!("transfer task failed: {}", e))))?
    .map_err(&fail)?;

    info!(
        "{} --> {} ({})",
        pending.remote,
        pending.local.display(),
        pending.reason.as_str()
    );
    Ok(Transfer {
        remote: pending.remote,
        local: pending.local,
        reason: pending.reason,
        converted,
    })
}

/// Mirror the selected campaign directories of `source` into the local directory
pub async fn sync_archive<S: ArchiveSource + ?Sized>(
    source: &S,
    options: &SyncOptions,
) -> Result<SyncReport> {
    let filter = options.subdirectory_filter()?;
    let mut report = SyncReport::default();
    let mut pending = Vec::new();

    for subdir in source.list("").await? {
        if !subdir.is_dir || !filter.is_match(&subdir.name) {
            continue;
        }
        let local_dir = options.directory.join(&subdir.name);
        if !local_dir.exists() {
            fs::create_dir_all(&local_dir)?;
            apply_mode(&local_dir, options.convert.mode.map(directory_mode))?;
        }

        for entry in source.list(&subdir.name).await? {
            if entry.is_dir || !candidate_pattern().is_match(&entry.name) {
                continue;
            }
            let local = local_dir.join(local_name(&entry.name, &options.convert));
            match transfer_reason(entry.modified, &local, options.clobber) {
                Some(reason) => pending.push(PendingTransfer {
                    remote: format!("{}/{}", subdir.name, entry.name),
                    name: entry.name,
                    local,
                    modified: entry.modified,
                    reason,
                }),
                None => report.up_to_date += 1,
            }
        }
    }

    debug!(
        pending = pending.len(),
        up_to_date = report.up_to_date,
        "sync plan ready"
    );

    let results: Vec<_> = stream::iter(pending)
        .map(|p| run_transfer(source, p, options.convert.clone()))
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    for result in results {
        match result {
            Ok(transfer) => report.transferred.push(transfer),
            Err(failure) => {
                error!("{}", failure);
                report.failed.push(failure);
            }
        }
    }
    report.transferred.sort_by(|a, b| a.remote.cmp(&b.remote));
    Ok(report)
}
