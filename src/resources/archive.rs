//! Release archives: download, checksum verification and extraction.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ProvisionError;

use super::digest::{copy_hashing, sha256_file};
use super::traits::Resource;
use super::types::{Outcome, RunContext};

/// A release archive unpacked into `{cache_dir}/{name}`.
///
/// The archive is downloaded into the cache, verified against its SHA-256
/// and extracted with the first path component stripped into a staging
/// directory that is renamed into place. A failure at any step leaves no
/// extracted directory behind.
pub struct ReleaseArchive {
    name: String,
    url: String,
    checksum: String,
    extension: String,
    cache_dir: PathBuf,
    timeout: Duration,
}

impl ReleaseArchive {
    pub fn new(
        name: &str,
        url: &str,
        checksum: &str,
        extension: &str,
        cache_dir: &Path,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            checksum: checksum.to_lowercase(),
            extension: extension.to_string(),
            cache_dir: cache_dir.to_path_buf(),
            timeout,
        }
    }

    /// Directory the archive is extracted into.
    pub fn extracted_dir(&self) -> PathBuf {
        self.cache_dir.join(&self.name)
    }

    /// Marker holding the checksum the extracted directory was verified against.
    fn marker_path(&self) -> PathBuf {
        self.cache_dir.join(format!(".{}.sha256", self.name))
    }

    /// Whether the extracted directory came from an archive with our checksum.
    fn is_extracted(&self) -> Result<bool, ProvisionError> {
        if !self.extracted_dir().is_dir() {
            return Ok(false);
        }
        match fs::read_to_string(self.marker_path()) {
            Ok(recorded) => Ok(recorded.trim() == self.checksum),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn archive_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", self.name, self.extension))
    }

    /// Download into the cache unless a verified copy is already there.
    fn fetch(&self) -> Result<PathBuf, ProvisionError> {
        let archive_path = self.archive_path();
        if archive_path.is_file() && sha256_file(&archive_path)? == self.checksum {
            debug!(path = %archive_path.display(), "Using cached archive");
            return Ok(archive_path);
        }

        let part_path = self
            .cache_dir
            .join(format!(".{}.{}.part", self.name, Uuid::new_v4().simple()));

        let result = self.download_to(&part_path).and_then(|actual| {
            if actual != self.checksum {
                return Err(ProvisionError::ChecksumMismatch {
                    path: archive_path.clone(),
                    expected: self.checksum.clone(),
                    actual,
                });
            }
            fs::rename(&part_path, &archive_path)?;
            Ok(())
        });

        if let Err(e) = result {
            let _ = fs::remove_file(&part_path);
            return Err(e);
        }

        info!(url = %self.url, path = %archive_path.display(), "Archive downloaded");
        Ok(archive_path)
    }

    /// Stream the archive into `path`, returning its SHA-256.
    fn download_to(&self, path: &Path) -> Result<String, ProvisionError> {
        let mut out = File::create(path)?;
        let download_error = |message: String| ProvisionError::Download {
            url: self.url.clone(),
            message,
        };

        if let Some(local) = self.url.strip_prefix("file://") {
            let mut source = File::open(local).map_err(|e| download_error(e.to_string()))?;
            return copy_hashing(&mut source, &mut out).map_err(|e| download_error(e.to_string()));
        }

        debug!(url = %self.url, timeout_secs = self.timeout.as_secs(), "Downloading archive");
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| download_error(e.to_string()))?;
        let mut response = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| download_error(e.to_string()))?;

        let digest =
            copy_hashing(&mut response, &mut out).map_err(|e| download_error(e.to_string()))?;
        out.sync_all()?;
        Ok(digest)
    }

    fn extract(&self, archive_path: &Path, dest: &Path) -> Result<(), ProvisionError> {
        let file = BufReader::new(File::open(archive_path)?);
        let reader: Box<dyn Read> = match self.extension.as_str() {
            "tar" => Box::new(file),
            _ => Box::new(GzDecoder::new(file)),
        };

        let mut archive = tar::Archive::new(reader);
        archive.set_preserve_ownerships(false);

        fs::create_dir_all(dest)?;
        for entry in archive.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.into_owned();
            let Some(relative) = strip_first_component(&path)? else {
                continue;
            };

            let target = dest.join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            let entry_type = entry.header().entry_type();
            if entry_type.is_symlink() || entry_type.is_hard_link() {
                let link = entry.link_name()?.map(|l| l.into_owned()).unwrap_or_default();
                let escapes = || {
                    ProvisionError::execution(format!(
                        "Refusing to extract link '{}' pointing outside the archive",
                        path.display()
                    ))
                };
                if link.is_absolute() {
                    return Err(escapes());
                }
                if entry_type.is_hard_link() {
                    // Hard link names are archive paths, not relative to the member
                    let source = resolve_within(Path::new(""), &link)
                        .and_then(|l| strip_first_component(&l).ok().flatten())
                        .ok_or_else(escapes)?;
                    fs::hard_link(dest.join(source), &target)?;
                    continue;
                }
                if resolve_within(relative.parent().unwrap_or(Path::new("")), &link).is_none() {
                    return Err(escapes());
                }
            }

            entry.unpack(&target).map_err(|e| {
                ProvisionError::execution(format!(
                    "Failed to extract '{}' from '{}': {}",
                    path.display(),
                    archive_path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}

/// Drop the leading directory of an archive member. `None` for the
/// directory entry itself; an error for absolute or `..` members.
fn strip_first_component(path: &Path) -> Result<Option<PathBuf>, ProvisionError> {
    let mut components = path.components();
    components.next();

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(ProvisionError::execution(format!(
                    "Refusing to extract unsafe archive member '{}'",
                    path.display()
                )))
            }
        }
    }

    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}

/// Resolve a link target relative to `base` without leaving the
/// extraction root. `None` when the link is absolute or climbs out.
fn resolve_within(base: &Path, link: &Path) -> Option<PathBuf> {
    let mut resolved: Vec<&std::ffi::OsStr> = Vec::new();
    for component in base.components().chain(link.components()) {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved.iter().collect())
}

impl Resource for ReleaseArchive {
    fn kind(&self) -> &'static str {
        "archive"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        let extracted = self.extracted_dir();
        if self.is_extracted()? {
            return Ok(Outcome::Unchanged);
        }
        if ctx.why_run {
            debug!(url = %self.url, stale = extracted.is_dir(), "Would download archive");
            return Ok(Outcome::Updated);
        }

        fs::create_dir_all(&self.cache_dir)?;
        let archive_path = self.fetch()?;

        let staging = self
            .cache_dir
            .join(format!(".{}.{}.staging", self.name, Uuid::new_v4().simple()));
        let result = self.extract(&archive_path, &staging).and_then(|()| {
            // Extracted under a different checksum
            if extracted.is_dir() {
                fs::remove_dir_all(&extracted)?;
            }
            fs::write(self.marker_path(), format!("{}\n", self.checksum))?;
            fs::rename(&staging, &extracted)?;
            Ok(())
        });

        if let Err(e) = result {
            warn!(archive = %archive_path.display(), error = %e, "Extraction failed");
            let _ = fs::remove_dir_all(&staging);
            let _ = fs::remove_file(self.marker_path());
            return Err(e);
        }

        info!(path = %extracted.display(), "Archive extracted");
        Ok(Outcome::Updated)
    }
}
