//! Core types for pagebd.

use crate::error::ValidationError;
use crate::vhd::VHD_HEADER_SIZE;

/// The driver's native addressable unit, in bytes.
pub const SECTOR_SIZE: u64 = 512;

/// One gigabyte, the unit callers size disks in.
pub const GIB: u64 = 1024 * 1024 * 1024;

const _: () = {
    assert!(SECTOR_SIZE.is_power_of_two());
    assert!(GIB % SECTOR_SIZE == 0);
};

/// Access mode of a mounted disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskType {
    ReadOnly,
    ReadWrite,
}

impl DiskType {
    /// Wire token, part of the driver ABI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "r",
            Self::ReadWrite => "rw",
        }
    }

    pub fn from_str(token: &str) -> Option<Self> {
        match token {
            "r" => Some(Self::ReadOnly),
            "rw" => Some(Self::ReadWrite),
            _ => None,
        }
    }
}

impl std::fmt::Display for DiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor for one mountable disk, the unit of work for every operation.
///
/// Constructed by the caller with [`Disk::new`] for a mount; the client
/// enriches it in place (account identity, sector count, host, ip) before
/// transmission, and a successful mount populates `major`/`minor`. For get
/// and list the descriptor is built entirely from the driver's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk {
    pub disk_type: DiskType,
    /// Device name, 1-32 chars, no path separators or `.`.
    pub name: String,
    /// Count of 512-byte sectors. Derived from the backing blob's size,
    /// never set directly by a caller.
    pub(crate) sector_count: u64,
    /// Whole gigabytes, derived bidirectionally from `sector_count`.
    pub size_gb: u64,
    pub account_name: String,
    /// Base64-encoded storage account key.
    pub account_key: String,
    /// Logical location of the backing blob: `/container/blobName`.
    pub path: String,
    /// Storage endpoint. Derived from `account_name` when empty.
    pub(crate) host: String,
    /// Resolved address of `host`.
    pub(crate) ip: String,
    /// Write-lease token identifying exclusive access.
    pub lease_id: String,
    /// Whether a fixed-size disk-image header occupies the blob's tail.
    pub is_image_format: bool,
    /// Device numbers, populated only by the driver on successful mount.
    pub major: Option<u32>,
    pub minor: Option<u32>,
}

impl Disk {
    /// New descriptor with the caller-settable subset of fields. The rest
    /// is derived during mount.
    pub fn new(disk_type: DiskType, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            disk_type,
            name: name.into(),
            sector_count: 0,
            size_gb: 0,
            account_name: String::new(),
            account_key: String::new(),
            path: path.into(),
            host: String::new(),
            ip: String::new(),
            lease_id: String::new(),
            is_image_format: false,
            major: None,
            minor: None,
        }
    }

    pub fn sector_count(&self) -> u64 {
        self.sector_count
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Splits `path` into `(container, blob_name)`.
    pub fn split_path(&self) -> Result<(&str, &str), ValidationError> {
        split_blob_path(&self.path)
    }
}

/// Splits a `/container/blobName` path into its container and blob parts.
/// The container part may itself contain slashes (`/c/a/b` -> `c/a`, `b`).
pub(crate) fn split_blob_path(path: &str) -> Result<(&str, &str), ValidationError> {
    let trimmed = path.strip_prefix('/').ok_or(ValidationError::InvalidPath {
        reason: "must start with /",
    })?;
    let (container, blob) = trimmed
        .rsplit_once('/')
        .ok_or(ValidationError::InvalidPath {
            reason: "must be /container/blobName",
        })?;
    if container.is_empty() || blob.is_empty() {
        return Err(ValidationError::InvalidPath {
            reason: "container and blob name must be non-empty",
        });
    }
    Ok((container, blob))
}

/// Sector count for a blob of `size_bytes`, subtracting the trailing
/// image header when present. A blob smaller than the header yields zero,
/// which validation rejects.
pub fn sector_count_for(size_bytes: u64, is_image_format: bool) -> u64 {
    let payload = if is_image_format {
        size_bytes.saturating_sub(VHD_HEADER_SIZE)
    } else {
        size_bytes
    };
    payload / SECTOR_SIZE
}

/// Inverse of [`sector_count_for`]: whole gigabytes for a sector count,
/// adding the image header back when present.
pub fn size_gb_from_sectors(sector_count: u64, is_image_format: bool) -> u64 {
    let mut bytes = sector_count * SECTOR_SIZE;
    if is_image_format {
        bytes += VHD_HEADER_SIZE;
    }
    bytes / GIB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_count_one_gib() {
        assert_eq!(sector_count_for(GIB, false), 2_097_152);
    }

    #[test]
    fn sector_count_subtracts_image_header() {
        assert_eq!(sector_count_for(GIB, true), 2_097_151);
    }

    #[test]
    fn size_reconciliation_roundtrip() {
        // post_get(pre_mount(d)).size_gb == d.size_gb for image-format disks
        for size_gb in [1u64, 4, 100, 1023] {
            let bytes = size_gb * GIB;
            for image in [false, true] {
                let sectors = sector_count_for(bytes, image);
                assert_eq!(size_gb_from_sectors(sectors, image), size_gb);
            }
        }
    }

    #[test]
    fn tiny_blob_yields_zero_sectors() {
        assert_eq!(sector_count_for(VHD_HEADER_SIZE, true), 0);
        assert_eq!(sector_count_for(0, false), 0);
    }

    #[test]
    fn split_path_forms() {
        assert_eq!(split_blob_path("/c/blob").unwrap(), ("c", "blob"));
        assert_eq!(split_blob_path("/c/a/blob").unwrap(), ("c/a", "blob"));
        assert!(split_blob_path("no-slash").is_err());
        assert!(split_blob_path("/only-container").is_err());
        assert!(split_blob_path("/c/").is_err());
    }

    #[test]
    fn disk_type_tokens() {
        assert_eq!(DiskType::from_str("r"), Some(DiskType::ReadOnly));
        assert_eq!(DiskType::from_str("rw"), Some(DiskType::ReadWrite));
        assert_eq!(DiskType::from_str("RW"), None);
        assert_eq!(DiskType::ReadWrite.as_str(), "rw");
    }
}
