//! Lifecycle validator: field-level descriptor checks plus lease
//! validation against the object store. Runs before every mount,
//! short-circuiting on the first violation.

use std::io;
use std::net::{IpAddr, ToSocketAddrs};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{Error, StoreError, ValidationError};
use crate::store::{BlobType, PageBlobStore};
use crate::types::{Disk, DiskType};

const MAX_NAME_LEN: usize = 32;
const MAX_ACCOUNT_NAME_LEN: usize = 256;
const MAX_ACCOUNT_KEY_LEN: usize = 128;
const MAX_PATH_LEN: usize = 1024;
const MAX_HOST_LEN: usize = 512;
const MAX_LEASE_ID_LEN: usize = 64;

/// Resolves a storage endpoint to an address. Abstracted so tests never
/// depend on real DNS.
pub trait HostResolver: Send + Sync {
    fn resolve(&self, host: &str) -> io::Result<IpAddr>;
}

/// System resolver backed by `ToSocketAddrs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DnsResolver;

impl HostResolver for DnsResolver {
    fn resolve(&self, host: &str) -> io::Result<IpAddr> {
        (host, 443)
            .to_socket_addrs()?
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address for host"))
    }
}

/// Shape check shared by unmount and get, where no full descriptor exists.
pub fn validate_device_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ValidationError::InvalidName {
            reason: "must be 1-32 characters",
        });
    }
    if name.contains('/') || name.contains('\\') || name.contains('.') {
        return Err(ValidationError::InvalidName {
            reason: "must not contain / \\ or .",
        });
    }
    Ok(())
}

/// Field-level validation, enriching `host` and `ip` in place.
///
/// Type validity is carried by [`DiskType`] itself; an invalid type is
/// unrepresentable here. `sector_count` must already have been computed
/// from the blob's size.
pub fn validate_disk(d: &mut Disk, resolver: &dyn HostResolver) -> Result<(), ValidationError> {
    validate_device_name(&d.name)?;

    if d.sector_count == 0 {
        return Err(ValidationError::ZeroSectorCount);
    }

    if d.account_name.is_empty() || d.account_name.len() > MAX_ACCOUNT_NAME_LEN {
        return Err(ValidationError::InvalidAccountName {
            reason: "must be 1-256 characters",
        });
    }

    if d.account_key.is_empty() || d.account_key.len() > MAX_ACCOUNT_KEY_LEN {
        return Err(ValidationError::InvalidAccountKey {
            reason: "must be 1-128 characters",
        });
    }
    if BASE64.decode(&d.account_key).is_err() {
        return Err(ValidationError::InvalidAccountKey {
            reason: "must be base64",
        });
    }

    if d.path.is_empty() || d.path.len() > MAX_PATH_LEN {
        return Err(ValidationError::InvalidPath {
            reason: "must be 1-1024 characters",
        });
    }

    if d.host.is_empty() {
        d.host = format!("{}.blob.core.windows.net", d.account_name);
    } else if d.host.len() > MAX_HOST_LEN {
        return Err(ValidationError::InvalidHost {
            reason: "must be at most 512 characters",
        });
    }

    if d.lease_id.is_empty() || d.lease_id.len() > MAX_LEASE_ID_LEN {
        return Err(ValidationError::InvalidLeaseId {
            reason: "must be 1-64 characters",
        });
    }

    let addr = resolver
        .resolve(&d.host)
        .map_err(|_| ValidationError::UnresolvableHost {
            host: d.host.clone(),
        })?;
    d.ip = addr.to_string();

    Ok(())
}

/// Confirms against the object store that the backing blob exists, is a
/// page blob, and that the requested lease is honored. For read-write
/// disks a metadata write probes that the lease grants write access;
/// its failure is distinguishable from "not found".
pub fn validate_lease(d: &Disk, store: &dyn PageBlobStore) -> Result<(), Error> {
    let (container, blob) = d.split_path()?;

    if !store.container_exists(container)? {
        return Err(StoreError::ContainerNotFound {
            container: container.to_string(),
        }
        .into());
    }
    if !store.blob_exists(container, blob)? {
        return Err(StoreError::BlobNotFound {
            path: d.path.clone(),
        }
        .into());
    }

    let props = store.get_properties(container, blob, &d.lease_id)?;
    if props.blob_type != BlobType::Page {
        return Err(StoreError::NotAPageBlob {
            path: d.path.clone(),
        }
        .into());
    }

    // Read-only mounts need no write probe.
    if d.disk_type == DiskType::ReadOnly {
        return Ok(());
    }

    store.set_metadata(container, blob, &d.lease_id, "pagebd", "pagebd")?;
    Ok(())
}
