//! In-memory page blob store.
//!
//! Models the store behaviors the client depends on — existence, blob
//! type, size, range bounds, and lease enforcement — without holding the
//! blob payload itself. Range writes are kept as a log so tests can assert
//! what was written where.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{BlobProperties, BlobType, PageBlobStore};
use crate::types::SECTOR_SIZE;

#[derive(Debug, Default)]
struct Blob {
    content_length: u64,
    blob_type: Option<BlobType>,
    lease: Option<String>,
    metadata: HashMap<String, String>,
    writes: Vec<(u64, Vec<u8>)>,
}

impl Blob {
    // Reads with no lease against a leased blob are allowed; anything
    // presenting a lease must present the right one.
    fn check_lease(&self, lease_id: &str, path: &str) -> Result<(), StoreError> {
        let ok = match self.lease.as_deref() {
            Some(held) => lease_id.is_empty() || held == lease_id,
            None => lease_id.is_empty(),
        };
        if ok {
            Ok(())
        } else {
            Err(StoreError::LeaseMismatch {
                path: path.to_string(),
            })
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    containers: Mutex<HashMap<String, HashMap<String, Blob>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Range writes recorded against a blob, in issue order.
    pub fn writes(&self, container: &str, blob: &str) -> Vec<(u64, Vec<u8>)> {
        let containers = self.containers.lock().unwrap();
        containers
            .get(container)
            .and_then(|c| c.get(blob))
            .map(|b| b.writes.clone())
            .unwrap_or_default()
    }

    /// Metadata recorded against a blob.
    pub fn metadata(&self, container: &str, blob: &str) -> HashMap<String, String> {
        let containers = self.containers.lock().unwrap();
        containers
            .get(container)
            .and_then(|c| c.get(blob))
            .map(|b| b.metadata.clone())
            .unwrap_or_default()
    }

    /// Creates a non-page blob, for exercising the type check.
    pub fn put_block_blob(&self, container: &str, blob: &str, size_bytes: u64) {
        let mut containers = self.containers.lock().unwrap();
        let entry = containers.entry(container.to_string()).or_default();
        entry.insert(
            blob.to_string(),
            Blob {
                content_length: size_bytes,
                blob_type: Some(BlobType::Block),
                ..Blob::default()
            },
        );
    }
}

fn blob_path(container: &str, blob: &str) -> String {
    format!("/{container}/{blob}")
}

impl PageBlobStore for InMemoryStore {
    fn create_container_if_absent(&self, container: &str) -> Result<(), StoreError> {
        let mut containers = self.containers.lock().unwrap();
        containers.entry(container.to_string()).or_default();
        Ok(())
    }

    fn container_exists(&self, container: &str) -> Result<bool, StoreError> {
        let containers = self.containers.lock().unwrap();
        Ok(containers.contains_key(container))
    }

    fn blob_exists(&self, container: &str, blob: &str) -> Result<bool, StoreError> {
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .get(container)
            .is_some_and(|c| c.contains_key(blob)))
    }

    fn create_page_blob(
        &self,
        container: &str,
        blob: &str,
        size_bytes: u64,
    ) -> Result<(), StoreError> {
        if size_bytes % SECTOR_SIZE != 0 {
            return Err(StoreError::UnalignedSize { size_bytes });
        }
        let mut containers = self.containers.lock().unwrap();
        let entry = containers
            .get_mut(container)
            .ok_or_else(|| StoreError::ContainerNotFound {
                container: container.to_string(),
            })?;
        entry.insert(
            blob.to_string(),
            Blob {
                content_length: size_bytes,
                blob_type: Some(BlobType::Page),
                ..Blob::default()
            },
        );
        Ok(())
    }

    fn write_range(
        &self,
        container: &str,
        blob: &str,
        offset: u64,
        data: &[u8],
    ) -> Result<(), StoreError> {
        let mut containers = self.containers.lock().unwrap();
        let entry = containers
            .get_mut(container)
            .and_then(|c| c.get_mut(blob))
            .ok_or_else(|| StoreError::BlobNotFound {
                path: blob_path(container, blob),
            })?;
        let length = data.len() as u64;
        if offset + length > entry.content_length {
            return Err(StoreError::RangeOutOfBounds {
                offset,
                length,
                size: entry.content_length,
            });
        }
        entry.writes.push((offset, data.to_vec()));
        Ok(())
    }

    fn acquire_lease(&self, container: &str, blob: &str) -> Result<String, StoreError> {
        let mut containers = self.containers.lock().unwrap();
        let entry = containers
            .get_mut(container)
            .and_then(|c| c.get_mut(blob))
            .ok_or_else(|| StoreError::BlobNotFound {
                path: blob_path(container, blob),
            })?;
        if entry.lease.is_some() {
            return Err(StoreError::LeaseMismatch {
                path: blob_path(container, blob),
            });
        }
        let token = Uuid::new_v4().to_string();
        entry.lease = Some(token.clone());
        Ok(token)
    }

    fn get_properties(
        &self,
        container: &str,
        blob: &str,
        lease_id: &str,
    ) -> Result<BlobProperties, StoreError> {
        let containers = self.containers.lock().unwrap();
        let entry = containers
            .get(container)
            .and_then(|c| c.get(blob))
            .ok_or_else(|| StoreError::BlobNotFound {
                path: blob_path(container, blob),
            })?;
        entry.check_lease(lease_id, &blob_path(container, blob))?;
        Ok(BlobProperties {
            content_length: entry.content_length,
            blob_type: entry.blob_type.unwrap_or(BlobType::Page),
        })
    }

    fn set_metadata(
        &self,
        container: &str,
        blob: &str,
        lease_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut containers = self.containers.lock().unwrap();
        let path = blob_path(container, blob);
        let entry = containers
            .get_mut(container)
            .and_then(|c| c.get_mut(blob))
            .ok_or_else(|| StoreError::BlobNotFound { path: path.clone() })?;
        // Writes against a leased blob always require the matching lease.
        if entry.lease.is_some() && entry.lease.as_deref() != Some(lease_id) {
            return Err(StoreError::LeaseMismatch { path });
        }
        entry.metadata.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
