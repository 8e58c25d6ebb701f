//! Object store seam: exactly the page-blob operations the client consumes.
//!
//! The real cloud binding lives outside this crate; [`PageBlobStore`] is
//! the contract it must satisfy. [`memory::InMemoryStore`] is a
//! lease-enforcing in-memory implementation used by tests.

pub mod memory;

pub use memory::InMemoryStore;

use crate::error::StoreError;

/// Kind of a stored blob. Only [`BlobType::Page`] blobs are mountable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobType {
    Page,
    Block,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobProperties {
    pub content_length: u64,
    pub blob_type: BlobType,
}

/// The page-blob operations this client issues against the object store.
///
/// Read operations that take a `lease_id` must fail with
/// [`StoreError::LeaseMismatch`] when the supplied lease does not grant
/// access, distinguishable from the not-found errors.
pub trait PageBlobStore: Send + Sync {
    fn create_container_if_absent(&self, container: &str) -> Result<(), StoreError>;

    fn container_exists(&self, container: &str) -> Result<bool, StoreError>;

    fn blob_exists(&self, container: &str, blob: &str) -> Result<bool, StoreError>;

    /// Creates a page blob of exactly `size_bytes` bytes.
    fn create_page_blob(
        &self,
        container: &str,
        blob: &str,
        size_bytes: u64,
    ) -> Result<(), StoreError>;

    /// Writes `data` at `[offset, offset + data.len())` within the blob.
    fn write_range(
        &self,
        container: &str,
        blob: &str,
        offset: u64,
        data: &[u8],
    ) -> Result<(), StoreError>;

    /// Acquires an indefinite write lease and returns its token.
    fn acquire_lease(&self, container: &str, blob: &str) -> Result<String, StoreError>;

    fn get_properties(
        &self,
        container: &str,
        blob: &str,
        lease_id: &str,
    ) -> Result<BlobProperties, StoreError>;

    /// Sets one metadata key under the given lease. Used as the write
    /// probe that proves the lease grants write access.
    fn set_metadata(
        &self,
        container: &str,
        blob: &str,
        lease_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError>;
}
