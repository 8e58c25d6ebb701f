//! Provisioner: creates the backing page blob ahead of first mount.

use tracing::info;

use crate::error::{Error, Result};
use crate::store::PageBlobStore;
use crate::types::GIB;
use crate::vhd::{HeaderCodec, VHD_HEADER_SIZE};

/// Creates the backing blob at `size_gb` gigabytes, optionally stamps a
/// disk-image header at its tail, acquires the write lease, and returns
/// the lease token.
///
/// A failure at any step aborts the sequence and surfaces the underlying
/// store error. No partial cleanup is attempted: a blob created before a
/// later step failed stays behind.
pub fn create_page_blob(
    store: &dyn PageBlobStore,
    header_codec: Option<&dyn HeaderCodec>,
    size_gb: u64,
    container: &str,
    blob: &str,
    is_image_format: bool,
) -> Result<String> {
    if size_gb == 0 {
        return Err(Error::Store(crate::error::StoreError::InvalidSize {
            reason: "size must be > 0",
        }));
    }
    let size_bytes = size_gb * GIB;

    store.create_container_if_absent(container)?;
    store.create_page_blob(container, blob, size_bytes)?;
    info!(container, blob, size_gb, "created page blob");

    if is_image_format {
        let codec = header_codec.ok_or(Error::HeaderCodecRequired)?;
        let header = codec.fixed_header(size_bytes)?;
        if header.len() as u64 != VHD_HEADER_SIZE {
            return Err(Error::HeaderSize {
                expected: VHD_HEADER_SIZE,
                actual: header.len() as u64,
            });
        }
        store.write_range(container, blob, size_bytes - VHD_HEADER_SIZE, &header)?;
        info!(container, blob, "wrote disk-image header at blob tail");
    }

    let lease_id = store.acquire_lease(container, blob)?;
    Ok(lease_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::InMemoryStore;

    struct StubCodec {
        size: usize,
    }

    impl HeaderCodec for StubCodec {
        fn fixed_header(&self, capacity_bytes: u64) -> Result<Vec<u8>> {
            let mut header = vec![0xAB; self.size];
            if self.size >= 8 {
                header[..8].copy_from_slice(&capacity_bytes.to_be_bytes());
            }
            Ok(header)
        }
    }

    #[test]
    fn provisions_plain_blob_with_lease() {
        let store = InMemoryStore::new();
        let lease = create_page_blob(&store, None, 1, "vols", "disk1", false).unwrap();
        assert!(!lease.is_empty());

        let props = store.get_properties("vols", "disk1", &lease).unwrap();
        assert_eq!(props.content_length, GIB);
        assert!(store.writes("vols", "disk1").is_empty());
    }

    #[test]
    fn image_format_header_lands_at_tail() {
        let store = InMemoryStore::new();
        let codec = StubCodec { size: 512 };
        create_page_blob(&store, Some(&codec), 1, "vols", "disk1", true).unwrap();

        let writes = store.writes("vols", "disk1");
        assert_eq!(writes.len(), 1);
        let (offset, data) = &writes[0];
        assert_eq!(*offset, GIB - VHD_HEADER_SIZE);
        assert_eq!(data.len() as u64, VHD_HEADER_SIZE);
        assert_eq!(&data[..8], &GIB.to_be_bytes());
    }

    #[test]
    fn image_format_requires_codec() {
        let store = InMemoryStore::new();
        assert!(matches!(
            create_page_blob(&store, None, 1, "vols", "disk1", true),
            Err(Error::HeaderCodecRequired)
        ));
    }

    #[test]
    fn wrong_header_size_aborts_before_write() {
        let store = InMemoryStore::new();
        let codec = StubCodec { size: 511 };
        assert!(matches!(
            create_page_blob(&store, Some(&codec), 1, "vols", "disk1", true),
            Err(Error::HeaderSize {
                expected: 512,
                actual: 511
            })
        ));
        assert!(store.writes("vols", "disk1").is_empty());
        // Known limitation: the blob itself was already created.
        assert!(store.blob_exists("vols", "disk1").unwrap());
    }

    #[test]
    fn zero_size_is_rejected() {
        let store = InMemoryStore::new();
        assert!(matches!(
            create_page_blob(&store, None, 0, "vols", "disk1", false),
            Err(Error::Store(StoreError::InvalidSize { .. }))
        ));
    }
}
