//! Disk-image header seam.
//!
//! Authoring of the header format itself is delegated to an external codec;
//! this module only fixes the seam: the header's size, which participates in
//! every sector/size computation, and the trait the provisioner calls to
//! obtain the bytes it writes at the blob's tail.

use crate::error::Result;

/// Fixed size in bytes of the trailing disk-image header (VHD-style footer).
pub const VHD_HEADER_SIZE: u64 = 512;

/// Produces the fixed-size header for a disk of a given capacity.
///
/// The returned buffer must be exactly [`VHD_HEADER_SIZE`] bytes; the
/// provisioner rejects anything else before touching the blob.
pub trait HeaderCodec: Send + Sync {
    fn fixed_header(&self, capacity_bytes: u64) -> Result<Vec<u8>>;
}
