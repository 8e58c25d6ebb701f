//! pagebd: control-plane client for a page-blob-backed virtual block device.
//!
//! The block device itself lives in a kernel driver; its backing store is
//! a cloud page blob. This crate owns the control protocol between the
//! two: it serializes a disk descriptor into the driver's fixed-size
//! command buffer, exchanges it over the device node, parses the response,
//! and reconciles the descriptor with the blob's real state (existence,
//! type, write lease) before any mount is attempted.
//!
//! # Library Usage
//!
//! ```ignore
//! use pagebd::{Client, ClientConfig, Disk, DiskType};
//!
//! let config = ClientConfig::load(path)?;
//! let client = Client::from_config(&config, store)?;
//!
//! let lease = client.create_page_blob(1, "vols", "disk1", false)?;
//! let mut disk = Disk::new(DiskType::ReadWrite, "disk1", "/vols/disk1");
//! disk.lease_id = lease;
//! client.mount(&mut disk)?;
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod provision;
pub mod response;
pub mod store;
pub mod transport;
pub mod types;
pub mod validate;
pub mod vhd;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{
    ConfigError, Error, ProtocolError, Result, StoreError, TransportError, ValidationError,
};
pub use response::DriverReply;
pub use store::{BlobProperties, BlobType, InMemoryStore, PageBlobStore};
pub use transport::{
    ChannelOpener, CommandCode, DeviceChannel, Transport, DEFAULT_TIMEOUT, REQUEST_BUFFER_SIZE,
};
pub use types::{Disk, DiskType, GIB, SECTOR_SIZE};
pub use validate::{DnsResolver, HostResolver};
pub use vhd::{HeaderCodec, VHD_HEADER_SIZE};
