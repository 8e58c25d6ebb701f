//! Client facade: composes validation, provisioning, transport, and the
//! wire codec into the four disk operations.

use std::sync::Arc;

use tracing::info;

use crate::codec;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::provision;
use crate::response;
use crate::store::PageBlobStore;
use crate::transport::{ChannelOpener, CommandCode, DeviceChannel, Transport};
use crate::types::{sector_count_for, size_gb_from_sectors, Disk, GIB};
use crate::validate::{self, DnsResolver, HostResolver};
use crate::vhd::HeaderCodec;

/// Control-plane client for one storage account.
///
/// Precondition: a single local instance is privileged to operate on the
/// driver's channel, and callers serialize operations. Each operation
/// opens its own short-lived channel handle, so the handle is never
/// shared across operations; the driver itself offers no cross-call
/// isolation (a list's per-name gets are not one transaction).
pub struct Client {
    account_name: String,
    account_key: String,
    channel: Box<dyn ChannelOpener>,
    store: Arc<dyn PageBlobStore>,
    header_codec: Option<Arc<dyn HeaderCodec>>,
    resolver: Box<dyn HostResolver>,
}

impl Client {
    pub fn new(
        account_name: impl Into<String>,
        account_key: impl Into<String>,
        channel: Box<dyn ChannelOpener>,
        store: Arc<dyn PageBlobStore>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: account_key.into(),
            channel,
            store,
            header_codec: None,
            resolver: Box::new(DnsResolver),
        }
    }

    /// Client wired to the device node named by `config`.
    pub fn from_config(config: &ClientConfig, store: Arc<dyn PageBlobStore>) -> Result<Self> {
        config.validate()?;
        let channel = Box::new(DeviceChannel::new(config.device.clone(), config.timeout()));
        Ok(Self::new(
            config.account_name.clone(),
            config.account_key.clone(),
            channel,
            store,
        ))
    }

    /// Codec used to stamp disk-image headers during provisioning.
    pub fn with_header_codec(mut self, codec: Arc<dyn HeaderCodec>) -> Self {
        self.header_codec = Some(codec);
        self
    }

    pub fn with_resolver(mut self, resolver: Box<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Mounts the disk described by `d`.
    ///
    /// Enriches the descriptor in place (account identity, sector count
    /// from the blob's true size, derived host, resolved ip), validates
    /// it, and on success copies the driver-assigned `major`/`minor`
    /// back into it. A driver-reported failure surfaces its message
    /// verbatim.
    pub fn mount(&self, d: &mut Disk) -> Result<()> {
        let mut transport = self.channel.open()?;

        self.pre_mount(d)?;

        let frame = codec::encode(d)?;
        let buffer = transport.execute(CommandCode::Mount, &frame)?;
        let reply = response::parse(&buffer)?;
        if reply.is_error {
            return Err(Error::Driver(reply.payload));
        }

        let mounted = codec::decode(&reply.payload)?;
        d.major = mounted.major;
        d.minor = mounted.minor;
        info!(name = %d.name, major = ?d.major, minor = ?d.minor, "mounted disk");
        Ok(())
    }

    /// Unmounts the disk named `name`.
    pub fn unmount(&self, name: &str) -> Result<()> {
        validate::validate_device_name(name)?;

        let mut transport = self.channel.open()?;
        let buffer = transport.execute(CommandCode::Unmount, &framed_name(name))?;
        let reply = response::parse(&buffer)?;
        if reply.is_error {
            return Err(Error::Driver(reply.payload));
        }
        info!(name, "unmounted disk");
        Ok(())
    }

    /// Fetches the descriptor of a mounted disk by name.
    pub fn get(&self, name: &str) -> Result<Disk> {
        validate::validate_device_name(name)?;
        let mut transport = self.channel.open()?;
        self.get_over(transport.as_mut(), name)
    }

    /// Lists all mounted disks.
    ///
    /// The driver returns only names; each is fetched with a sequential
    /// get over the same handle. The first failing get aborts the whole
    /// list — no partial results are returned.
    pub fn list(&self) -> Result<Vec<Disk>> {
        let mut transport = self.channel.open()?;

        let buffer = transport.execute(CommandCode::List, "-")?;
        let reply = response::parse(&buffer)?;
        if reply.is_error {
            return Err(Error::Driver(reply.payload));
        }

        let mut disks = Vec::new();
        for name in reply.payload.split('\n').filter(|name| !name.is_empty()) {
            disks.push(self.get_over(transport.as_mut(), name)?);
        }
        Ok(disks)
    }

    /// Provisions the backing page blob and returns its write lease.
    /// See [`provision::create_page_blob`].
    pub fn create_page_blob(
        &self,
        size_gb: u64,
        container: &str,
        blob: &str,
        is_image_format: bool,
    ) -> Result<String> {
        provision::create_page_blob(
            self.store.as_ref(),
            self.header_codec.as_deref(),
            size_gb,
            container,
            blob,
            is_image_format,
        )
    }

    /// Pre-mount enrichment and validation: stamp the account identity,
    /// derive the sector count from the blob's true size (minus the
    /// image header when present), then run field and lease validation.
    fn pre_mount(&self, d: &mut Disk) -> Result<()> {
        d.account_name = self.account_name.clone();
        d.account_key = self.account_key.clone();

        let (container, blob) = d.split_path()?;
        let props = self
            .store
            .get_properties(container, blob, &d.lease_id)?;
        d.sector_count = sector_count_for(props.content_length, d.is_image_format);
        d.size_gb = props.content_length / GIB;

        validate::validate_disk(d, self.resolver.as_ref())?;
        validate::validate_lease(d, self.store.as_ref())
    }

    fn get_over(&self, transport: &mut dyn Transport, name: &str) -> Result<Disk> {
        validate::validate_device_name(name)?;

        let buffer = transport.execute(CommandCode::Get, &framed_name(name))?;
        let reply = response::parse(&buffer)?;
        if reply.is_error {
            return Err(Error::Driver(reply.payload));
        }

        let mut d = codec::decode(&reply.payload)?;
        // Post-get normalization: the driver only knows sectors.
        d.size_gb = size_gb_from_sectors(d.sector_count, d.is_image_format);
        Ok(d)
    }
}

/// Name payload framing for unmount and get.
fn framed_name(name: &str) -> String {
    format!("{name}\n\0")
}
