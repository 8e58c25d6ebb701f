//! Wire codec: the positional descriptor frame exchanged with the driver.
//!
//! The frame is a newline-delimited field sequence whose order is part of
//! the driver ABI and must never change without a version bump. Both
//! directions share the single field-index schema below; no field may
//! contain a newline.
//!
//! Requests carry ten fields. Driver responses carry the same nine leading
//! fields, then the driver-assigned `major` and `minor`, then the image
//! flag — twelve in total. Decode detects the shape from the field count.

use crate::error::ProtocolError;
use crate::types::{Disk, DiskType};

// Shared positional schema. Request form ends at IMAGE_REQ; the driver's
// response form inserts major/minor before the image flag.
const TYPE: usize = 0;
const NAME: usize = 1;
const SECTOR_COUNT: usize = 2;
const ACCOUNT_NAME: usize = 3;
const ACCOUNT_KEY: usize = 4;
const PATH: usize = 5;
const HOST: usize = 6;
const IP: usize = 7;
const LEASE_ID: usize = 8;
const IMAGE_REQ: usize = 9;
const MAJOR: usize = 9;
const MINOR: usize = 10;
const IMAGE_RESP: usize = 11;

const REQUEST_FIELDS: usize = 10;
const RESPONSE_FIELDS: usize = 12;

/// Encodes a descriptor into the request frame, trailing newline included.
///
/// `major`/`minor` are never encoded; the driver assigns them.
pub fn encode(d: &Disk) -> Result<String, ProtocolError> {
    for (field, value) in [
        ("name", d.name.as_str()),
        ("account_name", d.account_name.as_str()),
        ("account_key", d.account_key.as_str()),
        ("path", d.path.as_str()),
        ("host", d.host.as_str()),
        ("ip", d.ip.as_str()),
        ("lease_id", d.lease_id.as_str()),
    ] {
        if value.contains('\n') {
            return Err(ProtocolError::EmbeddedNewline { field });
        }
    }

    Ok(format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
        d.disk_type.as_str(),
        d.name,
        d.sector_count,
        d.account_name,
        d.account_key,
        d.path,
        d.host,
        d.ip,
        d.lease_id,
        if d.is_image_format { 1 } else { 0 },
    ))
}

/// Decodes a request or response frame back into a descriptor.
///
/// Numeric parse failures are fatal — the frame is a fixed ABI and a
/// garbled field means the exchange cannot be trusted. `size_gb` is left
/// at zero; callers recompute it from the sector count (post-get
/// normalization).
pub fn decode(frame: &str) -> Result<Disk, ProtocolError> {
    let mut fields: Vec<&str> = frame.split('\n').collect();
    while fields.last() == Some(&"") {
        fields.pop();
    }

    let (image_idx, driver_form) = match fields.len() {
        REQUEST_FIELDS => (IMAGE_REQ, false),
        RESPONSE_FIELDS => (IMAGE_RESP, true),
        actual => return Err(ProtocolError::FieldCount { actual }),
    };

    let disk_type =
        DiskType::from_str(fields[TYPE]).ok_or_else(|| ProtocolError::InvalidDiskType {
            token: fields[TYPE].to_string(),
        })?;
    let sector_count = parse_u64("sector_count", fields[SECTOR_COUNT])?;
    let is_image_format = match fields[image_idx] {
        "0" => false,
        "1" => true,
        other => {
            return Err(ProtocolError::InvalidNumber {
                field: "is_image_format",
                value: other.to_string(),
            });
        }
    };

    let (major, minor) = if driver_form {
        (
            Some(parse_u32("major", fields[MAJOR])?),
            Some(parse_u32("minor", fields[MINOR])?),
        )
    } else {
        (None, None)
    };

    Ok(Disk {
        disk_type,
        name: fields[NAME].to_string(),
        sector_count,
        size_gb: 0,
        account_name: fields[ACCOUNT_NAME].to_string(),
        account_key: fields[ACCOUNT_KEY].to_string(),
        path: fields[PATH].to_string(),
        host: fields[HOST].to_string(),
        ip: fields[IP].to_string(),
        lease_id: fields[LEASE_ID].to_string(),
        is_image_format,
        major,
        minor,
    })
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_disk() -> Disk {
        Disk {
            disk_type: DiskType::ReadWrite,
            name: "disk1".to_string(),
            sector_count: 2_097_152,
            size_gb: 0,
            account_name: "acct".to_string(),
            account_key: "a2V5".to_string(),
            path: "/vols/disk1".to_string(),
            host: "acct.blob.core.windows.net".to_string(),
            ip: "10.0.0.1".to_string(),
            lease_id: "lease-1".to_string(),
            is_image_format: false,
            major: None,
            minor: None,
        }
    }

    #[test]
    fn roundtrip() {
        let d = sample_disk();
        let decoded = decode(&encode(&d).unwrap()).unwrap();
        assert_eq!(decoded, d);
    }

    #[test]
    fn roundtrip_image_format() {
        let mut d = sample_disk();
        d.is_image_format = true;
        d.sector_count = 2_097_151;
        let decoded = decode(&encode(&d).unwrap()).unwrap();
        assert_eq!(decoded, d);
    }

    #[test]
    fn encode_field_order_is_fixed() {
        let frame = encode(&sample_disk()).unwrap();
        assert_eq!(
            frame,
            "rw\ndisk1\n2097152\nacct\na2V5\n/vols/disk1\n\
             acct.blob.core.windows.net\n10.0.0.1\nlease-1\n0\n"
        );
    }

    #[test]
    fn decode_driver_form_sets_device_numbers() {
        let frame = "rw\ndisk1\n2097152\nacct\na2V5\n/vols/disk1\n\
                     acct.blob.core.windows.net\n10.0.0.1\nlease-1\n252\n0\n0\n";
        let d = decode(frame).unwrap();
        assert_eq!(d.major, Some(252));
        assert_eq!(d.minor, Some(0));
        assert!(!d.is_image_format);
        assert_eq!(d.sector_count, 2_097_152);
    }

    #[test]
    fn decode_rejects_garbled_sector_count() {
        let frame = "rw\ndisk1\nnot-a-number\nacct\na2V5\n/vols/disk1\nh\ni\nlease-1\n0\n";
        assert!(matches!(
            decode(frame),
            Err(ProtocolError::InvalidNumber {
                field: "sector_count",
                ..
            })
        ));
    }

    #[test]
    fn decode_rejects_garbled_major() {
        let frame = "rw\ndisk1\n2097152\nacct\na2V5\n/vols/disk1\nh\ni\nlease-1\nxx\n0\n0\n";
        assert!(matches!(
            decode(frame),
            Err(ProtocolError::InvalidNumber { field: "major", .. })
        ));
    }

    #[test]
    fn decode_rejects_unknown_type_token() {
        let frame = "RW\ndisk1\n2097152\nacct\na2V5\n/vols/disk1\nh\ni\nlease-1\n0\n";
        assert!(matches!(
            decode(frame),
            Err(ProtocolError::InvalidDiskType { .. })
        ));
    }

    #[test]
    fn decode_rejects_wrong_field_count() {
        assert!(matches!(
            decode("rw\ndisk1\n"),
            Err(ProtocolError::FieldCount { actual: 2 })
        ));
    }

    #[test]
    fn encode_rejects_embedded_newline() {
        let mut d = sample_disk();
        d.lease_id = "bad\nlease".to_string();
        assert!(matches!(
            encode(&d),
            Err(ProtocolError::EmbeddedNewline { field: "lease_id" })
        ));
    }
}
