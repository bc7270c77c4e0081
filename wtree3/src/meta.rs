use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// On-disk representation of a persisted index descriptor (spec §3/§6):
///
/// ```text
/// offset  size   field
/// 0       4      schema_version (little-endian)
/// 4       1      flags byte (bit 0 unique, bit 1 sparse; bits 2..7 reserved)
/// 5       4      user_data length N (little-endian)
/// 9       N      user_data bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub schema_version: u32,
    pub flags: u8,
    pub user_data: Vec<u8>,
}

const HEADER_LEN: usize = 4 + 1 + 4;

impl MetadataRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.user_data.len());
        let mut header = [0u8; HEADER_LEN];
        LittleEndian::write_u32(&mut header[0..4], self.schema_version);
        header[4] = self.flags;
        LittleEndian::write_u32(&mut header[5..9], self.user_data.len() as u32);
        buf.extend_from_slice(&header);
        buf.extend_from_slice(&self.user_data);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::einval("metadata record shorter than its fixed header"));
        }
        let schema_version = LittleEndian::read_u32(&bytes[0..4]);
        // Reserved flag bits (2..7) must be zero on write and are ignored on read.
        let flags = bytes[4];
        let user_data_len = LittleEndian::read_u32(&bytes[5..9]) as usize;
        let rest = &bytes[HEADER_LEN..];
        if rest.len() != user_data_len {
            return Err(Error::einval(format!(
                "metadata record declares user_data length {user_data_len} but has {} bytes remaining",
                rest.len()
            )));
        }
        Ok(MetadataRecord { schema_version, flags, user_data: rest.to_vec() })
    }
}
