//! Log entry definitions
//!
//! Defines the structure of individual log records and their on-disk frame.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::index::Timestamp;
use crate::txn::StagedWrite;

/// Frame header: LSN (8) + CRC (4) + Len (4) + Header CRC (4)
pub const HEADER_SIZE: usize = 20;

/// Bytes covered by the header CRC
const HEADER_BODY: usize = 16;

/// A single record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The committed effect this record carries
    pub operation: Operation,
}

/// Operations that can be logged
///
/// Every record is a committed effect. Transaction begin/abort never reach
/// the log; a committed transaction is a single `Commit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Set a key, clearing any expiry
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },

    /// Give a key an absolute deadline (unix millis)
    Expire { key: Vec<u8>, expires_at: Timestamp },

    /// Clear a key's deadline
    Persist { key: Vec<u8> },

    /// Several sets applied as one durable unit
    MultiSet { pairs: Vec<(Vec<u8>, Vec<u8>)> },

    /// Net effect of a committed transaction, in staged order
    Commit { writes: Vec<(Vec<u8>, StagedWrite)> },
}

/// Result of decoding one frame from the front of a buffer
#[derive(Debug)]
pub enum Frame {
    /// A well-formed record occupying `len` bytes
    Complete { entry: WalEntry, len: usize },

    /// The buffer ends before the frame does
    Incomplete,

    /// The frame is fully present (`len` bytes) but fails its checksum or decode
    Corrupt { len: usize, reason: String },

    /// The header fails its own checksum, so the frame length is unknown
    BadHeader { reason: String },
}

impl WalEntry {
    pub fn new(lsn: u64, operation: Operation) -> Self {
        Self { lsn, operation }
    }

    /// Encode the record as `lsn | crc | len | header_crc | body`
    ///
    /// `crc` covers the lsn, the length and the body. `header_crc` covers
    /// the 16 bytes before it, so the length can be trusted before the
    /// body is read.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(&self.operation)?;
        let len = body_len(&body)?;
        let crc = checksum(self.lsn, len, &body);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&len.to_le_bytes());
        let header_crc = crc32fast::hash(&bytes[..HEADER_BODY]);
        bytes.extend_from_slice(&header_crc.to_le_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode a single record from the start of `bytes`
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        match Self::decode_frame(bytes) {
            Frame::Complete { entry, .. } => Ok(entry),
            Frame::Incomplete => Err(LedgerError::CorruptLog(format!(
                "truncated record: {} bytes available",
                bytes.len()
            ))),
            Frame::Corrupt { reason, .. } | Frame::BadHeader { reason } => {
                Err(LedgerError::CorruptLog(reason))
            }
        }
    }

    /// Classify the frame at the start of `bytes`
    pub fn decode_frame(bytes: &[u8]) -> Frame {
        if bytes.len() < HEADER_SIZE {
            return Frame::Incomplete;
        }

        let stored_header_crc = u32::from_le_bytes(read_array(&bytes[16..20]));
        let actual_header_crc = crc32fast::hash(&bytes[..HEADER_BODY]);
        if actual_header_crc != stored_header_crc {
            return Frame::BadHeader {
                reason: format!(
                    "header checksum mismatch: stored {:#010x}, computed {:#010x}",
                    stored_header_crc, actual_header_crc
                ),
            };
        }

        let lsn = u64::from_le_bytes(read_array(&bytes[0..8]));
        let stored_crc = u32::from_le_bytes(read_array(&bytes[8..12]));
        let len = u32::from_le_bytes(read_array(&bytes[12..16]));

        // The length is trusted from here on
        let total = match HEADER_SIZE.checked_add(len as usize) {
            Some(total) if total <= bytes.len() => total,
            _ => return Frame::Incomplete,
        };
        let body = &bytes[HEADER_SIZE..total];

        let actual_crc = checksum(lsn, len, body);
        if actual_crc != stored_crc {
            return Frame::Corrupt {
                len: total,
                reason: format!(
                    "checksum mismatch at lsn {}: stored {:#010x}, computed {:#010x}",
                    lsn, stored_crc, actual_crc
                ),
            };
        }

        match bincode::deserialize::<Operation>(body) {
            Ok(operation) => Frame::Complete {
                entry: WalEntry { lsn, operation },
                len: total,
            },
            Err(e) => Frame::Corrupt {
                len: total,
                reason: format!("undecodable body at lsn {}: {}", lsn, e),
            },
        }
    }

    /// Size of the encoded frame in bytes
    pub fn serialized_size(&self) -> Result<usize> {
        let body_len = bincode::serialized_size(&self.operation)? as usize;
        Ok(HEADER_SIZE + body_len)
    }

    /// CRC32 over the LSN, the body length and the encoded body
    pub fn compute_crc(&self) -> Result<u32> {
        let body = bincode::serialize(&self.operation)?;
        Ok(checksum(self.lsn, body_len(&body)?, &body))
    }
}

fn body_len(body: &[u8]) -> Result<u32> {
    u32::try_from(body.len()).map_err(|_| {
        LedgerError::Serialization(format!("record body too large: {} bytes", body.len()))
    })
}

fn checksum(lsn: u64, len: u32, body: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&lsn.to_le_bytes());
    hasher.update(&len.to_le_bytes());
    hasher.update(body);
    hasher.finalize()
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
