//! TSID Generator
//!
//! Time-Sorted IDs as 13-character Crockford Base32 strings. Used for
//! account client IDs and execution IDs.

use std::sync::atomic::{AtomicU16, Ordering};

use chrono::Utc;

/// Crockford Base32 alphabet (excludes I, L, O, U)
const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const TSID_LEN: usize = 13;

static COUNTER: AtomicU16 = AtomicU16::new(0);

/// Source of short unique identifiers.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// `IdGenerator` backed by [`TsidGenerator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TsidIdGenerator;

impl IdGenerator for TsidIdGenerator {
    fn new_id(&self) -> String {
        TsidGenerator::generate()
    }
}

/// TSID Generator for creating unique, time-sorted identifiers
pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID, e.g. "0HZXEQ5Y8JY5Z"
    ///
    /// TSID structure (64 bits):
    /// - 42 bits: timestamp (milliseconds since epoch)
    /// - 10 bits: random component
    /// - 12 bits: counter (4096 unique IDs per millisecond)
    pub fn generate() -> String {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let counter = COUNTER.fetch_add(1, Ordering::SeqCst) as u64;
        let random = rand::random::<u16>() as u64 & 0x3FF;

        let tsid = ((now & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | (counter & 0xFFF);

        encode_crockford(tsid)
    }
}

fn encode_crockford(mut value: u64) -> String {
    let mut result = [b'0'; TSID_LEN];

    for slot in result.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }

    result.iter().map(|&b| b as char).collect()
}
