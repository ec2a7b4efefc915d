//! Shared building blocks: errors, identifiers, tokens, time and indexes.

pub mod error;
pub mod tsid;
pub mod token;
pub mod clock;
pub mod expiration;
pub mod indexes;

pub use error::{StoreError, Result};
pub use tsid::{TsidGenerator, IdGenerator, TsidIdGenerator};
pub use token::{TokenGenerator, RandomTokenGenerator};
pub use clock::{Clock, SystemClock, FixedClock};
pub use expiration::{expires_at, SECONDS_PER_DAY, NEVER_EXPIRES};
