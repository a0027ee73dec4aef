//! Advisory locks on named resources.
//!
//! A lock belongs to one owner until it expires. The owner may take it again
//! (which refreshes the expiration); anyone may take it once it has expired.
//! Nothing ever blocks: a refused attempt returns the lock that is in the way
//! so the caller can decide what to do.

pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod resource;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_LOCK_DELAY, LockConfig};
pub use error::{LockError, Result};
pub use manager::{LockManager, lock_owned, lock_released};
pub use resource::LockedResource;
