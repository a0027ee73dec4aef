//! Preparation history management.
//!
//! A preparation's history is a chain of immutable steps ending at its head.
//! [`PreparationService`] extends it, rewrites it in the middle (renumbering
//! the column ids that later steps refer to) and moves the head. Every
//! rewrite computes and stores the new steps first and then moves the head
//! once, so a failure leaves the preparation where it was.
//!
//! Mutations assume the caller holds the preparation's lock; [`EditSession`]
//! takes and releases it.

pub mod catalog;
pub mod config;
pub mod error;
pub mod listing;
pub mod renumber;
pub mod service;
pub mod session;

pub use catalog::{DataSetCatalog, StaticDataSetCatalog};
pub use config::DataSetsConfig;
pub use error::{HistoryError, Result};
pub use listing::{ListQuery, NameMatch, SortKey, SortOrder};
pub use renumber::ColumnShift;
pub use service::{LOOKUP_ACTION, LOOKUP_DATA_SET_PARAMETER, PreparationService, Version};
pub use session::EditSession;
