//! Data preparation model.
//!
//! Value objects shared by the transformation pipeline and the preparation
//! history:
//!
//! - **row**: [`DataSetRow`], the mutable field map pushed through a pipeline
//! - **metadata**: [`RowMetadata`], the row schema mutated in place by actions
//! - **action**: [`Action`], an action descriptor (name + parameters)
//! - **preparation**: [`PreparationActions`], [`Step`], [`Preparation`] and the
//!   [`AppendStep`] unit used to extend or rewrite a history
//! - **ids**: the fixed-width column identifier codec
//! - **hash**: content hashing used for content-addressed ids

pub mod action;
pub mod error;
pub mod hash;
pub mod ids;
pub mod metadata;
pub mod preparation;
pub mod row;

pub use action::{Action, COLUMN_ID, SCOPE};
pub use error::{ModelError, Result};
pub use hash::{content_id, sha256_hex};
pub use ids::{ColumnIds, compare_column_ids, format_column_id, parse_column_id};
pub use metadata::{ColumnMetadata, RowMetadata, Statistics};
pub use preparation::{
    AppendStep, Identifiable, Preparation, PreparationActions, Step, StepDiff,
};
pub use row::DataSetRow;
