//! itemset — a lazy, chainable query-set engine for remote folder-item
//! services.
//!
//! A [`QuerySet`] defers all work until its results are consumed. Chaining
//! calls (`filter`, `only`, `order_by`, `values`, ...) copy the
//! specification and return independent instances; consumption plans the
//! cheapest remote retrieval (id-only shortcut, direct field-restricted
//! listing, or two-stage fetch for complex fields), applies stable
//! multi-key ordering, and materializes into a per-instance cache.
//!
//! ## Crate layout
//! - `error`: shared error surface for chaining validation and execution.
//! - `folder`: remote-collection collaborator traits and identity types.
//! - `obs`: ephemeral remote-call accounting.
//! - `query`: specification, planner, projection formatters, consumption.
//! - `value`: field value model and canonical comparator.

pub mod error;
pub mod folder;
pub mod obs;
pub mod query;
pub mod value;

pub use error::{ArgumentError, CallSite, Error, RemoteError};
pub use folder::{
    AffectedOccurrences, CHANGE_KEY, Folder, ITEM_ID, ItemFields, ItemRef, Row,
};
pub use query::{
    CompareOp, ComparePredicate, FolderExt, OrderDirection, OrderKey, OutputShape, Predicate,
    Projected, QuerySet, Selection,
};
pub use value::Value;

/// Crate version re-export for downstream tooling and tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        AffectedOccurrences, Error, Folder, ItemFields, ItemRef, Predicate, Projected, QuerySet,
        RemoteError, Row, Value,
    };

    pub use crate::FolderExt as _;
}
