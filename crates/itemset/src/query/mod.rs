//! Query surface: specification and chaining, planning, projection, and
//! consumption.
//!
//! Intent construction is pure and validated eagerly; remote work happens
//! only when a query set is consumed.

pub mod plan;
pub mod predicate;
pub mod project;
pub mod set;


pub use plan::{OrderDirection, OrderKey};
pub use predicate::{CompareOp, ComparePredicate, Predicate};
pub use project::{OutputShape, Projected};
pub use set::{FolderExt, QuerySet, Selection};
