use crate::{error::RemoteError, query::predicate::Predicate, value::Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Field name of the universal item identifier.
pub const ITEM_ID: &str = "item_id";

/// Field name of the universal change key (version token).
pub const CHANGE_KEY: &str = "changekey";

/// True when `field` is one of the two universal identity fields.
///
/// Identity fields are always available without additional remote cost and
/// never count against the fetched field set.
#[must_use]
pub fn is_identity_field(field: &str) -> bool {
    field == ITEM_ID || field == CHANGE_KEY
}

///
/// ItemRef
///
/// Minimal addressable reference to a remote item: identifier plus
/// version/change token.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ItemRef {
    pub id: String,
    pub change_key: String,
}

impl ItemRef {
    pub fn new(id: impl Into<String>, change_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            change_key: change_key.into(),
        }
    }

    /// Identity field value by name, `None` for non-identity fields.
    #[must_use]
    pub fn identity_value(&self, field: &str) -> Option<Value> {
        match field {
            ITEM_ID => Some(Value::Text(self.id.clone())),
            CHANGE_KEY => Some(Value::Text(self.change_key.clone())),
            _ => None,
        }
    }
}

///
/// Row
///
/// Planner and cache element: either a raw identity pair from the id-only
/// shortcut or a hydrated item. Threading this sum type through projection
/// keeps field access type-safe on both paths.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Row<I> {
    Id(ItemRef),
    Item(I),
}

impl<I: ItemFields> Row<I> {
    /// Identity pair for this row. Items always carry their own identity.
    #[must_use]
    pub fn item_ref(&self) -> ItemRef {
        match self {
            Self::Id(id) => id.clone(),
            Self::Item(item) => item.item_ref(),
        }
    }

    /// Field value for this row, `Null` when unset or never fetched.
    /// Identity fields always resolve, on both row variants.
    #[must_use]
    pub fn field_value(&self, field: &str) -> Value {
        match self {
            Self::Id(id) => id.identity_value(field).unwrap_or(Value::Null),
            Self::Item(item) => item
                .field_value(field)
                .or_else(|| item.item_ref().identity_value(field))
                .unwrap_or(Value::Null),
        }
    }
}

///
/// AffectedOccurrences
///
/// Recurrence policy handed to the bulk-delete collaborator.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AffectedOccurrences {
    All,
    SpecifiedOnly,
}

///
/// ItemFields
///
/// Field-access contract for hydrated items. `field_value` returns `None`
/// for fields that were never fetched; `clear_field` resets a field to that
/// not-fetched state.
///

pub trait ItemFields {
    fn field_value(&self, field: &str) -> Option<Value>;

    fn clear_field(&mut self, field: &str);

    fn item_ref(&self) -> ItemRef;
}

///
/// Folder
///
/// Remote item-collection collaborator. The engine performs no I/O of its
/// own; all waiting happens inside these calls, which are treated as
/// blocking. A `None` predicate means "match everything".
///

pub trait Folder {
    type Item: ItemFields + Clone;

    /// Full supported field catalog, excluding identity fields.
    fn allowed_field_names(&self) -> BTreeSet<String>;

    /// Subset of the catalog the listing service cannot return directly.
    fn complex_field_names(&self) -> BTreeSet<String>;

    /// Id-only listing: identity pairs for every matching item.
    fn find_item_ids(&self, predicate: Option<&Predicate>) -> Result<Vec<ItemRef>, RemoteError>;

    /// Field-restricted listing: hydrated items carrying `additional_fields`.
    ///
    /// Callers must not pass complex fields here; those require `fetch`.
    fn find_items(
        &self,
        predicate: Option<&Predicate>,
        additional_fields: &[String],
    ) -> Result<Vec<Self::Item>, RemoteError>;

    /// By-id hydration for a known set of identities.
    fn fetch(
        &self,
        ids: &[ItemRef],
        only_fields: &[String],
    ) -> Result<Vec<Self::Item>, RemoteError>;

    /// Bulk delete on the owning account, returning the deleted count.
    fn bulk_delete(
        &self,
        ids: Vec<ItemRef>,
        affected: AffectedOccurrences,
    ) -> Result<usize, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_fields_are_recognised() {
        assert!(is_identity_field(ITEM_ID));
        assert!(is_identity_field(CHANGE_KEY));
        assert!(!is_identity_field("subject"));
    }

    #[test]
    fn item_ref_exposes_identity_values_by_name() {
        let id = ItemRef::new("AAMk01", "CQAAABYA");
        assert_eq!(id.identity_value(ITEM_ID), Some(Value::Text("AAMk01".into())));
        assert_eq!(
            id.identity_value(CHANGE_KEY),
            Some(Value::Text("CQAAABYA".into()))
        );
        assert_eq!(id.identity_value("subject"), None);
    }
}
