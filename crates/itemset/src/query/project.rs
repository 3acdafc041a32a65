use crate::{
    error::{ArgumentError, CallSite, Error},
    folder::{ItemFields, ItemRef, Row},
    value::Value,
};
use std::collections::BTreeMap;

///
/// OutputShape
///
/// Result-shape tag. A single switch at consumption time selects the
/// formatter; no per-element dynamic dispatch.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputShape {
    #[default]
    Full,
    Values,
    ValuesList,
    Flat,
}

///
/// Projected
///
/// One element of a consumed query set, shaped per [`OutputShape`]. `Full`
/// passes planner rows through unchanged, so the id-only shortcut surfaces
/// as `Id` rather than a hollow item.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Projected<I> {
    Item(I),
    Id(ItemRef),
    Values(BTreeMap<String, Value>),
    Row(Vec<Value>),
    Scalar(Value),
}

impl<I> Projected<I> {
    #[must_use]
    pub fn into_item(self) -> Option<I> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_id(self) -> Option<ItemRef> {
        match self {
            Self::Id(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_values(self) -> Option<BTreeMap<String, Value>> {
        match self {
            Self::Values(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_row(self) -> Option<Vec<Value>> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

///
/// Projector
///
/// Stateless per-row formatter. Construction re-checks shape invariants
/// once per consumption; `project` itself is infallible and eager per
/// element, so callers never observe partially formatted rows.
///

#[derive(Debug)]
pub(crate) struct Projector {
    shape: OutputShape,
    fields: Vec<String>,
}

impl Projector {
    pub(crate) fn new(shape: OutputShape, only_fields: Option<&[String]>) -> Result<Self, Error> {
        let fields = only_fields.map(<[String]>::to_vec).unwrap_or_default();

        match shape {
            OutputShape::Full => {}
            OutputShape::Values if fields.is_empty() => {
                return Err(ArgumentError::RequiresFields {
                    origin: CallSite::Values,
                }
                .into());
            }
            OutputShape::ValuesList if fields.is_empty() => {
                return Err(ArgumentError::RequiresFields {
                    origin: CallSite::ValuesList,
                }
                .into());
            }
            OutputShape::Flat if fields.len() != 1 => {
                return Err(ArgumentError::FlatRequiresOneField {
                    found: fields.len(),
                }
                .into());
            }
            _ => {}
        }

        Ok(Self { shape, fields })
    }

    pub(crate) fn project<I: ItemFields + Clone>(&self, row: &Row<I>) -> Projected<I> {
        match self.shape {
            OutputShape::Full => match row {
                Row::Id(id) => Projected::Id(id.clone()),
                Row::Item(item) => Projected::Item(item.clone()),
            },
            OutputShape::Values => Projected::Values(self.values_map(row)),
            OutputShape::ValuesList => Projected::Row(self.values_row(row)),
            // Arity checked in `new`.
            OutputShape::Flat => Projected::Scalar(row.field_value(&self.fields[0])),
        }
    }

    /// Mapping projection. Identity-pair rows emit only the identity keys
    /// that were actually requested.
    fn values_map<I: ItemFields>(&self, row: &Row<I>) -> BTreeMap<String, Value> {
        match row {
            Row::Id(id) => self
                .fields
                .iter()
                .filter_map(|field| {
                    id.identity_value(field)
                        .map(|value| (field.clone(), value))
                })
                .collect(),
            Row::Item(_) => self
                .fields
                .iter()
                .map(|field| (field.clone(), row.field_value(field)))
                .collect(),
        }
    }

    /// Tuple projection, values in requested field order. Identity-pair rows
    /// shrink to the requested identity values only.
    fn values_row<I: ItemFields>(&self, row: &Row<I>) -> Vec<Value> {
        match row {
            Row::Id(id) => self
                .fields
                .iter()
                .filter_map(|field| id.identity_value(field))
                .collect(),
            Row::Item(_) => self
                .fields
                .iter()
                .map(|field| row.field_value(field))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArgumentError;
    use crate::folder::{CHANGE_KEY, ITEM_ID};

    #[derive(Clone, Debug, PartialEq)]
    struct Bare(ItemRef);

    impl ItemFields for Bare {
        fn field_value(&self, field: &str) -> Option<Value> {
            self.0.identity_value(field)
        }

        fn clear_field(&mut self, _field: &str) {}

        fn item_ref(&self) -> ItemRef {
            self.0.clone()
        }
    }

    fn id_row() -> Row<Bare> {
        Row::Id(ItemRef::new("id-1", "ck-1"))
    }

    #[test]
    fn values_requires_at_least_one_field() {
        let err = Projector::new(OutputShape::Values, Some(&[])).unwrap_err();
        assert!(matches!(
            err,
            Error::Argument(ArgumentError::RequiresFields {
                origin: CallSite::Values
            })
        ));
    }

    #[test]
    fn flat_requires_exactly_one_field() {
        let fields = vec!["item_id".to_string(), "changekey".to_string()];
        let err = Projector::new(OutputShape::Flat, Some(&fields)).unwrap_err();
        assert!(matches!(
            err,
            Error::Argument(ArgumentError::FlatRequiresOneField { found: 2 })
        ));
    }

    #[test]
    fn identity_rows_emit_only_requested_identity_keys() {
        let fields = vec![ITEM_ID.to_string()];
        let projector = Projector::new(OutputShape::Values, Some(&fields)).unwrap();

        let map = projector.project(&id_row()).into_values().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(ITEM_ID), Some(&Value::Text("id-1".into())));
    }

    #[test]
    fn identity_rows_shrink_tuples_to_requested_arity() {
        let fields = vec![CHANGE_KEY.to_string()];
        let projector = Projector::new(OutputShape::ValuesList, Some(&fields)).unwrap();

        let row = projector.project(&id_row()).into_row().unwrap();
        assert_eq!(row, vec![Value::Text("ck-1".into())]);
    }

    #[test]
    fn flat_identity_yields_bare_value() {
        let fields = vec![ITEM_ID.to_string()];
        let projector = Projector::new(OutputShape::Flat, Some(&fields)).unwrap();

        let scalar = projector.project(&id_row()).into_scalar().unwrap();
        assert_eq!(scalar, Value::Text("id-1".into()));
    }
}
