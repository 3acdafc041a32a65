use crate::{
    error::Error,
    folder::{Folder, ItemFields, Row, is_identity_field},
    obs::metrics,
    query::predicate::Predicate,
    value::canonical_cmp,
};
use std::collections::BTreeSet;

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

///
/// OrderKey
///
/// One sort key: field name plus direction.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderKey {
    pub field: String,
    pub direction: OrderDirection,
}

impl OrderKey {
    /// Parse an ordering spec; a leading `-` marks the key descending.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        spec.strip_prefix('-').map_or_else(
            || Self {
                field: spec.to_string(),
                direction: OrderDirection::Asc,
            },
            |field| Self {
                field: field.to_string(),
                direction: OrderDirection::Desc,
            },
        )
    }
}

///
/// Strategy
///
/// Remote retrieval strategy chosen at execution time.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Strategy {
    /// Id-only listing; the cheapest possible query. No sorting or cleanup.
    IdsOnly,
    /// Single listing call carrying the needed fields.
    Direct,
    /// Id listing followed by by-id hydration; taken when the listing
    /// service cannot return a requested complex field.
    FetchAfterList,
}

///
/// QueryPlan
///
/// Minimum-cost retrieval decision for one finalized specification,
/// re-computable from scratch for the same inputs.
///

#[derive(Debug)]
pub(crate) struct QueryPlan {
    pub strategy: Strategy,
    pub additional_fields: Vec<String>,
    pub extra_order_fields: BTreeSet<String>,
}

impl QueryPlan {
    pub(crate) fn build<F: Folder>(
        folder: &F,
        only_fields: Option<&[String]>,
        order: &[OrderKey],
    ) -> Self {
        // Requested field subset, or the full catalog when unrestricted.
        // Identity fields come back unconditionally and are excluded here.
        let mut additional_fields: Vec<String> = match only_fields {
            Some(fields) => fields
                .iter()
                .filter(|field| !is_identity_field(field))
                .cloned()
                .collect(),
            None => folder.allowed_field_names().into_iter().collect(),
        };
        let mut seen = BTreeSet::new();
        additional_fields.retain(|field| seen.insert(field.clone()));

        // Complex fields are judged on the requested set alone; sort-only
        // fields are merged afterwards, matching the wire behaviour of the
        // listing service.
        let complex = folder.complex_field_names();
        let complex_requested = additional_fields
            .iter()
            .any(|field| complex.contains(field));

        // Fields referenced only by sort keys still have to be fetched, but
        // are cleared from every item before it is yielded.
        let extra_order_fields: BTreeSet<String> = order
            .iter()
            .filter(|key| {
                !is_identity_field(&key.field) && !additional_fields.contains(&key.field)
            })
            .map(|key| key.field.clone())
            .collect();
        additional_fields.extend(extra_order_fields.iter().cloned());

        let strategy = if additional_fields.is_empty() && order.is_empty() {
            Strategy::IdsOnly
        } else if complex_requested {
            Strategy::FetchAfterList
        } else {
            Strategy::Direct
        };

        Self {
            strategy,
            additional_fields,
            extra_order_fields,
        }
    }

    /// Run the chosen strategy, then apply ordering, reversal, and sort-only
    /// field cleanup.
    pub(crate) fn execute<F: Folder>(
        &self,
        folder: &F,
        predicate: Option<&Predicate>,
        order: &[OrderKey],
        reversed: bool,
    ) -> Result<Vec<Row<F::Item>>, Error> {
        let mut rows: Vec<Row<F::Item>> = match self.strategy {
            Strategy::IdsOnly => {
                let ids = folder.find_item_ids(predicate)?;
                metrics::record_find(ids.len());
                // Raw identity pairs: nothing to sort or clean by construction.
                return Ok(ids.into_iter().map(Row::Id).collect());
            }
            Strategy::FetchAfterList => {
                let ids = folder.find_item_ids(predicate)?;
                metrics::record_find(ids.len());
                let items = folder.fetch(&ids, &self.additional_fields)?;
                metrics::record_fetch(items.len());
                items.into_iter().map(Row::Item).collect()
            }
            Strategy::Direct => {
                let items = folder.find_items(predicate, &self.additional_fields)?;
                metrics::record_find(items.len());
                items.into_iter().map(Row::Item).collect()
            }
        };

        if !order.is_empty() {
            sort_rows(&mut rows, order);
            if reversed {
                rows.reverse();
            }
        }

        if !self.extra_order_fields.is_empty() {
            // Callers must never see values for fields they did not request,
            // even though those fields were fetched to enable sorting.
            for row in &mut rows {
                if let Row::Item(item) = row {
                    for field in &self.extra_order_fields {
                        item.clear_field(field);
                    }
                }
            }
        }

        Ok(rows)
    }
}

/// Stable multi-key sort: one stable pass per key, keys visited in reverse
/// declaration order, which yields "primary key first, ties broken by the
/// next key" semantics. Ties in every key keep retrieval order.
fn sort_rows<I: ItemFields>(rows: &mut [Row<I>], order: &[OrderKey]) {
    for key in order.iter().rev() {
        rows.sort_by(|a, b| {
            let cmp = canonical_cmp(&a.field_value(&key.field), &b.field_value(&key.field));
            match key.direction {
                OrderDirection::Asc => cmp,
                OrderDirection::Desc => cmp.reverse(),
            }
        });
    }
}
