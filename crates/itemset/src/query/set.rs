use crate::{
    error::{ArgumentError, CallSite, Error},
    folder::{AffectedOccurrences, Folder, ItemRef, Row, is_identity_field},
    obs::metrics,
    query::{
        plan::{OrderKey, QueryPlan},
        predicate::Predicate,
        project::{OutputShape, Projected, Projector},
    },
};
use std::cell::OnceCell;
use std::fmt;
use std::mem;
use std::ops::Range;

///
/// Selection
///
/// Filter state of a specification. "Match everything" is distinct from the
/// `none()` sentinel, which short-circuits to an empty result without any
/// remote call.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Selection {
    #[default]
    Unfiltered,
    Empty,
    Where(Predicate),
}

impl Selection {
    /// AND a predicate into the selection. A further `filter` on the empty
    /// sentinel starts a fresh selection rather than staying empty.
    fn and_with(self, predicate: Predicate) -> Self {
        match self {
            Self::Where(existing) => Self::Where(existing.and_with(predicate)),
            Self::Unfiltered | Self::Empty => Self::Where(predicate),
        }
    }

    /// Predicate to send to the remote listing, if any.
    pub(crate) const fn predicate(&self) -> Option<&Predicate> {
        match self {
            Self::Where(predicate) => Some(predicate),
            Self::Unfiltered | Self::Empty => None,
        }
    }

    pub(crate) const fn is_empty_sentinel(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

///
/// QuerySet
///
/// Lazy, chainable query over one remote folder.
///
/// Chaining calls copy the specification and return an independent
/// instance; consumption (iteration, indexing, length, or a terminal
/// operation) plans once, fills a per-instance cache, and serves every
/// later access from it. Copies never inherit the cache, so a chained-off
/// query set re-queries the collection.
///
/// Single-threaded by construction: the cache is a `OnceCell` (`!Sync`),
/// and the first fill is not guarded against concurrent entry. Independent
/// instances share nothing mutable and may be used concurrently.
///

pub struct QuerySet<'a, F: Folder> {
    folder: &'a F,
    selection: Selection,
    only_fields: Option<Vec<String>>,
    order_keys: Vec<OrderKey>,
    reversed: bool,
    shape: OutputShape,
    cache: OnceCell<Vec<Row<F::Item>>>,
}

impl<F: Folder> Clone for QuerySet<'_, F> {
    /// Copying resets laziness: the clone starts unfilled and will query
    /// the collection again when consumed.
    fn clone(&self) -> Self {
        Self {
            folder: self.folder,
            selection: self.selection.clone(),
            only_fields: self.only_fields.clone(),
            order_keys: self.order_keys.clone(),
            reversed: self.reversed,
            shape: self.shape,
            cache: OnceCell::new(),
        }
    }
}

impl<F: Folder> fmt::Debug for QuerySet<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("selection", &self.selection)
            .field("only_fields", &self.only_fields)
            .field("order_keys", &self.order_keys)
            .field("reversed", &self.reversed)
            .field("shape", &self.shape)
            .field("cache_filled", &self.cache.get().is_some())
            .finish()
    }
}

impl<'a, F: Folder> QuerySet<'a, F> {
    /// Fresh, unrestricted specification over `folder`.
    #[must_use]
    pub const fn new(folder: &'a F) -> Self {
        Self {
            folder,
            selection: Selection::Unfiltered,
            only_fields: None,
            order_keys: Vec::new(),
            reversed: false,
            shape: OutputShape::Full,
            cache: OnceCell::new(),
        }
    }

    // ------------------------------------------------------------------
    // Chaining surface
    // ------------------------------------------------------------------

    /// Copy with the cache reset; the selection is unchanged.
    #[must_use]
    pub fn all(&self) -> Self {
        self.clone()
    }

    /// Copy that yields zero results without any remote call.
    #[must_use]
    pub fn none(&self) -> Self {
        let mut qs = self.clone();
        qs.selection = Selection::Empty;
        qs
    }

    /// AND `predicate` into the current selection.
    ///
    /// Field references are validated against the folder's catalog here,
    /// before any remote call is made.
    pub fn filter(&self, predicate: Predicate) -> Result<Self, Error> {
        self.check_fields(predicate.referenced_fields(), CallSite::Filter)?;

        let mut qs = self.clone();
        qs.selection = mem::take(&mut qs.selection).and_with(predicate);
        Ok(qs)
    }

    /// AND the negation of `predicate` into the current selection.
    pub fn exclude(&self, predicate: Predicate) -> Result<Self, Error> {
        self.check_fields(predicate.referenced_fields(), CallSite::Exclude)?;

        let mut qs = self.clone();
        qs.selection = mem::take(&mut qs.selection).and_with(Predicate::not(predicate));
        Ok(qs)
    }

    /// Restrict the fetched field subset. An empty slice means "fetch no
    /// additional fields beyond identity".
    pub fn only(&self, fields: &[&str]) -> Result<Self, Error> {
        self.check_fields(fields.iter().copied(), CallSite::Only)?;

        let mut qs = self.clone();
        qs.only_fields = Some(fields.iter().map(ToString::to_string).collect());
        Ok(qs)
    }

    /// Replace the ordering spec. A leading `-` marks a key descending.
    pub fn order_by(&self, fields: &[&str]) -> Result<Self, Error> {
        let keys: Vec<OrderKey> = fields.iter().map(|field| OrderKey::parse(field)).collect();
        self.check_fields(keys.iter().map(|key| key.field.as_str()), CallSite::OrderBy)?;

        let mut qs = self.clone();
        qs.order_keys = keys;
        Ok(qs)
    }

    /// Toggle global reversal of the ordered sequence.
    ///
    /// Reversal without an ordering is meaningless and rejected.
    pub fn reverse(&self) -> Result<Self, Error> {
        if self.order_keys.is_empty() {
            return Err(ArgumentError::ReverseWithoutOrder.into());
        }

        let mut qs = self.clone();
        qs.reversed = !qs.reversed;
        Ok(qs)
    }

    /// Project each result to a field-name → value mapping.
    pub fn values(&self, fields: &[&str]) -> Result<Self, Error> {
        if fields.is_empty() {
            return Err(ArgumentError::RequiresFields {
                origin: CallSite::Values,
            }
            .into());
        }
        self.check_fields(fields.iter().copied(), CallSite::Values)?;

        let mut qs = self.clone();
        qs.only_fields = Some(fields.iter().map(ToString::to_string).collect());
        qs.shape = OutputShape::Values;
        Ok(qs)
    }

    /// Project each result to a value tuple in requested field order.
    pub fn values_list(&self, fields: &[&str]) -> Result<Self, Error> {
        if fields.is_empty() {
            return Err(ArgumentError::RequiresFields {
                origin: CallSite::ValuesList,
            }
            .into());
        }
        self.check_fields(fields.iter().copied(), CallSite::ValuesList)?;

        let mut qs = self.clone();
        qs.only_fields = Some(fields.iter().map(ToString::to_string).collect());
        qs.shape = OutputShape::ValuesList;
        Ok(qs)
    }

    /// Project each result to the bare value of exactly one field.
    pub fn values_list_flat(&self, fields: &[&str]) -> Result<Self, Error> {
        if fields.len() != 1 {
            return Err(ArgumentError::FlatRequiresOneField {
                found: fields.len(),
            }
            .into());
        }
        self.check_fields(fields.iter().copied(), CallSite::ValuesList)?;

        let mut qs = self.clone();
        qs.only_fields = Some(fields.iter().map(ToString::to_string).collect());
        qs.shape = OutputShape::Flat;
        Ok(qs)
    }

    // ------------------------------------------------------------------
    // Consumption
    // ------------------------------------------------------------------

    /// Iterate results in the requested output shape.
    ///
    /// The first consumption fills the cache; later consumptions of this
    /// instance serve it without further remote calls.
    pub fn iter(&self) -> Result<impl Iterator<Item = Projected<F::Item>> + '_, Error> {
        let projector = self.projector()?;
        let rows = self.rows()?;
        Ok(rows.iter().map(move |row| projector.project(row)))
    }

    /// Cache-bypassing consumption: plans and projects fresh, leaving any
    /// existing cache untouched.
    pub fn iterator(&self) -> Result<impl Iterator<Item = Projected<F::Item>>, Error> {
        let projector = self.projector()?;
        let rows = self.run()?;
        Ok(rows.into_iter().map(move |row| projector.project(&row)))
    }

    /// Element count; fills the cache if needed.
    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.rows()?.len())
    }

    /// True when the materialized result is empty.
    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.rows()?.is_empty())
    }

    /// Single-element indexing over the cached sequence.
    pub fn nth(&self, index: usize) -> Result<Option<Projected<F::Item>>, Error> {
        let projector = self.projector()?;
        Ok(self.rows()?.get(index).map(|row| projector.project(row)))
    }

    /// Slice the cached sequence. Out-of-range bounds clamp, matching
    /// fixed-sequence slicing semantics.
    pub fn slice(&self, range: Range<usize>) -> Result<Vec<Projected<F::Item>>, Error> {
        let projector = self.projector()?;
        let rows = self.rows()?;

        let start = range.start.min(rows.len());
        let end = range.end.min(rows.len()).max(start);
        Ok(rows[start..end]
            .iter()
            .map(|row| projector.project(row))
            .collect())
    }

    // ------------------------------------------------------------------
    // Terminal operations
    // ------------------------------------------------------------------

    /// Filter further, then require exactly one match.
    pub fn get(&self, predicate: Predicate) -> Result<Projected<F::Item>, Error> {
        self.filter(predicate)?.one()
    }

    /// Require exactly one result from this specification as-is.
    pub fn one(&self) -> Result<Projected<F::Item>, Error> {
        let count = self.len()?;
        match count {
            0 => Err(Error::NotFound),
            1 => self.nth(0)?.ok_or(Error::NotFound),
            _ => Err(Error::NotUnique { count }),
        }
    }

    /// Item count with as little remote effort as possible.
    ///
    /// Strips fields and ordering so the id-only shortcut applies whenever
    /// the predicate allows it.
    pub fn count(&self) -> Result<usize, Error> {
        self.minimal().len()
    }

    /// True when at least one item matches.
    pub fn exists(&self) -> Result<bool, Error> {
        Ok(self.count()? > 0)
    }

    /// Delete every matching item via the folder's bulk-delete, covering
    /// all recurring-event occurrences. Returns the deleted count.
    pub fn delete(&self) -> Result<usize, Error> {
        let qs = self.minimal();
        let ids: Vec<ItemRef> = qs.rows()?.iter().map(Row::item_ref).collect();

        let deleted = self.folder.bulk_delete(ids, AffectedOccurrences::All)?;
        metrics::record_delete(deleted);
        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Copy stripped to the cheapest possible specification.
    fn minimal(&self) -> Self {
        let mut qs = self.clone();
        qs.only_fields = Some(Vec::new());
        qs.order_keys.clear();
        qs.reversed = false;
        qs.shape = OutputShape::Full;
        qs
    }

    /// Fill the cache on first consumption and borrow the raw row sequence.
    fn rows(&self) -> Result<&[Row<F::Item>], Error> {
        if let Some(rows) = self.cache.get() {
            return Ok(rows);
        }

        let rows = self.run()?;
        metrics::record_cache_fill();
        Ok(self.cache.get_or_init(|| rows))
    }

    /// Plan and execute this specification from scratch.
    fn run(&self) -> Result<Vec<Row<F::Item>>, Error> {
        if self.selection.is_empty_sentinel() {
            return Ok(Vec::new());
        }

        let plan = QueryPlan::build(self.folder, self.only_fields.as_deref(), &self.order_keys);
        plan.execute(
            self.folder,
            self.selection.predicate(),
            &self.order_keys,
            self.reversed,
        )
    }

    fn projector(&self) -> Result<Projector, Error> {
        Projector::new(self.shape, self.only_fields.as_deref())
    }

    fn check_fields<'f>(
        &self,
        fields: impl IntoIterator<Item = &'f str>,
        origin: CallSite,
    ) -> Result<(), Error> {
        let allowed = self.folder.allowed_field_names();
        for field in fields {
            if !is_identity_field(field) && !allowed.contains(field) {
                return Err(Error::InvalidField {
                    field: field.to_string(),
                    origin,
                });
            }
        }
        Ok(())
    }
}

///
/// FolderExt
///
/// Entry point sugar: every folder can open an unrestricted query set over
/// itself.
///

pub trait FolderExt: Folder + Sized {
    fn items(&self) -> QuerySet<'_, Self> {
        QuerySet::new(self)
    }
}

impl<F: Folder> FolderExt for F {}
