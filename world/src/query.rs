//! Lazy, single-pass query sequences over registry buckets.
//!
//! A [`Query`] wraps the underlying iterator chain; every combinator returns a
//! new query without materializing intermediate collections, so a
//! `filter` + `cast` + `min_by_key` chain over `N` entities runs in `O(N)` time
//! and constant extra space.

use std::{
    cmp::Ordering,
    iter::{Cloned, Filter, FilterMap, Peekable},
    rc::Rc,
    slice,
};

use siege_core::{QueryError, Vec2};

use crate::entity::{self, AsCore, Entity, EntityRef};

/// Query over the resident entities of one type tag.
pub type EntityQuery<'a> = Query<Cloned<slice::Iter<'a, EntityRef>>>;

/// Query narrowed to the concrete entity type `T`.
pub type CastQuery<I, T> = Query<FilterMap<Peekable<I>, fn(EntityRef) -> Option<Rc<T>>>>;

/// Lazy sequence supporting filtering, narrowing and reduction.
///
/// Sequences are single pass and not restartable.
pub struct Query<I: Iterator> {
    inner: Peekable<I>,
}

impl<I: Iterator> Query<I> {
    /// Wraps an iterator as a query sequence.
    #[must_use]
    pub fn new(source: I) -> Self {
        Self {
            inner: source.peekable(),
        }
    }

    /// Keeps only the elements satisfying `predicate`.
    #[must_use]
    pub fn filter<P>(self, predicate: P) -> Query<Filter<Peekable<I>, P>>
    where
        P: FnMut(&I::Item) -> bool,
    {
        Query::new(self.inner.filter(predicate))
    }

    /// Maps every element through a fallible projection, skipping `None`.
    #[must_use]
    pub fn narrow<U, F>(self, projection: F) -> Query<FilterMap<Peekable<I>, F>>
    where
        F: FnMut(I::Item) -> Option<U>,
    {
        Query::new(self.inner.filter_map(projection))
    }

    /// Returns the first element that compares minimal under `compare`.
    pub fn min_by<F>(self, compare: F) -> Option<I::Item>
    where
        F: FnMut(&I::Item, &I::Item) -> Ordering,
    {
        self.inner.min_by(compare)
    }

    /// Returns the first element with the smallest `metric`.
    ///
    /// Metrics are ordered with [`f32::total_cmp`], so the reduction stays total
    /// even when a metric evaluates to NaN.
    pub fn min_by_key<F>(self, mut metric: F) -> Option<I::Item>
    where
        F: FnMut(&I::Item) -> f32,
    {
        let mut best: Option<(f32, I::Item)> = None;
        for item in self.inner {
            let key = metric(&item);
            let improves = match &best {
                Some((best_key, _)) => key.total_cmp(best_key) == Ordering::Less,
                None => true,
            };
            if improves {
                best = Some((key, item));
            }
        }
        best.map(|(_, item)| item)
    }

    /// Reports whether another element is available without consuming it.
    pub fn has_next(&mut self) -> bool {
        self.inner.peek().is_some()
    }

    /// Pulls the next element, failing when the sequence is exhausted.
    pub fn pull(&mut self) -> Result<I::Item, QueryError> {
        self.inner.next().ok_or(QueryError::Exhausted)
    }
}

impl<I: Iterator<Item = EntityRef>> Query<I> {
    /// Narrows the sequence to entities of the concrete type `T`.
    ///
    /// Elements of any other type are skipped rather than reported.
    #[must_use]
    pub fn cast<T: Entity>(self) -> CastQuery<I, T> {
        self.narrow(entity::downcast::<T> as fn(EntityRef) -> Option<Rc<T>>)
    }
}

impl<I: Iterator> Iterator for Query<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Predicate accepting entities whose distance to `center` is at most `radius`.
pub fn in_range<H: AsCore>(center: Vec2, radius: f32) -> impl Fn(&H) -> bool {
    move |handle| handle.as_core().distance_to(center) <= radius
}

/// Metric measuring the distance between an entity and `point`.
pub fn distance_to<H: AsCore>(point: Vec2) -> impl Fn(&H) -> f32 {
    move |handle| handle.as_core().distance_to(point)
}
