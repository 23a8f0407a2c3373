//! Determinism utilities: stable ordering & order-independent reduction.
//!
//! This module is **I/O-free**. It provides:
//! - Stable total orders for drivers
//! - Canonical in-place sort helpers
//! - A deterministic reduce helper (independent of worker completion order
//!   when the combiner is associative)

use core::cmp::Ordering;

use crate::ids::DriverId;

/* -------------------------------------------------------------------------- */
/*                               Stable Ordering                              */
/* -------------------------------------------------------------------------- */

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for DriverId {
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

/// Sort values **in place** into their canonical order.
#[inline]
pub fn sort_drivers_canonical<T: StableOrd>(xs: &mut [T]) {
    xs.sort_by(|a, b| a.stable_cmp(b));
}

/* -------------------------------------------------------------------------- */
/*                         Deterministic (order-free) reduce                   */
/* -------------------------------------------------------------------------- */

/// Identity element for reductions over partial results.
pub trait StableReduce: Sized {
    fn identity() -> Self;
}

/// Deterministically reduce partial results by first sorting them canonically
/// and then folding with the associative `combine`.
///
/// If `items` is empty, returns `None`.
#[inline]
pub fn reduce_deterministic<T, F>(mut items: Vec<T>, combine: F) -> Option<T>
where
    T: StableReduce + StableOrd,
    F: Fn(T, T) -> T,
{
    items.sort_by(|a, b| a.stable_cmp(b));
    let mut it = items.into_iter();
    let first = it.next()?;
    Some(it.fold(first, combine))
}

/// Like `reduce_deterministic`, but an empty input yields the identity.
#[inline]
pub fn reduce_or_identity<T, F>(items: Vec<T>, combine: F) -> T
where
    T: StableReduce + StableOrd,
    F: Fn(T, T) -> T,
{
    reduce_deterministic(items, combine).unwrap_or_else(T::identity)
}

/* ---------------------------------- Tests --------------------------------- */
