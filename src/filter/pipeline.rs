//! Applies a compiled [`Predicate`] to a dependency set.
//!
//! Every function here makes a single pass, keeps input order and never
//! modifies the records it is given. The first callback failure aborts the
//! whole pass.

use super::predicate::Predicate;
use super::FilterError;
use crate::dependency::Candidate;

/// Keep the candidates accepted by all five axes.
pub fn apply<T, I>(items: I, predicate: &Predicate) -> Result<Vec<T>, FilterError>
where
    I: IntoIterator<Item = T>,
    T: Candidate,
{
    select(items, |c| predicate.accepts(c))
}

/// Keep the dependencies accepted by the name and version axes.
pub fn select_dependencies<T, I>(items: I, predicate: &Predicate) -> Result<Vec<T>, FilterError>
where
    I: IntoIterator<Item = T>,
    T: Candidate,
{
    select(items, |c| predicate.accepts_dependency(c))
}

/// Keep the resolved candidates accepted by `filterResults`.
pub fn select_results<T, I>(items: I, predicate: &Predicate) -> Result<Vec<T>, FilterError>
where
    I: IntoIterator<Item = T>,
    T: Candidate,
{
    select(items, |c| predicate.accepts_result(c))
}

fn select<T, I, F>(items: I, mut accept: F) -> Result<Vec<T>, FilterError>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> Result<bool, FilterError>,
{
    let mut accepted = Vec::new();
    for item in items {
        if accept(&item)? {
            accepted.push(item);
        }
    }
    Ok(accepted)
}
