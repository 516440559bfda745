use thiserror::Error;

/// Failure raised by the fallible sort entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SortError {
    /// The elements at `index` and `index + 1` could not be ordered,
    /// e.g. a `NaN` compared against any float.
    #[error("elements at positions {} and {} are not comparable", .index, .index + 1)]
    IncomparableElements { index: usize },
}
