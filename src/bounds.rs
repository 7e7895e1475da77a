/// Offset + limit window over a result.
///
/// Sessions receive the bounds exactly as the caller built them; how the window
/// is applied (SQL clause, cursor skip, client-side skip) is the engine's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PagingBounds {
    pub offset: usize,
    pub limit: usize,
}

impl PagingBounds {
    pub const NO_OFFSET: usize = 0;
    pub const NO_LIMIT: usize = usize::MAX;

    /// Bounds that select every row.
    pub const UNBOUNDED: PagingBounds = PagingBounds {
        offset: Self::NO_OFFSET,
        limit: Self::NO_LIMIT,
    };

    #[must_use]
    pub const fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }

    /// Apply the window to an already materialized sequence.
    pub fn window<I: IntoIterator>(
        &self,
        rows: I,
    ) -> std::iter::Take<std::iter::Skip<I::IntoIter>> {
        rows.into_iter().skip(self.offset).take(self.limit)
    }
}

impl Default for PagingBounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}
