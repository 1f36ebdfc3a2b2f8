//! A growable array divided into subspans, one per Earley state set.

use crate::stable_vec::{OomError, StableVec};

/// An append-only sequence of items partitioned into segments. Items can only
/// be added to the most recently opened segment, but every segment can be
/// read at any time.
///
/// The backing storage is a [`StableVec`], so appending to the open segment
/// never invalidates views of earlier segments. Segment boundaries are item
/// offsets: `starts` always holds one more entry than there are segments,
/// with the final entry tracking the open segment's end.
///
/// Segment positions are plain indices and work like random-access iterators:
/// they can be offset, compared, and differenced, and they survive appends.
pub struct SpanList<T> {
    items: StableVec<T>,
    starts: Vec<u32>,
}

impl<T: Copy> SpanList<T> {
    /// Creates a list whose backing storage holds at most `item_capacity`
    /// items across all segments.
    pub fn with_capacity(item_capacity: usize) -> Result<Self, OomError> {
        Ok(SpanList {
            items: StableVec::with_capacity(item_capacity)?,
            starts: Vec::new(),
        })
    }

    /// Closes the current segment and opens a new empty one at the tail.
    pub fn open_segment(&mut self) {
        match self.starts.last().copied() {
            Some(end) => self.starts.push(end),
            // The first segment is an empty span starting at offset 0.
            None => self.starts.extend([0, 0]),
        }
    }

    /// Appends to the open segment. A segment must have been opened first.
    pub fn push(&mut self, value: T) -> Result<(), OomError> {
        debug_assert!(!self.starts.is_empty(), "push before open_segment");
        self.items.push(value)?;
        let last = self.starts.len() - 1;
        self.starts[last] += 1;
        Ok(())
    }

    /// Bulk version of [`SpanList::push`].
    pub fn append<I>(&mut self, iter: I) -> Result<(), OomError>
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.push(value)?;
        }
        Ok(())
    }

    /// Number of segments opened so far.
    pub fn len(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only view of segment `index`.
    ///
    /// For the open segment the slice ends at the moment of the call;
    /// re-acquiring the view observes items appended in between. Callers that
    /// interleave reads with pushes walk by index and re-read
    /// [`SpanList::segment_bounds`] instead of holding a slice.
    pub fn segment(&self, index: usize) -> &[T] {
        let (start, end) = self.segment_bounds(index);
        &self.items.as_slice()[start..end]
    }

    /// Half-open item-offset range of segment `index`.
    pub fn segment_bounds(&self, index: usize) -> (usize, usize) {
        (
            self.starts[index] as usize,
            self.starts[index + 1] as usize,
        )
    }

    /// View of the most recently opened segment.
    pub fn current_segment(&self) -> &[T] {
        debug_assert!(!self.starts.is_empty(), "no segment opened");
        self.segment(self.len() - 1)
    }

    /// All items across all segments, in append order.
    pub fn items(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Iterates segment views from first to last.
    pub fn iter_segments(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.len()).map(move |index| self.segment(index))
    }
}

impl<T: Copy + std::fmt::Debug> std::fmt::Debug for SpanList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter_segments()).finish()
    }
}
