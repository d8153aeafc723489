use std::collections::VecDeque;

/// Fixed-depth FIFO; pushing onto a full buffer evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct History<T> {
    entries: VecDeque<T>,
    depth: usize,
}

impl<T> History<T> {
    pub fn with_depth(depth: usize) -> Self {
        assert!(depth > 0, "History depth must be greater than zero");
        Self {
            entries: VecDeque::with_capacity(depth),
            depth,
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the evicted entry, if any.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.entries.len() == self.depth {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(value);
        evicted
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }
}
