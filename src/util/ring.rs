//! Fixed-capacity circular buffer

/// Circular buffer over a preallocated slot array.
///
/// Once full, each push overwrites the oldest entry. The buffer never grows
/// past the capacity it was created with.
#[derive(Debug, Clone)]
pub struct RingBuffer<T: Copy> {
    slots: Vec<Option<T>>,
    /// Index the next push writes to
    head: usize,
    len: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// Create an empty buffer; a zero capacity is bumped to one slot
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        self.slots[self.head] = Some(value);
        self.head = (self.head + 1) % self.slots.len();
        self.len = (self.len + 1).min(self.slots.len());
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let cap = self.slots.len();
        let start = (self.head + cap - self.len) % cap;
        (0..self.len).filter_map(move |i| self.slots[(start + i) % cap])
    }

    /// Count entries matching a predicate
    pub fn count_where(&self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.iter().filter(|v| pred(v)).count()
    }
}
