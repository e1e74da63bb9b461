//! Binary max-heap keyed by a numeric score.
//!
//! `std::collections::BinaryHeap` needs a total `Ord` on the whole item;
//! this heap only looks at [`Scored::score`], so items with equal scores are
//! left in whatever order the sift history produces.

use taskrank_core::ScoredTask;

/// An item that can be ordered by a numeric score.
pub trait Scored {
    /// Ordering key; larger comes out first.
    fn score(&self) -> f64;
}

impl Scored for ScoredTask {
    fn score(&self) -> f64 {
        f64::from(self.priority_score)
    }
}

/// Array-backed binary max-heap.
///
/// Insert and extract are O(log n); building from a vector is O(n).
#[derive(Debug, Clone)]
pub struct MaxHeap<T> {
    items: Vec<T>,
}

impl<T> Default for MaxHeap<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Scored> MaxHeap<T> {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Number of items in the heap.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The highest-scored item, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Add an item.
    pub fn insert(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    /// Remove and return the highest-scored item.
    pub fn extract_max(&mut self) -> Option<T> {
        match self.items.len() {
            0 => None,
            1 => self.items.pop(),
            _ => {
                // Moves the last item to the root and returns the old root.
                let max = self.items.swap_remove(0);
                self.sift_down(0);
                Some(max)
            }
        }
    }

    /// Replace the contents with `items` and restore heap order.
    pub fn build_from(&mut self, items: Vec<T>) {
        self.items = items;
        for index in (0..self.items.len() / 2).rev() {
            self.sift_down(index);
        }
    }

    /// Drain the heap in descending score order.
    pub fn extract_all(&mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.items.len());
        while let Some(item) = self.extract_max() {
            sorted.push(item);
        }
        sorted
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.items[parent].score() >= self.items[index].score() {
                break;
            }
            self.items.swap(parent, index);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut largest = index;

            if left < len && self.items[left].score() > self.items[largest].score() {
                largest = left;
            }
            if right < len && self.items[right].score() > self.items[largest].score() {
                largest = right;
            }
            if largest == index {
                break;
            }

            self.items.swap(largest, index);
            index = largest;
        }
    }
}

impl<T: Scored> From<Vec<T>> for MaxHeap<T> {
    fn from(items: Vec<T>) -> Self {
        let mut heap = Self::new();
        heap.build_from(items);
        heap
    }
}

impl<T: Scored> FromIterator<T> for MaxHeap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: Scored> Extend<T> for MaxHeap<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}
