use crate::shared::identity::Centroid;

/// Fixed-capacity ring buffer of recent centroids.
///
/// Storage is allocated once at construction; pushing past capacity
/// overwrites the oldest point.
#[derive(Clone, Debug)]
pub struct Trajectory {
    points: Box<[Centroid]>,
    head: usize,
    len: usize,
}

impl Trajectory {
    /// # Panics
    /// If `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "trajectory capacity must be at least 1");
        Self {
            points: vec![Centroid::default(); capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, point: Centroid) {
        let capacity = self.capacity();
        let slot = (self.head + self.len) % capacity;
        self.points[slot] = point;
        if self.len < capacity {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    pub fn latest(&self) -> Option<Centroid> {
        if self.is_empty() {
            None
        } else {
            Some(self.points[(self.head + self.len - 1) % self.capacity()])
        }
    }

    /// Points from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Centroid> + ExactSizeIterator + '_ {
        let capacity = self.capacity();
        (0..self.len).map(move |i| self.points[(self.head + i) % capacity])
    }

    pub fn to_vec(&self) -> Vec<Centroid> {
        self.iter().collect()
    }
}
