use super::TRACE_LENGTH;

/// One rendered trajectory point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TracePoint {
    pub x: i32,
    pub y: i32,
}

impl TracePoint {
    pub const ORIGIN: TracePoint = TracePoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Fixed-capacity trailing history of trace points, newest first.
///
/// Pushing into a full history drops the oldest point. Storage is a ring
/// buffer so a push is O(1) regardless of capacity.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryHistory<const N: usize = TRACE_LENGTH> {
    points: [TracePoint; N],
    /// Index of the newest point.
    head: usize,
    len: usize,
}

impl<const N: usize> Default for TrajectoryHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TrajectoryHistory<N> {
    pub const fn new() -> Self {
        Self {
            points: [TracePoint::ORIGIN; N],
            head: 0,
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `point` as the newest entry.
    pub fn push_front(&mut self, point: TracePoint) {
        if N == 0 {
            return;
        }
        self.head = (self.head + N - 1) % N;
        self.points[self.head] = point;
        if self.len < N {
            self.len += 1;
        }
    }

    /// The newest point, if any.
    pub fn latest(&self) -> Option<TracePoint> {
        self.get(0)
    }

    /// The point `age` pushes ago (0 = newest).
    pub fn get(&self, age: usize) -> Option<TracePoint> {
        if age >= self.len {
            return None;
        }
        Some(self.points[(self.head + age) % N])
    }

    /// Iterate from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = TracePoint> + '_ {
        (0..self.len).map(move |age| self.points[(self.head + age) % N])
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

// Equal when the retained points match, whatever the ring position.
impl<const N: usize> PartialEq for TrajectoryHistory<N> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<const N: usize> Eq for TrajectoryHistory<N> {}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for TrajectoryHistory<N> {
    fn format(&self, f: defmt::Formatter) {
        match self.latest() {
            Some(p) => defmt::write!(f, "Trajectory({}/{}, latest {})", self.len, N, p),
            None => defmt::write!(f, "Trajectory(0/{})", N),
        }
    }
}
