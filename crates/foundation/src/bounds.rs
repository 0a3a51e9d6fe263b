/// Axis-aligned bounding box in a 2D plane (content space or raw projection space).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Box covering a single point.
    pub fn point(p: [f64; 2]) -> Self {
        Aabb2 { min: p, max: p }
    }

    /// Smallest box covering every finite point; `None` when there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let mut out: Option<Aabb2> = None;
        for p in points {
            if !p[0].is_finite() || !p[1].is_finite() {
                continue;
            }
            out = Some(match out {
                None => Aabb2::point(p),
                Some(b) => b.including(p),
            });
        }
        out
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }

    pub fn including(&self, p: [f64; 2]) -> Self {
        Aabb2::new(
            [self.min[0].min(p[0]), self.min[1].min(p[1])],
            [self.max[0].max(p[0]), self.max[1].max(p[1])],
        )
    }

    pub fn union(&self, other: &Self) -> Self {
        Aabb2::new(
            [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        )
    }

    /// Grows the box by `by` on every side.
    pub fn expanded(&self, by: f64) -> Self {
        Aabb2::new(
            [self.min[0] - by, self.min[1] - by],
            [self.max[0] + by, self.max[1] + by],
        )
    }

    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !(other.min[0] > self.max[0]
            || other.max[0] < self.min[0]
            || other.min[1] > self.max[1]
            || other.max[1] < self.min[1])
    }
}
