use crate::error::{ClusterError, Result};
use rand::Rng;

/// Generic axis-aligned bounding box for N-dimensional space.
///
/// A box with `min > max` on some axis is *empty*; [`BoundingBox::empty`] is the
/// canonical sentinel and is what a non-overlapping [`intersection`](BoundingBox::intersection)
/// produces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

/// The 3D box the clustering structures are used with in practice.
pub type Aabb3 = BoundingBox<3>;

impl<const D: usize> Default for BoundingBox<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// A zero-volume box around a single point.
    pub fn from_point(point: [f64; D]) -> Self {
        Self { min: point, max: point }
    }

    /// The empty box. It is the identity of [`union`](BoundingBox::union).
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; D],
            max: [f64::NEG_INFINITY; D],
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: std::array::from_fn(|i| self.min[i].min(other.min[i])),
            max: std::array::from_fn(|i| self.max[i].max(other.max[i])),
        }
    }

    /// Largest box contained in both; empty if they do not overlap.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            min: std::array::from_fn(|i| self.min[i].max(other.min[i])),
            max: std::array::from_fn(|i| self.max[i].min(other.max[i])),
        }
    }

    /// Overlap test. Boxes that only touch on a face do intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    /// Whether `other` lies entirely within `self`. The empty box is contained in everything.
    pub fn contains(&self, other: &Self) -> bool {
        if other.is_empty() {
            return true;
        }
        (0..D).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    pub fn contains_point(&self, point: &[f64; D]) -> bool {
        (0..D).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }

    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.min[i] > self.max[i])
    }

    /// Per-axis extent. Negative on the axes where the box is empty.
    pub fn size(&self) -> [f64; D] {
        std::array::from_fn(|i| self.max[i] - self.min[i])
    }

    pub fn center(&self) -> [f64; D] {
        std::array::from_fn(|i| 0.5 * (self.min[i] + self.max[i]))
    }

    /// Product of the extents, or 0 for an empty box.
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.size().iter().product()
    }

    /// Intersection over union, in `[0, 1]`.
    ///
    /// Returns 0 when the union has no volume, so degenerate boxes never count as similar.
    pub fn iou(&self, other: &Self) -> f64 {
        let union_volume = self.union(other).volume();
        if union_volume <= 0.0 {
            return 0.0;
        }
        self.intersection(other).volume() / union_volume
    }

    /// How far `self` has to grow to include `other`: the Euclidean norm of the
    /// per-axis overshoot of `other` below `min` and above `max`.
    pub fn would_extend_by(&self, other: &Self) -> f64 {
        let mut sum_sq = 0.0;
        for i in 0..D {
            let below = (self.min[i] - other.min[i]).max(0.0);
            let above = (other.max[i] - self.max[i]).max(0.0);
            let extension = below + above;
            sum_sq += extension * extension;
        }
        sum_sq.sqrt()
    }

    /// Finite coordinates and `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self.min[i].is_finite() && self.max[i].is_finite() && self.min[i] <= self.max[i])
    }

    /// Rejects boxes that [`is_valid`](BoundingBox::is_valid) refuses.
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ClusterError::InvalidBox {
                min: self.min.to_vec(),
                max: self.max.to_vec(),
            })
        }
    }
}

/// Samples `count` cubes with edge length `edge` lying inside `domain`.
///
/// If `edge` exceeds the domain along an axis the cubes start at the domain minimum on that axis.
/// Fails for a malformed domain or a negative or non-finite edge.
pub fn random_boxes<const D: usize, R: Rng + ?Sized>(
    rng: &mut R,
    domain: &BoundingBox<D>,
    count: usize,
    edge: f64,
) -> Result<Vec<BoundingBox<D>>> {
    domain.validate()?;
    if !edge.is_finite() || edge < 0.0 {
        return Err(ClusterError::InvalidParameter { name: "edge", value: edge });
    }
    Ok((0..count)
        .map(|_| {
            let min: [f64; D] = std::array::from_fn(|i| {
                let hi = (domain.max[i] - edge).max(domain.min[i]);
                rng.gen_range(domain.min[i]..=hi)
            });
            BoundingBox::new(min, std::array::from_fn(|i| min[i] + edge))
        })
        .collect())
}
