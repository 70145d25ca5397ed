use crate::bounds::BoundingBox;
use crate::error::Result;
use crate::params::GreedyMergeParams;
use log::debug;
use rayon::prelude::*;

/// A flat list of boxes reduced by merging each new box into the first stored box it touches.
///
/// Insertion is a linear scan, which beats [`MergeTree`](crate::MergeTree) when the number of
/// boxes is small or the input rarely overlaps. [`squash_boxes`](GreedyMerge::squash_boxes) is
/// an optional quadratic pass that folds together stored boxes that have grown into each other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GreedyMerge<const D: usize> {
    boxes: Vec<BoundingBox<D>>,
    params: GreedyMergeParams,
}

impl<const D: usize> GreedyMerge<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: GreedyMergeParams) -> Self {
        Self {
            boxes: Vec::new(),
            params,
        }
    }

    pub fn try_with_params(params: GreedyMergeParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::with_params(params))
    }

    /// Seeds the set with `boxes` as they are, without merging them.
    pub fn from_boxes(boxes: Vec<BoundingBox<D>>) -> Result<Self> {
        Self::from_boxes_with_params(boxes, GreedyMergeParams::default())
    }

    /// Like [`from_boxes`](GreedyMerge::from_boxes) with custom thresholds.
    pub fn from_boxes_with_params(boxes: Vec<BoundingBox<D>>, params: GreedyMergeParams) -> Result<Self> {
        params.validate()?;
        for bbox in &boxes {
            bbox.validate()?;
        }
        Ok(Self { boxes, params })
    }

    pub fn params(&self) -> &GreedyMergeParams {
        &self.params
    }

    pub fn boxes(&self) -> &[BoundingBox<D>] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Adds a batch of boxes. Nothing is added if any box in the batch is malformed.
    pub fn add_boxes(&mut self, boxes: &[BoundingBox<D>]) -> Result<()> {
        for bbox in boxes {
            bbox.validate()?;
        }
        self.add_valid(boxes);
        Ok(())
    }

    fn add_valid(&mut self, boxes: &[BoundingBox<D>]) {
        for bbox in boxes {
            match self.boxes.iter_mut().find(|existing| existing.intersects(bbox)) {
                Some(existing) => *existing = existing.union(bbox),
                None => self.boxes.push(*bbox),
            }
        }
    }

    /// One pass merging stored boxes whose IoU reaches the threshold.
    ///
    /// Each box is compared with the boxes after it. A box that grows is not compared again
    /// with earlier boxes, so pairs above the threshold can remain; this is not a fixpoint.
    /// Merged-away boxes are swap-removed, so the order of the remaining boxes changes.
    pub fn squash_boxes(&mut self) {
        let before = self.boxes.len();
        let mut i = 0;
        while i < self.boxes.len() {
            let mut j = i + 1;
            while j < self.boxes.len() {
                if self.boxes[i].iou(&self.boxes[j]) >= self.params.min_iou {
                    // Slot j now holds the former last box, so it is checked again.
                    let absorbed = self.boxes.swap_remove(j);
                    self.boxes[i] = self.boxes[i].union(&absorbed);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        debug!("squashed {} boxes into {}", before, self.boxes.len());
    }

    pub fn squash_and_get_boxes(&mut self) -> &[BoundingBox<D>] {
        self.squash_boxes();
        &self.boxes
    }

    /// A copy of `self` with the boxes of `other` added. Not squashed.
    pub fn union(&self, other: &GreedyMerge<D>) -> GreedyMerge<D> {
        let mut result = self.clone();
        result.add_valid(&other.boxes);
        debug!("union of {} and {} boxes -> {} boxes", self.len(), other.len(), result.len());
        result
    }

    /// All non-empty pairwise intersections of the two sets, squashed.
    pub fn intersection(&self, other: &GreedyMerge<D>) -> GreedyMerge<D> {
        let pieces: Vec<BoundingBox<D>> = self
            .boxes
            .par_iter()
            .flat_map_iter(|a| {
                other
                    .boxes
                    .iter()
                    .map(move |b| a.intersection(b))
                    .filter(|piece| !piece.is_empty())
            })
            .collect();

        let mut result = GreedyMerge {
            boxes: pieces,
            params: self.params,
        };
        result.squash_boxes();
        debug!(
            "intersection of {} and {} boxes -> {} boxes",
            self.len(),
            other.len(),
            result.len()
        );
        result
    }
}
