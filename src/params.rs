use crate::error::{ClusterError, Result};

/// Default volume-growth tolerance for merging a box into a tree leaf.
pub const MERGE_VOLUME_LIMIT: f64 = 1.2;
/// Default IoU above which two sibling subtrees collapse into one leaf.
pub const TREE_MIN_IOU: f64 = 0.3;
/// Default IoU at or above which the greedy squash pass merges two boxes.
pub const GREEDY_MIN_IOU: f64 = 0.15;

/// Tuning knobs of [`MergeTree`](crate::MergeTree).
///
/// The defaults are empirical; they trade structure size against how tightly the
/// merged boxes fit the inputs and do not affect the coverage guarantee.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeTreeParams {
    /// A new box is merged into a leaf when the union's volume is at most this
    /// factor times the larger of the two input volumes.
    pub merge_volume_limit: f64,
    /// Siblings whose IoU exceeds this value collapse into a single leaf.
    pub min_iou: f64,
}

impl Default for MergeTreeParams {
    fn default() -> Self {
        Self {
            merge_volume_limit: MERGE_VOLUME_LIMIT,
            min_iou: TREE_MIN_IOU,
        }
    }
}

impl MergeTreeParams {
    pub fn with_merge_volume_limit(mut self, limit: f64) -> Self {
        self.merge_volume_limit = limit;
        self
    }

    pub fn with_min_iou(mut self, min_iou: f64) -> Self {
        self.min_iou = min_iou;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.merge_volume_limit.is_finite() || self.merge_volume_limit < 0.0 {
            return Err(ClusterError::InvalidParameter {
                name: "merge_volume_limit",
                value: self.merge_volume_limit,
            });
        }
        check_iou("min_iou", self.min_iou)
    }
}

/// Tuning knobs of [`GreedyMerge`](crate::GreedyMerge).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GreedyMergeParams {
    /// Pairs with at least this IoU are merged by the squash pass.
    pub min_iou: f64,
}

impl Default for GreedyMergeParams {
    fn default() -> Self {
        Self { min_iou: GREEDY_MIN_IOU }
    }
}

impl GreedyMergeParams {
    pub fn with_min_iou(mut self, min_iou: f64) -> Self {
        self.min_iou = min_iou;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_iou("min_iou", self.min_iou)
    }
}

fn check_iou(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ClusterError::InvalidParameter { name, value })
    }
}
