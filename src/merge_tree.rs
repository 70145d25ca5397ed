use crate::bounds::BoundingBox;
use crate::error::Result;
use crate::params::MergeTreeParams;
use log::{debug, trace};
use rayon::prelude::*;

/// A node of the merge tree.
///
/// Nodes are never edited in place: insertion consumes a node and returns its
/// replacement, so the path from the root to the touched leaf is rebuilt.
#[derive(Clone, Debug, PartialEq)]
enum Node<const D: usize> {
    Leaf(BoundingBox<D>),
    Internal {
        /// Union of both children's bounds.
        bounds: BoundingBox<D>,
        /// Number of leaves below this node.
        count: usize,
        children: Box<[Node<D>; 2]>,
    },
}

impl<const D: usize> Node<D> {
    fn join(first: Node<D>, second: Node<D>) -> Node<D> {
        Node::Internal {
            bounds: first.bounds().union(second.bounds()),
            count: first.count() + second.count(),
            children: Box::new([first, second]),
        }
    }

    fn bounds(&self) -> &BoundingBox<D> {
        match self {
            Node::Leaf(bounds) => bounds,
            Node::Internal { bounds, .. } => bounds,
        }
    }

    fn count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal { count, .. } => *count,
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal { children, .. } => 1 + children[0].depth().max(children[1].depth()),
        }
    }

    fn insert(self, bbox: BoundingBox<D>, params: &MergeTreeParams) -> Node<D> {
        match self {
            Node::Leaf(existing) => {
                // Merge only if the union does not bloat the larger of the two boxes.
                let merged = existing.union(&bbox);
                let limit = params.merge_volume_limit * existing.volume().max(bbox.volume());
                if merged.volume() <= limit {
                    Node::Leaf(merged)
                } else {
                    Node::join(Node::Leaf(existing), Node::Leaf(bbox))
                }
            }
            Node::Internal { children, .. } => {
                let [first, second] = *children;
                let into_first = first.bounds().would_extend_by(&bbox) <= second.bounds().would_extend_by(&bbox);
                let (target, preserved) = if into_first { (first, second) } else { (second, first) };

                let updated = target.insert(bbox, params);
                if updated.bounds().iou(preserved.bounds()) > params.min_iou {
                    let collapsed = updated.bounds().union(preserved.bounds());
                    trace!(
                        "collapsing {} leaves into {:?}",
                        updated.count() + preserved.count(),
                        collapsed
                    );
                    return Node::Leaf(collapsed);
                }

                if into_first {
                    Node::join(updated, preserved)
                } else {
                    Node::join(preserved, updated)
                }
            }
        }
    }

    fn collect_overlapping(&self, query: &BoundingBox<D>, out: &mut Vec<BoundingBox<D>>) {
        if !self.bounds().intersects(query) {
            return;
        }
        match self {
            Node::Leaf(bounds) => out.push(*bounds),
            Node::Internal { children, .. } => {
                for child in children.iter() {
                    child.collect_overlapping(query, out);
                }
            }
        }
    }
}

/// A binary tree of boxes reducing an unbounded stream of AABBs to a compact cover.
///
/// Every internal node stores the union of its children, so the tree doubles as an
/// overlap index. Leaves hold the reduced boxes: each one is either an inserted box
/// or a merge of several, and together they always cover everything ever inserted.
///
/// The shape depends on insertion order. There is no rebalancing pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeTree<const D: usize> {
    root: Option<Node<D>>,
    params: MergeTreeParams,
}

impl<const D: usize> MergeTree<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: MergeTreeParams) -> Self {
        Self { root: None, params }
    }

    /// Like [`with_params`](MergeTree::with_params) but rejects out-of-range thresholds.
    pub fn try_with_params(params: MergeTreeParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::with_params(params))
    }

    pub fn params(&self) -> &MergeTreeParams {
        &self.params
    }

    /// Inserts a single box. Malformed boxes are rejected and leave the tree untouched.
    pub fn insert(&mut self, bbox: BoundingBox<D>) -> Result<()> {
        bbox.validate()?;
        self.insert_valid(bbox);
        Ok(())
    }

    /// Inserts a batch of boxes. The whole batch is validated before any of it is inserted.
    pub fn insert_boxes(&mut self, boxes: &[BoundingBox<D>]) -> Result<()> {
        for bbox in boxes {
            bbox.validate()?;
        }
        for bbox in boxes {
            self.insert_valid(*bbox);
        }
        Ok(())
    }

    fn insert_valid(&mut self, bbox: BoundingBox<D>) {
        self.root = Some(match self.root.take() {
            None => Node::Leaf(bbox),
            Some(root) => root.insert(bbox, &self.params),
        });
    }

    /// Number of reduced boxes (leaves) held by the tree.
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, Node::count)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Bounds of everything in the tree, `None` when empty.
    pub fn bounds(&self) -> Option<&BoundingBox<D>> {
        self.root.as_ref().map(Node::bounds)
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }

    /// Iterates over the leaf boxes, left to right.
    pub fn boxes(&self) -> Boxes<'_, D> {
        Boxes {
            stack: self.root.iter().collect(),
        }
    }

    /// All stored boxes that intersect `query`. These are the merged leaf boxes, not the
    /// original inputs.
    pub fn find_overlapping_boxes(&self, query: &BoundingBox<D>) -> Vec<BoundingBox<D>> {
        let mut found = Vec::new();
        if let Some(root) = &self.root {
            root.collect_overlapping(query, &mut found);
        }
        found
    }

    /// A tree covering both `self` and `other`.
    ///
    /// The larger tree is cloned and the leaves of the smaller one are inserted into the
    /// copy. Neither operand is modified. The result keeps the parameters of `self`.
    pub fn union(&self, other: &MergeTree<D>) -> MergeTree<D> {
        let (big, small) = if self.len() >= other.len() { (self, other) } else { (other, self) };

        let mut result = big.clone();
        result.params = self.params;
        for bbox in small.boxes() {
            result.insert_valid(*bbox);
        }

        debug!("union of {} and {} boxes -> {} boxes", self.len(), other.len(), result.len());
        result
    }

    /// A tree covering the overlap of `self` and `other`.
    ///
    /// Each leaf of the smaller tree is intersected with the overlapping leaves of the larger
    /// one. The candidate pieces are computed in parallel and inserted in a fixed order, so
    /// the result does not depend on scheduling.
    pub fn intersection(&self, other: &MergeTree<D>) -> MergeTree<D> {
        let (big, small) = if self.len() >= other.len() { (self, other) } else { (other, self) };

        let queries: Vec<BoundingBox<D>> = small.boxes().copied().collect();
        let pieces: Vec<BoundingBox<D>> = queries
            .par_iter()
            .flat_map_iter(|query| {
                big.find_overlapping_boxes(query)
                    .into_iter()
                    .map(move |candidate| candidate.intersection(query))
                    .filter(|piece| !piece.is_empty())
            })
            .collect();

        let mut result = MergeTree::with_params(self.params);
        for piece in pieces {
            result.insert_valid(piece);
        }

        debug!(
            "intersection of {} and {} boxes -> {} boxes",
            self.len(),
            other.len(),
            result.len()
        );
        result
    }
}

/// Depth-first iterator over the leaf boxes of a [`MergeTree`].
pub struct Boxes<'a, const D: usize> {
    stack: Vec<&'a Node<D>>,
}

impl<'a, const D: usize> Iterator for Boxes<'a, D> {
    type Item = &'a BoundingBox<D>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(bounds) => return Some(bounds),
                Node::Internal { children, .. } => {
                    self.stack.push(&children[1]);
                    self.stack.push(&children[0]);
                }
            }
        }
        None
    }
}
