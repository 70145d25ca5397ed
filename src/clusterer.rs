use crate::bounds::BoundingBox;
use crate::error::{ClusterError, ClustererKind, Result};
use crate::greedy_merge::GreedyMerge;
use crate::merge_tree::MergeTree;
use log::warn;

/// Borrowed view of the concrete structure behind a [`Clusterer`].
#[derive(Clone, Copy, Debug)]
pub enum ClustererRef<'a, const D: usize> {
    MergeTree(&'a MergeTree<D>),
    GreedyMerge(&'a GreedyMerge<D>),
}

impl<const D: usize> ClustererRef<'_, D> {
    pub fn kind(&self) -> ClustererKind {
        match self {
            ClustererRef::MergeTree(_) => ClustererKind::MergeTree,
            ClustererRef::GreedyMerge(_) => ClustererKind::GreedyMerge,
        }
    }
}

/// Trait defining a box-reduction structure.
/// This allows swapping between the tree-backed and the list-backed implementation.
///
/// Set operations only combine instances of the same kind; mixing kinds fails with
/// [`ClusterError::MismatchedClusterer`].
pub trait Clusterer<const D: usize>: Send + Sync {
    /// Tag of the wrapped implementation.
    fn kind(&self) -> ClustererKind;

    /// Feed more boxes into the structure. Malformed boxes reject the whole batch.
    fn add_boxes(&mut self, boxes: &[BoundingBox<D>]) -> Result<()>;

    /// The current reduced boxes. Their union covers every box added so far.
    fn boxes(&self) -> Vec<BoundingBox<D>>;

    /// Number of reduced boxes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A new clusterer covering both operands. Neither operand is modified.
    fn union(&self, other: &dyn Clusterer<D>) -> Result<Box<dyn Clusterer<D>>>;

    /// A new clusterer covering the overlap of both operands. Neither operand is modified.
    fn intersection(&self, other: &dyn Clusterer<D>) -> Result<Box<dyn Clusterer<D>>>;

    /// Access to the concrete structure.
    fn wrapped(&self) -> ClustererRef<'_, D>;
}

fn mismatch(expected: ClustererKind, found: ClustererKind) -> ClusterError {
    warn!("rejected set operation between {} and {} clusterers", expected, found);
    ClusterError::MismatchedClusterer { expected, found }
}

/// [`Clusterer`] backed by a [`MergeTree`].
#[derive(Clone, Debug, Default)]
pub struct TreeClusterer<const D: usize> {
    tree: MergeTree<D>,
}

impl<const D: usize> TreeClusterer<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &MergeTree<D> {
        &self.tree
    }

    pub fn into_inner(self) -> MergeTree<D> {
        self.tree
    }
}

impl<const D: usize> From<MergeTree<D>> for TreeClusterer<D> {
    fn from(tree: MergeTree<D>) -> Self {
        Self { tree }
    }
}

impl<const D: usize> Clusterer<D> for TreeClusterer<D> {
    fn kind(&self) -> ClustererKind {
        ClustererKind::MergeTree
    }

    fn add_boxes(&mut self, boxes: &[BoundingBox<D>]) -> Result<()> {
        self.tree.insert_boxes(boxes)
    }

    fn boxes(&self) -> Vec<BoundingBox<D>> {
        self.tree.boxes().copied().collect()
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn union(&self, other: &dyn Clusterer<D>) -> Result<Box<dyn Clusterer<D>>> {
        match other.wrapped() {
            ClustererRef::MergeTree(tree) => Ok(Box::new(TreeClusterer::from(self.tree.union(tree)))),
            found => Err(mismatch(self.kind(), found.kind())),
        }
    }

    fn intersection(&self, other: &dyn Clusterer<D>) -> Result<Box<dyn Clusterer<D>>> {
        match other.wrapped() {
            ClustererRef::MergeTree(tree) => Ok(Box::new(TreeClusterer::from(self.tree.intersection(tree)))),
            found => Err(mismatch(self.kind(), found.kind())),
        }
    }

    fn wrapped(&self) -> ClustererRef<'_, D> {
        ClustererRef::MergeTree(&self.tree)
    }
}

/// [`Clusterer`] backed by a [`GreedyMerge`]. Reading the boxes does not squash them.
#[derive(Clone, Debug, Default)]
pub struct GreedyClusterer<const D: usize> {
    set: GreedyMerge<D>,
}

impl<const D: usize> GreedyClusterer<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) -> &GreedyMerge<D> {
        &self.set
    }

    pub fn set_mut(&mut self) -> &mut GreedyMerge<D> {
        &mut self.set
    }

    pub fn into_inner(self) -> GreedyMerge<D> {
        self.set
    }
}

impl<const D: usize> From<GreedyMerge<D>> for GreedyClusterer<D> {
    fn from(set: GreedyMerge<D>) -> Self {
        Self { set }
    }
}

impl<const D: usize> Clusterer<D> for GreedyClusterer<D> {
    fn kind(&self) -> ClustererKind {
        ClustererKind::GreedyMerge
    }

    fn add_boxes(&mut self, boxes: &[BoundingBox<D>]) -> Result<()> {
        self.set.add_boxes(boxes)
    }

    fn boxes(&self) -> Vec<BoundingBox<D>> {
        self.set.boxes().to_vec()
    }

    fn len(&self) -> usize {
        self.set.len()
    }

    fn union(&self, other: &dyn Clusterer<D>) -> Result<Box<dyn Clusterer<D>>> {
        match other.wrapped() {
            ClustererRef::GreedyMerge(set) => Ok(Box::new(GreedyClusterer::from(self.set.union(set)))),
            found => Err(mismatch(self.kind(), found.kind())),
        }
    }

    fn intersection(&self, other: &dyn Clusterer<D>) -> Result<Box<dyn Clusterer<D>>> {
        match other.wrapped() {
            ClustererRef::GreedyMerge(set) => Ok(Box::new(GreedyClusterer::from(self.set.intersection(set)))),
            found => Err(mismatch(self.kind(), found.kind())),
        }
    }

    fn wrapped(&self) -> ClustererRef<'_, D> {
        ClustererRef::GreedyMerge(&self.set)
    }
}
