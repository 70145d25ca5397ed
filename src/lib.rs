//! # boxcluster
//!
//! `boxcluster` reduces a large, streamed set of axis-aligned bounding boxes to a small set of
//! merged boxes that still cover every input. It is meant for visibility culling and
//! level-of-detail selection over scene geometry, and can be used from Rust as well as compiled
//! to WebAssembly (WASM).
//!
//! ## Features
//!
//! - **Merge tree**: [`MergeTree`] keeps the reduced boxes in a binary tree whose internal nodes
//!   store the union of their children. Insertion merges or splits at the leaves and collapses
//!   strongly overlapping subtrees, and the tree doubles as an overlap index.
//! - **Greedy merge**: [`GreedyMerge`] keeps a flat list and merges each new box into the first
//!   box it touches, with an optional squash pass driven by intersection over union.
//! - **Set operations**: both structures support union and intersection of two instances without
//!   going back to the raw input boxes.
//! - **Common interface**: the [`Clusterer`] trait hides which structure is used. Combining two
//!   different structures is rejected with [`ClusterError::MismatchedClusterer`].
//!
//! Both structures are approximate: the result always covers the input, but it is neither the
//! smallest possible set nor a tight fit.
//!
//! ## Main Interface
//!
//! ```
//! use boxcluster::{Aabb3, MergeTree};
//!
//! let mut tree = MergeTree::new();
//! tree.insert(Aabb3::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])).unwrap();
//! tree.insert(Aabb3::new([0.1, 0.0, 0.0], [1.1, 1.0, 1.0])).unwrap();
//! assert_eq!(tree.len(), 1);
//! ```

mod bounds;
mod clusterer;
mod error;
mod greedy_merge;
mod merge_tree;
mod params;
pub mod wasm;

pub use bounds::random_boxes;
pub use bounds::Aabb3;
pub use bounds::BoundingBox;
pub use clusterer::Clusterer;
pub use clusterer::ClustererRef;
pub use clusterer::GreedyClusterer;
pub use clusterer::TreeClusterer;
pub use error::ClusterError;
pub use error::ClustererKind;
pub use error::Result;
pub use greedy_merge::GreedyMerge;
pub use merge_tree::Boxes;
pub use merge_tree::MergeTree;
pub use params::GreedyMergeParams;
pub use params::MergeTreeParams;
pub use params::GREEDY_MIN_IOU;
pub use params::MERGE_VOLUME_LIMIT;
pub use params::TREE_MIN_IOU;
