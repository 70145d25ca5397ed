use crate::bounds::{random_boxes, Aabb3, BoundingBox};
use crate::greedy_merge::GreedyMerge;
use crate::merge_tree::MergeTree;
use crate::params::{GreedyMergeParams, MergeTreeParams};
use js_sys::{Array, Float64Array};
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

/// Number of values per box in the flat arrays exchanged with JavaScript:
/// `minX, minY, minZ, maxX, maxY, maxZ`.
const BOX_STRIDE: usize = 6;

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_BOX: &'static str = r#"
export const BOX_STRIDE = 6;
"#;

// --- Bounding Box ---

/// Represents an axis-aligned bounding box in 3D space.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug)]
pub struct BoundingBox3D {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
}

#[wasm_bindgen]
impl BoundingBox3D {
    #[wasm_bindgen(constructor)]
    pub fn new(
        min_x: f64,
        min_y: f64,
        min_z: f64,
        max_x: f64,
        max_y: f64,
        max_z: f64,
    ) -> BoundingBox3D {
        BoundingBox3D {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }

    pub fn volume(&self) -> f64 {
        Aabb3::from(*self).volume()
    }

    pub fn iou(&self, other: &BoundingBox3D) -> f64 {
        Aabb3::from(*self).iou(&Aabb3::from(*other))
    }
}

impl From<BoundingBox3D> for Aabb3 {
    fn from(b: BoundingBox3D) -> Self {
        Self {
            min: [b.min_x, b.min_y, b.min_z],
            max: [b.max_x, b.max_y, b.max_z],
        }
    }
}

impl From<Aabb3> for BoundingBox3D {
    fn from(b: Aabb3) -> Self {
        BoundingBox3D::new(b.min[0], b.min[1], b.min[2], b.max[0], b.max[1], b.max[2])
    }
}

fn parse_flat_boxes(values: &[f64]) -> Result<Vec<Aabb3>, JsError> {
    if values.len() % BOX_STRIDE != 0 {
        return Err(JsError::new("box arrays must hold a multiple of 6 coordinates"));
    }
    Ok(values
        .chunks_exact(BOX_STRIDE)
        .map(|c| BoundingBox::new([c[0], c[1], c[2]], [c[3], c[4], c[5]]))
        .collect())
}

fn flatten_boxes<'a>(boxes: impl IntoIterator<Item = &'a Aabb3>) -> Vec<f64> {
    boxes
        .into_iter()
        .flat_map(|b| [b.min[0], b.min[1], b.min[2], b.max[0], b.max[1], b.max[2]])
        .collect()
}

/// Collects parsed entries, failing with the index of the first entry that could not be read.
fn collect_entries(entries: impl IntoIterator<Item = Option<Aabb3>>) -> Result<Vec<Aabb3>, usize> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.ok_or(index))
        .collect()
}

/// Random cubes for `randomBoxes`. A `seed` makes the set reproducible.
fn seeded_boxes(domain: &Aabb3, count: usize, edge: f64, seed: Option<u64>) -> crate::error::Result<Vec<Aabb3>> {
    let mut rng = StdRng::seed_from_u64(seed.unwrap_or_else(get_seed));
    random_boxes(&mut rng, domain, count, edge)
}

/// Reads a box from a JS array of six numbers.
pub fn parse_js_box(val: &JsValue) -> Option<Aabb3> {
    let arr = val.dyn_ref::<Array>()?;
    if arr.length() < BOX_STRIDE as u32 {
        return None;
    }
    let mut v = [0.0; BOX_STRIDE];
    for (i, slot) in v.iter_mut().enumerate() {
        *slot = arr.get(i as u32).as_f64()?;
    }
    Some(BoundingBox::new([v[0], v[1], v[2]], [v[3], v[4], v[5]]))
}

// --- Merge Tree ---

/// WASM wrapper for the 3D merge tree.
#[wasm_bindgen(js_name = MergeTree)]
pub struct MergeTree3D {
    inner: MergeTree<3>,
}

#[wasm_bindgen(js_class = MergeTree)]
impl MergeTree3D {
    #[wasm_bindgen(constructor)]
    pub fn new() -> MergeTree3D {
        MergeTree3D { inner: MergeTree::new() }
    }

    #[wasm_bindgen(js_name = withParams)]
    pub fn with_params(merge_volume_limit: f64, min_iou: f64) -> Result<MergeTree3D, JsError> {
        let params = MergeTreeParams::default()
            .with_merge_volume_limit(merge_volume_limit)
            .with_min_iou(min_iou);
        Ok(MergeTree3D { inner: MergeTree::try_with_params(params)? })
    }

    pub fn insert(&mut self, bounds: BoundingBox3D) -> Result<(), JsError> {
        Ok(self.inner.insert(bounds.into())?)
    }

    /// Inserts boxes given as a flat array, six numbers per box.
    #[wasm_bindgen(js_name = addBoxes)]
    pub fn add_boxes(&mut self, boxes: &[f64]) -> Result<(), JsError> {
        let boxes = parse_flat_boxes(boxes)?;
        Ok(self.inner.insert_boxes(&boxes)?)
    }

    /// Inserts boxes given as an array of six-number arrays. If any entry is not such an array
    /// the whole batch is rejected and nothing is inserted.
    #[wasm_bindgen(js_name = addBoxArray)]
    pub fn add_box_array(&mut self, boxes: &Array) -> Result<(), JsError> {
        let boxes = collect_entries(boxes.iter().map(|v| parse_js_box(&v)))
            .map_err(|index| JsError::new(&format!("entry {} is not an array of six numbers", index)))?;
        Ok(self.inner.insert_boxes(&boxes)?)
    }

    #[wasm_bindgen(getter)]
    pub fn boxes(&self) -> Float64Array {
        Float64Array::from(flatten_boxes(self.inner.boxes()).as_slice())
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(getter)]
    pub fn depth(&self) -> usize {
        self.inner.depth()
    }

    #[wasm_bindgen(js_name = findOverlappingBoxes)]
    pub fn find_overlapping_boxes(&self, query: BoundingBox3D) -> Vec<f64> {
        flatten_boxes(&self.inner.find_overlapping_boxes(&query.into()))
    }

    #[wasm_bindgen(js_name = clone)]
    pub fn duplicate(&self) -> MergeTree3D {
        MergeTree3D { inner: self.inner.clone() }
    }

    pub fn union(&self, other: &MergeTree3D) -> MergeTree3D {
        MergeTree3D { inner: self.inner.union(&other.inner) }
    }

    pub fn intersection(&self, other: &MergeTree3D) -> MergeTree3D {
        MergeTree3D { inner: self.inner.intersection(&other.inner) }
    }
}

// --- Greedy Merge ---

/// WASM wrapper for the 3D greedy merge set.
#[wasm_bindgen(js_name = GreedyMerge)]
pub struct GreedyMerge3D {
    inner: GreedyMerge<3>,
}

#[wasm_bindgen(js_class = GreedyMerge)]
impl GreedyMerge3D {
    #[wasm_bindgen(constructor)]
    pub fn new() -> GreedyMerge3D {
        GreedyMerge3D { inner: GreedyMerge::new() }
    }

    #[wasm_bindgen(js_name = withParams)]
    pub fn with_params(min_iou: f64) -> Result<GreedyMerge3D, JsError> {
        let params = GreedyMergeParams::default().with_min_iou(min_iou);
        Ok(GreedyMerge3D { inner: GreedyMerge::try_with_params(params)? })
    }

    #[wasm_bindgen(js_name = addBoxes)]
    pub fn add_boxes(&mut self, boxes: &[f64]) -> Result<(), JsError> {
        let boxes = parse_flat_boxes(boxes)?;
        Ok(self.inner.add_boxes(&boxes)?)
    }

    #[wasm_bindgen(getter)]
    pub fn boxes(&self) -> Float64Array {
        Float64Array::from(flatten_boxes(self.inner.boxes()).as_slice())
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(js_name = squashBoxes)]
    pub fn squash_boxes(&mut self) {
        self.inner.squash_boxes();
    }

    #[wasm_bindgen(js_name = squashAndGetBoxes)]
    pub fn squash_and_get_boxes(&mut self) -> Vec<f64> {
        flatten_boxes(self.inner.squash_and_get_boxes())
    }

    #[wasm_bindgen(js_name = clone)]
    pub fn duplicate(&self) -> GreedyMerge3D {
        GreedyMerge3D { inner: self.inner.clone() }
    }

    pub fn union(&self, other: &GreedyMerge3D) -> GreedyMerge3D {
        GreedyMerge3D { inner: self.inner.union(&other.inner) }
    }

    pub fn intersection(&self, other: &GreedyMerge3D) -> GreedyMerge3D {
        GreedyMerge3D { inner: self.inner.intersection(&other.inner) }
    }
}

/// Random cubes of edge `edge` inside `domain`, as a flat array. Handy for demos and stress tests.
/// Passing a `seed` reproduces the same set; without one a random seed is drawn.
#[wasm_bindgen(js_name = randomBoxes)]
pub fn random_boxes_flat(domain: BoundingBox3D, count: usize, edge: f64, seed: Option<u64>) -> Result<Vec<f64>, JsError> {
    let boxes = seeded_boxes(&domain.into(), count, edge, seed)?;
    Ok(flatten_boxes(&boxes))
}

fn get_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * 4294967296.0) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        123456789
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f64) -> Aabb3 {
        BoundingBox::new([x, 0.0, 0.0], [x + 1.0, 1.0, 1.0])
    }

    #[test]
    fn test_unreadable_entry_rejects_batch() {
        let entries = vec![Some(unit_box(0.0)), None, Some(unit_box(2.0)), None];
        assert_eq!(collect_entries(entries), Err(1));

        let entries = vec![Some(unit_box(0.0)), Some(unit_box(2.0))];
        assert_eq!(collect_entries(entries), Ok(vec![unit_box(0.0), unit_box(2.0)]));
    }

    #[test]
    fn test_seeded_boxes_are_reproducible() {
        let domain = BoundingBox::new([0.0; 3], [50.0; 3]);
        let a = seeded_boxes(&domain, 100, 2.0, Some(7)).unwrap();
        let b = seeded_boxes(&domain, 100, 2.0, Some(7)).unwrap();
        let c = seeded_boxes(&domain, 100, 2.0, Some(8)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(seeded_boxes(&domain, 10, 2.0, None).unwrap().len(), 10);
    }

    #[test]
    fn test_seeded_boxes_reject_unbounded_domain() {
        let domain = BoundingBox::new([0.0; 3], [f64::INFINITY, 1.0, 1.0]);
        assert!(seeded_boxes(&domain, 10, 1.0, Some(1)).is_err());
    }
}
