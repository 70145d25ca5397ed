use boxcluster::{random_boxes, Aabb3, BoundingBox, ClusterError, MergeTree, MergeTreeParams};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn cube(x: f64, y: f64, z: f64, edge: f64) -> Aabb3 {
    BoundingBox::new([x, y, z], [x + edge, y + edge, z + edge])
}

fn domain() -> Aabb3 {
    cube(0.0, 0.0, 0.0, 100.0)
}

fn build_tree(seed: u64, count: usize, edge: f64) -> (MergeTree<3>, Vec<Aabb3>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let boxes = random_boxes(&mut rng, &domain(), count, edge).unwrap();
    let mut tree = MergeTree::new();
    tree.insert_boxes(&boxes).unwrap();
    (tree, boxes)
}

fn is_covered(tree: &MergeTree<3>, b: &Aabb3) -> bool {
    tree.boxes().any(|merged| merged.contains(b))
}

#[test]
fn test_empty_tree() {
    let tree = MergeTree::<3>::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.depth(), 0);
    assert_eq!(tree.bounds(), None);
    assert_eq!(tree.boxes().count(), 0);
    assert!(tree.find_overlapping_boxes(&domain()).is_empty());
}

#[test]
fn test_first_insert_creates_leaf_root() {
    let mut tree = MergeTree::new();
    tree.insert(cube(1.0, 2.0, 3.0, 4.0)).unwrap();

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.bounds(), Some(&cube(1.0, 2.0, 3.0, 4.0)));
    assert_eq!(tree.boxes().copied().collect::<Vec<_>>(), vec![cube(1.0, 2.0, 3.0, 4.0)]);
}

#[test]
fn test_random_boxes_are_covered() {
    let (tree, boxes) = build_tree(1234, 1000, 10.0);

    assert!(tree.len() >= 1 && tree.len() <= boxes.len());
    assert_eq!(tree.boxes().count(), tree.len());
    for (i, b) in boxes.iter().enumerate() {
        assert!(is_covered(&tree, b), "box {} ({:?}) is not covered by any merged box", i, b);
    }

    let root = tree.bounds().unwrap();
    for b in &boxes {
        assert!(root.contains(b));
    }
}

#[test]
fn test_identical_boxes_reduce_to_one() {
    let mut tree = MergeTree::new();
    for _ in 0..100 {
        tree.insert(cube(5.0, 5.0, 5.0, 2.0)).unwrap();
    }
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.boxes().next(), Some(&cube(5.0, 5.0, 5.0, 2.0)));
}

#[test]
fn test_distant_boxes_stay_separate() {
    let mut tree = MergeTree::new();
    for i in 0..10 {
        tree.insert(cube(i as f64 * 10.0, 0.0, 0.0, 1.0)).unwrap();
    }
    assert_eq!(tree.len(), 10);
    assert!(tree.depth() >= 5, "10 leaves need at least depth 5, got {}", tree.depth());
}

#[test]
fn test_find_overlapping_boxes_matches_scan() {
    let (tree, _) = build_tree(99, 400, 4.0);
    let queries = [cube(10.0, 10.0, 10.0, 15.0), cube(60.0, 0.0, 30.0, 5.0), cube(200.0, 200.0, 200.0, 1.0)];

    for query in &queries {
        let expected: Vec<Aabb3> = tree.boxes().filter(|b| b.intersects(query)).copied().collect();
        assert_eq!(tree.find_overlapping_boxes(query), expected);
    }
    assert!(tree.find_overlapping_boxes(&cube(200.0, 200.0, 200.0, 1.0)).is_empty());
}

#[test]
fn test_clone_is_independent() {
    let (tree, _) = build_tree(5, 200, 6.0);
    let mut copy = tree.clone();

    assert_eq!(copy.boxes().collect::<Vec<_>>(), tree.boxes().collect::<Vec<_>>());

    let snapshot = tree.clone();
    copy.insert(cube(500.0, 500.0, 500.0, 1.0)).unwrap();
    assert_eq!(tree, snapshot);
    assert_eq!(copy.len(), tree.len() + 1);
}

#[test]
fn test_union_covers_both_operands() {
    let (a, _) = build_tree(11, 300, 8.0);
    let (b, _) = build_tree(12, 150, 3.0);
    let (a_before, b_before) = (a.clone(), b.clone());

    let u = a.union(&b);

    assert_eq!(a, a_before, "union must not modify its operands");
    assert_eq!(b, b_before, "union must not modify its operands");
    for merged in a.boxes().chain(b.boxes()) {
        assert!(is_covered(&u, merged), "{:?} lost in union", merged);
    }
    assert_eq!(u.bounds(), Some(&a.bounds().unwrap().union(b.bounds().unwrap())));
}

#[test]
fn test_union_with_empty_tree() {
    let (a, _) = build_tree(3, 50, 5.0);
    let empty = MergeTree::new();

    assert_eq!(a.union(&empty), a);
    assert_eq!(empty.union(&a).boxes().collect::<Vec<_>>(), a.boxes().collect::<Vec<_>>());
}

#[test]
fn test_union_with_own_clone() {
    let (a, boxes) = build_tree(21, 250, 7.0);
    let u = a.union(&a.clone());

    assert_eq!(u.bounds(), a.bounds());
    for b in &boxes {
        assert!(is_covered(&u, b));
    }
    for merged in a.boxes() {
        assert!(is_covered(&u, merged));
    }
}

#[test]
fn test_intersection_is_sound() {
    let (a, _) = build_tree(31, 200, 10.0);
    let (b, _) = build_tree(32, 120, 10.0);
    let (a_before, b_before) = (a.clone(), b.clone());

    let i = a.intersection(&b);

    assert_eq!(a, a_before, "intersection must not modify its operands");
    assert_eq!(b, b_before, "intersection must not modify its operands");
    assert!(!i.is_empty());
    for x in a.boxes() {
        for y in b.boxes() {
            let overlap = x.intersection(y);
            if !overlap.is_empty() {
                assert!(is_covered(&i, &overlap), "overlap {:?} is not covered", overlap);
            }
        }
    }

    // Nothing outside both operands
    let a_root = a.bounds().unwrap();
    let b_root = b.bounds().unwrap();
    for piece in i.boxes() {
        assert!(a_root.contains(piece) && b_root.contains(piece));
    }
}

#[test]
fn test_intersection_is_symmetric_in_coverage() {
    let (a, _) = build_tree(41, 100, 10.0);
    let (b, _) = build_tree(42, 60, 10.0);

    let ab = a.intersection(&b);
    let ba = b.intersection(&a);
    assert_eq!(ab.bounds(), ba.bounds());
}

#[test]
fn test_disjoint_intersection_is_empty() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut a = MergeTree::new();
    a.insert_boxes(&random_boxes(&mut rng, &cube(0.0, 0.0, 0.0, 10.0), 50, 2.0).unwrap()).unwrap();
    let mut b = MergeTree::new();
    b.insert_boxes(&random_boxes(&mut rng, &cube(50.0, 50.0, 50.0, 10.0), 50, 2.0).unwrap()).unwrap();

    let i = a.intersection(&b);
    assert!(i.is_empty());
    assert_eq!(i.boxes().count(), 0);
    assert!(a.intersection(&MergeTree::new()).is_empty());
}

#[test]
fn test_invalid_boxes_are_rejected() {
    let mut tree = MergeTree::new();
    tree.insert(cube(0.0, 0.0, 0.0, 1.0)).unwrap();
    let snapshot = tree.clone();

    let inverted = BoundingBox::new([2.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    assert!(matches!(tree.insert(inverted), Err(ClusterError::InvalidBox { .. })));

    let batch = [cube(5.0, 5.0, 5.0, 1.0), BoundingBox::new([f64::NAN; 3], [1.0; 3])];
    assert!(tree.insert_boxes(&batch).is_err());
    assert_eq!(tree, snapshot, "a rejected batch must leave the tree untouched");
}

#[test]
fn test_params() {
    let tree = MergeTree::<3>::new();
    assert_eq!(tree.params(), &MergeTreeParams::default());
    assert_eq!(tree.params().merge_volume_limit, 1.2);
    assert_eq!(tree.params().min_iou, 0.3);

    let bad = MergeTreeParams::default().with_min_iou(1.5);
    assert!(matches!(
        MergeTree::<3>::try_with_params(bad),
        Err(ClusterError::InvalidParameter { name: "min_iou", .. })
    ));
    let bad = MergeTreeParams::default().with_merge_volume_limit(f64::NAN);
    assert!(MergeTree::<3>::try_with_params(bad).is_err());
}

#[test]
fn test_strict_params_keep_more_boxes() {
    let mut rng = StdRng::seed_from_u64(77);
    let boxes = random_boxes(&mut rng, &domain(), 500, 10.0).unwrap();

    let mut loose = MergeTree::new();
    loose.insert_boxes(&boxes).unwrap();

    // A limit of 1 only merges boxes that contain each other, and IoU never exceeds 1.
    let strict_params = MergeTreeParams::default().with_merge_volume_limit(1.0).with_min_iou(1.0);
    let mut strict = MergeTree::try_with_params(strict_params).unwrap();
    strict.insert_boxes(&boxes).unwrap();

    assert_eq!(strict.len(), boxes.len());
    assert!(loose.len() <= strict.len());
    for b in &boxes {
        assert!(is_covered(&strict, b));
    }
}
