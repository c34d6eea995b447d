use crate::primitives::Bounds;
use crate::ray::Ray;
use glam::Vec3;

#[derive(Clone, Copy, Debug)]
pub enum Axis {
    X,
    Y,
    Z,
}

trait GetAxis {
    type Output;

    fn axis(&self, axis: Axis) -> Self::Output;
}

impl GetAxis for Vec3 {
    type Output = f32;

    fn axis(&self, axis: Axis) -> Self::Output {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

const SPLIT_BUCKETS: usize = 12;
const LEAF_THRESHOLD: usize = 4;

/// A bounding volume hierarchy over object indices, used both for
/// nearest-intersection walks and for point containment walks.
pub struct Bvh {
    /// Object indices grouped per leaf.
    order: Vec<usize>,
    /// The tree flattened in depth-first order, root first.
    tree: Vec<FlatNode>,
}

impl Bvh {
    /// Builds over (object index, bounds) pairs. All bounds must be
    /// finite; unbounded objects are kept out of the tree by the caller.
    pub fn new(items: &[(usize, Bounds)]) -> Self {
        let mut build = items
            .iter()
            .map(|&(index, bounds)| BuildItem {
                index,
                center: 0.5 * (bounds.min + bounds.max),
                bounds,
            })
            .collect::<Vec<_>>();

        let mut order = Vec::with_capacity(build.len());
        if build.is_empty() {
            return Self {
                order,
                tree: Vec::new(),
            };
        }

        let mut total_nodes = 0;
        let root = Self::build(&mut build, &mut order, &mut total_nodes);
        let tree = Self::flatten(root, total_nodes);
        log::debug!("built {} nodes over {} objects", total_nodes, order.len());

        Self { order, tree }
    }

    fn build(items: &mut [BuildItem], order: &mut Vec<usize>, total_nodes: &mut usize) -> BuildNode {
        *total_nodes += 1;

        let bounds = items
            .iter()
            .fold(Bounds::empty(), |b, item| b.union(item.bounds));

        if items.len() <= LEAF_THRESHOLD {
            return Self::build_leaf(items, order, bounds);
        }

        let centroids = items
            .iter()
            .fold(Bounds::empty(), |b, item| b.point_union(item.center));
        let split_axis = centroids.max_extent();
        let extent = centroids.max.axis(split_axis) - centroids.min.axis(split_axis);
        if extent <= 0.0 {
            // Every centroid coincides along the widest axis; splitting
            // cannot separate anything.
            return Self::build_leaf(items, order, bounds);
        }

        let bucket_of = |item: &BuildItem| -> usize {
            let bucket = ((item.center.axis(split_axis) - centroids.min.axis(split_axis)) / extent
                * SPLIT_BUCKETS as f32) as usize;
            bucket.min(SPLIT_BUCKETS - 1)
        };

        let mut buckets = [SahBucket::default(); SPLIT_BUCKETS];
        for item in items.iter() {
            let bucket = &mut buckets[bucket_of(item)];
            bucket.count += 1;
            bucket.bounds = bucket.bounds.union(item.bounds);
        }

        // Surface area heuristic over the candidate split points.
        let mut best_bucket = 0;
        let mut best_cost = std::f32::INFINITY;
        for candidate in 0..SPLIT_BUCKETS - 1 {
            let left = buckets[..=candidate]
                .iter()
                .fold(SahBucket::default(), |a, b| a.merge(b));
            let right = buckets[candidate + 1..]
                .iter()
                .fold(SahBucket::default(), |a, b| a.merge(b));

            let cost = 0.125 + (left.cost() + right.cost()) / bounds.surface_area();
            if cost < best_cost {
                best_cost = cost;
                best_bucket = candidate;
            }
        }

        if best_cost >= items.len() as f32 {
            return Self::build_leaf(items, order, bounds);
        }

        let mid = partition(items, |item| bucket_of(item) <= best_bucket);
        if mid == 0 || mid == items.len() {
            return Self::build_leaf(items, order, bounds);
        }

        let (front, back) = items.split_at_mut(mid);
        let left = Box::new(Self::build(front, order, total_nodes));
        let right = Box::new(Self::build(back, order, total_nodes));
        BuildNode::interior(left, right)
    }

    fn build_leaf(items: &[BuildItem], order: &mut Vec<usize>, bounds: Bounds) -> BuildNode {
        let offset = order.len();
        order.extend(items.iter().map(|item| item.index));
        BuildNode::leaf(bounds, offset, items.len())
    }

    fn flatten(root: BuildNode, size: usize) -> Vec<FlatNode> {
        let mut tree = Vec::with_capacity(size);
        Self::flatten_impl(root, &mut tree);

        tree
    }

    fn flatten_impl(node: BuildNode, tree: &mut Vec<FlatNode>) -> usize {
        let offset = tree.len();
        match node.kind {
            BuildNodeKind::Interior { left, right } => {
                tree.push(FlatNode {
                    bounds: node.bounds,
                    kind: FlatNodeKind::Interior { left: 0, right: 0 },
                });
                let left_index = Self::flatten_impl(*left, tree);
                let right_index = Self::flatten_impl(*right, tree);
                tree[offset].kind = FlatNodeKind::Interior {
                    left: left_index,
                    right: right_index,
                };
            }
            BuildNodeKind::Leaf { offset: o, count } => {
                tree.push(FlatNode {
                    bounds: node.bounds,
                    kind: FlatNodeKind::Leaf { offset: o, count },
                });
            }
        }

        offset
    }

    /// Visits leaf objects the ray can reach within `closest`. The
    /// callback receives the object index and the current closest depth
    /// and returns the new closest depth, which tightens the rest of the
    /// traversal.
    pub fn walk_ray<F>(&self, ray: &Ray, closest: &mut f32, visit: &mut F)
    where
        F: FnMut(usize, f32) -> f32,
    {
        if !self.tree.is_empty() {
            self.walk_ray_node(0, ray, closest, visit);
        }
    }

    fn walk_ray_node<F>(&self, node: usize, ray: &Ray, closest: &mut f32, visit: &mut F)
    where
        F: FnMut(usize, f32) -> f32,
    {
        let node = &self.tree[node];
        if !node.bounds.intersect(ray, *closest) {
            return;
        }

        match node.kind {
            FlatNodeKind::Interior { left, right } => {
                self.walk_ray_node(left, ray, closest, visit);
                self.walk_ray_node(right, ray, closest, visit);
            }
            FlatNodeKind::Leaf { offset, count } => {
                for &index in &self.order[offset..offset + count] {
                    *closest = visit(index, *closest);
                }
            }
        }
    }

    /// Visits leaf objects whose node bounds contain `point`.
    pub fn walk_point<F>(&self, point: Vec3, visit: &mut F)
    where
        F: FnMut(usize),
    {
        if !self.tree.is_empty() {
            self.walk_point_node(0, point, visit);
        }
    }

    fn walk_point_node<F>(&self, node: usize, point: Vec3, visit: &mut F)
    where
        F: FnMut(usize),
    {
        let node = &self.tree[node];
        if !node.bounds.contains(point) {
            return;
        }

        match node.kind {
            FlatNodeKind::Interior { left, right } => {
                self.walk_point_node(left, point, visit);
                self.walk_point_node(right, point, visit);
            }
            FlatNodeKind::Leaf { offset, count } => {
                for &index in &self.order[offset..offset + count] {
                    visit(index);
                }
            }
        }
    }
}

/// Stable partition; items satisfying the predicate come first. Returns
/// the index of the first item that fails it.
fn partition<T, F>(items: &mut [T], predicate: F) -> usize
where
    F: Fn(&T) -> bool,
{
    let mut mid = 0;
    for i in 0..items.len() {
        if predicate(&items[i]) {
            items.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

struct BuildItem {
    index: usize,
    center: Vec3,
    bounds: Bounds,
}

#[derive(Clone, Copy, Debug, Default)]
struct SahBucket {
    count: usize,
    bounds: Bounds,
}

impl SahBucket {
    fn merge(self, other: &SahBucket) -> SahBucket {
        SahBucket {
            count: self.count + other.count,
            bounds: self.bounds.union(other.bounds),
        }
    }

    fn cost(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.count as f32 * self.bounds.surface_area()
        }
    }
}

enum BuildNodeKind {
    Interior {
        left: Box<BuildNode>,
        right: Box<BuildNode>,
    },
    Leaf {
        offset: usize,
        count: usize,
    },
}

struct BuildNode {
    bounds: Bounds,
    kind: BuildNodeKind,
}

impl BuildNode {
    fn interior(left: Box<BuildNode>, right: Box<BuildNode>) -> Self {
        let bounds = left.bounds.union(right.bounds);

        Self {
            bounds,
            kind: BuildNodeKind::Interior { left, right },
        }
    }

    fn leaf(bounds: Bounds, offset: usize, count: usize) -> Self {
        Self {
            bounds,
            kind: BuildNodeKind::Leaf { offset, count },
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum FlatNodeKind {
    Interior { left: usize, right: usize },
    Leaf { offset: usize, count: usize },
}

#[derive(Clone, Copy, Debug)]
struct FlatNode {
    bounds: Bounds,
    kind: FlatNodeKind,
}
