use foundation::bounds::Aabb2;
use foundation::math::precision::stable_total_cmp_f64;

/// A deterministic bounding volume hierarchy (BVH) over `Aabb2` items.
///
/// Ordering contract:
/// - `query_aabb` and `query_point` return ids in ascending order.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Aabb2,
        items: Vec<Item>,
    },
    Internal {
        bounds: Aabb2,
        left: usize,
        right: usize,
    },
}

impl Node {
    fn bounds(&self) -> &Aabb2 {
        match self {
            Node::Leaf { bounds, .. } | Node::Internal { bounds, .. } => bounds,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Item {
    pub id: usize,
    pub bounds: Aabb2,
}

impl Bvh {
    pub fn build(items: Vec<Item>) -> Self {
        let mut nodes = Vec::new();
        let mut items = items;
        if !items.is_empty() {
            build_node(&mut nodes, &mut items);
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of items whose bounds intersect `query`, ascending.
    pub fn query_aabb(&self, query: &Aabb2) -> Vec<usize> {
        self.collect(|b| b.intersects(query))
    }

    /// Ids of items whose bounds contain `p`, ascending.
    pub fn query_point(&self, p: [f64; 2]) -> Vec<usize> {
        self.collect(|b| b.contains(p))
    }

    fn collect(&self, test: impl Fn(&Aabb2) -> bool) -> Vec<usize> {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        let mut stack: Vec<usize> = vec![0];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !test(node.bounds()) {
                continue;
            }
            match node {
                Node::Leaf { items, .. } => {
                    hits.extend(items.iter().filter(|i| test(&i.bounds)).map(|i| i.id));
                }
                Node::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        hits.sort_unstable();
        hits.dedup();
        hits
    }
}

const LEAF_MAX: usize = 8;

fn build_node(nodes: &mut Vec<Node>, items: &mut [Item]) -> usize {
    let bounds = bounds_for_items(items);
    if items.len() <= LEAF_MAX {
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            bounds,
            items: items.to_vec(),
        });
        return idx;
    }

    let axis = split_axis(&bounds);
    items.sort_by(|a, b| {
        let ca = centroid_axis(&a.bounds, axis);
        let cb = centroid_axis(&b.bounds, axis);
        stable_total_cmp_f64(ca, cb).then_with(|| a.id.cmp(&b.id))
    });

    let mid = items.len() / 2;
    let (left_items, right_items) = items.split_at_mut(mid);

    let idx = nodes.len();
    // Placeholder; patched once the children exist.
    nodes.push(Node::Leaf {
        bounds,
        items: Vec::new(),
    });

    let left = build_node(nodes, left_items);
    let right = build_node(nodes, right_items);

    nodes[idx] = Node::Internal {
        bounds,
        left,
        right,
    };
    idx
}

fn centroid_axis(aabb: &Aabb2, axis: usize) -> f64 {
    (aabb.min[axis] + aabb.max[axis]) * 0.5
}

fn split_axis(bounds: &Aabb2) -> usize {
    // Prefer X on ties.
    if bounds.width() >= bounds.height() { 0 } else { 1 }
}

fn bounds_for_items(items: &[Item]) -> Aabb2 {
    items[1..]
        .iter()
        .fold(items[0].bounds, |acc, item| acc.union(&item.bounds))
}

#[cfg(test)]
mod tests {
    use super::{Bvh, Item};
    use foundation::bounds::Aabb2;

    fn item(id: usize, min: [f64; 2], max: [f64; 2]) -> Item {
        Item {
            id,
            bounds: Aabb2::new(min, max),
        }
    }

    #[test]
    fn query_returns_ids_in_order() {
        let bvh = Bvh::build(vec![
            item(2, [10.0, 0.0], [11.0, 1.0]),
            item(1, [0.0, 0.0], [1.0, 1.0]),
            item(3, [0.5, 0.5], [2.0, 2.0]),
        ]);

        let hits = bvh.query_aabb(&Aabb2::new([0.25, 0.25], [1.5, 1.5]));
        assert_eq!(hits, vec![1, 3]);
        assert_eq!(bvh.query_point([10.5, 0.5]), vec![2]);
        assert!(bvh.query_point([5.0, 5.0]).is_empty());
    }

    #[test]
    fn deep_tree_matches_linear_scan() {
        let items: Vec<Item> = (0..100)
            .map(|i| {
                let x = (i % 10) as f64 * 3.0;
                let y = (i / 10) as f64 * 3.0;
                item(i, [x, y], [x + 2.0, y + 2.0])
            })
            .collect();
        let bvh = Bvh::build(items.clone());

        let q = Aabb2::new([4.0, 4.0], [10.0, 7.5]);
        let expected: Vec<usize> = items
            .iter()
            .filter(|i| i.bounds.intersects(&q))
            .map(|i| i.id)
            .collect();
        assert_eq!(bvh.query_aabb(&q), expected);
    }

    #[test]
    fn build_is_input_order_independent_for_results() {
        let a = vec![
            item(1, [0.0, 0.0], [1.0, 1.0]),
            item(2, [2.0, 0.0], [3.0, 1.0]),
            item(3, [4.0, 0.0], [5.0, 1.0]),
        ];
        let mut b = a.clone();
        b.reverse();

        let q = Aabb2::new([1.5, 0.0], [4.5, 1.0]);
        let ha = Bvh::build(a).query_aabb(&q);
        let hb = Bvh::build(b).query_aabb(&q);
        assert_eq!(ha, hb);
        assert_eq!(ha, vec![2, 3]);
    }
}
