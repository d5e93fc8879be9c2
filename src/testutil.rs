//! Test helpers: a random colored DAG strategy and a brute-force solver.

use proptest::prelude::*;

use crate::graph::{ColorId, ColoredGraph, VertexId};

/// Random rooted colored DAG with at most `max_vertices` vertices and colors
/// below `max_colors`, weights drawn from a continuous range.
///
/// Colors are generated as levels (edges only go from a lower to a higher
/// level), then level labels and vertex positions are shuffled so the result
/// is not canonical. The root always has at least one outgoing edge.
pub(crate) fn arb_rooted_dag(max_vertices: usize, max_colors: u32) -> impl Strategy<Value = ColoredGraph> {
    arb_dag_with(max_vertices, max_colors, (-6.0f64..6.0).boxed())
}

/// Like [`arb_rooted_dag`], but weights are small integers, so equal
/// weights and zero edges are common, and about one edge in ten is `-inf`.
pub(crate) fn arb_tied_dag(max_vertices: usize, max_colors: u32) -> impl Strategy<Value = ColoredGraph> {
    let weight = prop_oneof![
        9 => (-3i32..=3).prop_map(f64::from),
        1 => Just(f64::NEG_INFINITY),
    ];
    arb_dag_with(max_vertices, max_colors, weight.boxed())
}

fn arb_dag_with(
    max_vertices: usize,
    max_colors: u32,
    weight: BoxedStrategy<f64>,
) -> impl Strategy<Value = ColoredGraph> {
    (2..=max_vertices).prop_flat_map(move |n| {
        let pairs = n * (n - 1) / 2;
        (
            proptest::collection::vec(1..max_colors, n - 1),
            proptest::collection::vec(proptest::option::weighted(0.55, weight.clone()), pairs),
            0.1f64..6.0,
            Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
            Just((0..max_colors).collect::<Vec<u32>>()).prop_shuffle(),
        )
            .prop_map(move |(levels, weights, root_weight, positions, labels)| {
                let level = |i: usize| if i == 0 { 0 } else { levels[i - 1] };

                // positions[i] is where generated vertex i lands.
                let mut at_position = vec![0; n];
                for (i, &p) in positions.iter().enumerate() {
                    at_position[p] = i;
                }
                let mut g = ColoredGraph::new();
                for &i in &at_position {
                    g.add_vertex(ColorId::new(labels[level(i) as usize]));
                }
                let id = |i: usize| VertexId::new(positions[i] as u32);

                let mut pair = 0;
                let mut root_has_child = false;
                for i in 0..n {
                    for j in (i + 1)..n {
                        let w = weights[pair];
                        pair += 1;
                        let Some(w) = w else { continue };
                        let (from, to) = match level(i).cmp(&level(j)) {
                            std::cmp::Ordering::Less => (i, j),
                            std::cmp::Ordering::Greater => (j, i),
                            std::cmp::Ordering::Equal => continue,
                        };
                        root_has_child |= from == 0;
                        g.add_edge(id(from), id(to), w).unwrap();
                    }
                }
                if !root_has_child {
                    g.add_edge(id(0), id(1), root_weight).unwrap();
                }
                g.set_root(id(0)).unwrap();
                g
            })
    })
}

/// Every edge goes up in id and color, and each color is one id block.
pub(crate) fn is_canonical(g: &ColoredGraph) -> bool {
    let ordered = g.edges().all(|(_, loss)| {
        loss.source < loss.target && g.color(loss.source) < g.color(loss.target)
    });
    let contiguous = g
        .vertices()
        .zip(g.vertices().skip(1))
        .all(|(a, b)| g.color(a) <= g.color(b));
    ordered && contiguous
}

/// Score of the best colorful subtree rooted at `root`, by enumerating every
/// colorful vertex set that contains it. Each other vertex takes its best
/// in-edge from inside the set; in a DAG that always yields a tree.
pub(crate) fn best_subtree_below(g: &ColoredGraph, root: VertexId) -> f64 {
    let others: Vec<VertexId> = g.vertices().filter(|&v| v != root).collect();
    assert!(others.len() <= 16, "brute force is limited to small graphs");
    let mut best = 0.0;
    for mask in 0u32..(1 << others.len()) {
        let mut chosen = vec![root];
        chosen.extend(
            others
                .iter()
                .enumerate()
                .filter(|(k, _)| mask & (1 << k) != 0)
                .map(|(_, &v)| v),
        );
        let mut colors: Vec<ColorId> = chosen.iter().map(|&v| g.color(v)).collect();
        colors.sort_unstable();
        colors.dedup();
        if colors.len() != chosen.len() {
            continue;
        }
        let mut score = 0.0;
        let mut feasible = true;
        for &x in &chosen[1..] {
            let parent = g
                .in_edges(x)
                .iter()
                .map(|&e| &g[e])
                .filter(|loss| chosen.contains(&loss.source))
                .map(|loss| loss.weight)
                .reduce(f64::max);
            match parent {
                Some(w) => score += w,
                None => {
                    feasible = false;
                    break;
                }
            }
        }
        if feasible && score > best {
            best = score;
        }
    }
    best
}

/// Optimum of the whole graph: the best colorful subtree below the root.
pub(crate) fn optimum(g: &ColoredGraph) -> f64 {
    g.root().map_or(0.0, |r| best_subtree_below(g, r))
}
