//! Deterministic Louvain modularity maximization
//!
//! Nodes are always visited in index order and ties in modularity gain keep the first candidate
//! community found, so a given graph always produces the same partition.
//!

use std::collections::BTreeMap;

use petgraph::graph::UnGraph;

/// Modularity gains at or below this value are treated as no improvement
const MIN_GAIN: f64 = 1e-10;

/// Weighted undirected graph in adjacency list form
struct LouvainGraph {
    /// Neighbor and edge weight for each node, excluding self loops
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl LouvainGraph {
    fn from_graph<N>(graph: &UnGraph<N, f64>) -> Self {
        let node_count = graph.node_count();
        let mut adjacency = vec![Vec::new(); node_count];
        let mut self_loops = vec![0.0; node_count];
        for edge in graph.raw_edges() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                self_loops[a] += edge.weight;
            } else {
                adjacency[a].push((b, edge.weight));
                adjacency[b].push((a, edge.weight));
            }
        }
        Self {
            adjacency,
            self_loops,
        }
    }

    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    fn degree(&self, node: usize) -> f64 {
        self.adjacency[node].iter().map(|x| x.1).sum::<f64>() + 2.0 * self.self_loops[node]
    }

    /// Merge each community into a single node
    fn aggregate(&self, community: &[usize], community_count: usize) -> Self {
        let mut weights = vec![BTreeMap::new(); community_count];
        let mut self_loops = vec![0.0; community_count];
        for node in 0..self.node_count() {
            let c = community[node];
            self_loops[c] += self.self_loops[node];
            for &(neighbor, weight) in self.adjacency[node].iter() {
                let neighbor_c = community[neighbor];
                if neighbor_c == c {
                    // Each internal edge is visited from both ends
                    self_loops[c] += weight / 2.0;
                } else {
                    *weights[c].entry(neighbor_c).or_insert(0.0) += weight;
                }
            }
        }
        Self {
            adjacency: weights
                .into_iter()
                .map(|x| x.into_iter().collect())
                .collect(),
            self_loops,
        }
    }
}

/// Renumber community ids from 0 in order of first appearance
fn renumber_communities(community: &mut [usize]) -> usize {
    let mut new_ids: BTreeMap<usize, usize> = BTreeMap::new();
    let mut order = Vec::new();
    for &c in community.iter() {
        if !new_ids.contains_key(&c) {
            new_ids.insert(c, order.len());
            order.push(c);
        }
    }
    for c in community.iter_mut() {
        *c = new_ids[c];
    }
    order.len()
}

/// Run local node moves until no move improves modularity
///
/// Returns the renumbered community of each node, the community count, and true if any node moved.
///
fn optimize_level(graph: &LouvainGraph) -> (Vec<usize>, usize, bool) {
    let node_count = graph.node_count();
    let degrees = (0..node_count).map(|x| graph.degree(x)).collect::<Vec<_>>();
    let total_weight_x2 = degrees.iter().sum::<f64>();

    let mut community = (0..node_count).collect::<Vec<_>>();
    if total_weight_x2 <= 0.0 {
        return (community, node_count, false);
    }
    let mut community_degree = degrees.clone();

    let mut neighbor_weight = vec![0.0; node_count];
    let mut neighbor_communities = Vec::new();
    let mut improved = false;
    loop {
        let mut moved = false;
        for node in 0..node_count {
            let node_community = community[node];
            let node_degree = degrees[node];

            for &(neighbor, weight) in graph.adjacency[node].iter() {
                let c = community[neighbor];
                if neighbor_weight[c] == 0.0 {
                    neighbor_communities.push(c);
                }
                neighbor_weight[c] += weight;
            }

            community_degree[node_community] -= node_degree;
            let gain = |c: usize, neighbor_weight: &[f64]| {
                neighbor_weight[c] - community_degree[c] * node_degree / total_weight_x2
            };

            let mut best_community = node_community;
            let mut best_gain = gain(node_community, &neighbor_weight);
            for &c in neighbor_communities.iter() {
                let c_gain = gain(c, &neighbor_weight);
                if c_gain > best_gain + MIN_GAIN {
                    best_community = c;
                    best_gain = c_gain;
                }
            }

            community_degree[best_community] += node_degree;
            community[node] = best_community;
            if best_community != node_community {
                moved = true;
                improved = true;
            }

            for c in neighbor_communities.drain(..) {
                neighbor_weight[c] = 0.0;
            }
        }
        if !moved {
            break;
        }
    }

    let community_count = renumber_communities(&mut community);
    (community, community_count, improved)
}

/// Partition graph nodes into communities by Louvain modularity maximization
///
/// Returns the community of each node by node index, numbered from 1 in order of first appearance
/// over the node indexes.
///
pub fn find_communities<N>(graph: &UnGraph<N, f64>) -> Vec<usize> {
    let mut level_graph = LouvainGraph::from_graph(graph);
    let mut node_community = (0..graph.node_count()).collect::<Vec<_>>();
    loop {
        let (community, community_count, improved) = optimize_level(&level_graph);
        if !improved {
            break;
        }
        for c in node_community.iter_mut() {
            *c = community[*c];
        }
        level_graph = level_graph.aggregate(&community, community_count);
    }

    renumber_communities(&mut node_community);
    node_community.into_iter().map(|x| x + 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_graph(node_count: usize, edges: &[(u32, u32, f64)]) -> UnGraph<(), f64> {
        let mut graph = UnGraph::new_undirected();
        for _ in 0..node_count {
            graph.add_node(());
        }
        graph.extend_with_edges(edges.iter().copied());
        graph
    }

    #[test]
    fn test_two_triangles() {
        let graph = get_graph(
            6,
            &[
                (0, 1, 5.0),
                (1, 2, 5.0),
                (0, 2, 5.0),
                (2, 3, 1.0),
                (3, 4, 5.0),
                (4, 5, 5.0),
                (3, 5, 5.0),
            ],
        );
        assert_eq!(find_communities(&graph), vec![1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_disconnected_components() {
        let graph = get_graph(5, &[(0, 1, 2.0), (2, 3, 3.0), (3, 4, 1.0)]);
        let communities = find_communities(&graph);
        assert_eq!(communities, vec![1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_no_edges() {
        let graph = get_graph(3, &[]);
        assert_eq!(find_communities(&graph), vec![1, 2, 3]);
    }

    #[test]
    fn test_renumber_communities() {
        let mut community = vec![4, 2, 4, 0];
        assert_eq!(renumber_communities(&mut community), 3);
        assert_eq!(community, vec![0, 1, 0, 2]);
    }
}
