use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use statrs::statistics::Statistics;

use super::combination::SVCombination;
use super::louvain::find_communities;

/// Cluster and clone annotation for one combination
#[derive(Clone, Debug, PartialEq)]
pub struct ClusteredCombination {
    pub combination_index: usize,
    pub mean_allele_frequency: f64,
    pub sd_allele_frequency: f64,
    pub cluster: usize,
    pub clone_label: String,
}

/// Build the SV co-occurrence graph, with edge weights summed over combination read counts
///
/// Nodes are added in order of first observation in `combination_indexes`.
///
fn build_sv_graph<'a>(
    combinations: &'a [SVCombination],
    combination_indexes: &[usize],
) -> (UnGraph<&'a str, f64>, HashMap<&'a str, NodeIndex>) {
    let mut graph = UnGraph::new_undirected();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    for &index in combination_indexes.iter() {
        let combination = &combinations[index];
        let sv_nodes = combination
            .sv_ids
            .iter()
            .map(|x| *nodes.entry(x.as_str()).or_insert_with(|| graph.add_node(x.as_str())))
            .collect::<Vec<_>>();
        let weight = combination.read_count as f64;
        for (i, &a) in sv_nodes.iter().enumerate() {
            for &b in sv_nodes[i + 1..].iter() {
                match graph.find_edge(a, b) {
                    Some(edge) => graph[edge] += weight,
                    None => {
                        graph.add_edge(a, b, weight);
                    }
                }
            }
        }
    }
    (graph, nodes)
}

/// Mean and population standard deviation of the allele frequencies, or zero for both if there are
/// none
///
/// Missing allele frequencies are counted as zero, matching the `0.0000` written for them in the
/// AF column.
///
fn get_allele_frequency_stats(allele_frequencies: &[Option<f64>]) -> (f64, f64) {
    let values = allele_frequencies
        .iter()
        .map(|x| x.unwrap_or(0.0))
        .collect::<Vec<_>>();
    if values.is_empty() {
        (0.0, 0.0)
    } else {
        (values.iter().mean(), values.iter().population_std_dev())
    }
}

/// True if `short` appears in `long` as a contiguous, order-preserving run
fn is_contiguous_subsequence<T: PartialEq>(short: &[T], long: &[T]) -> bool {
    if short.len() > long.len() {
        return false;
    }
    short.is_empty() || long.windows(short.len()).any(|x| x == short)
}

/// Assign clone labels to the combinations of one cluster
///
/// Combinations are visited by SV count descending, mean allele frequency descending, and then
/// input order. A combination contained in, or containing, an existing base combination as a
/// contiguous subsequence takes the base label, marked as nested unless the SV sets are equal.
/// Otherwise it becomes a new base combination with the next label of the cluster.
///
fn assign_cluster_clones(
    combinations: &[SVCombination],
    cluster: usize,
    members: &mut [ClusteredCombination],
) {
    let mut order = (0..members.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let (a, b) = (&members[a], &members[b]);
        combinations[b.combination_index]
            .sv_count()
            .cmp(&combinations[a.combination_index].sv_count())
            .then(b.mean_allele_frequency.total_cmp(&a.mean_allele_frequency))
    });

    let mut bases: Vec<(String, &[String])> = Vec::new();
    for member_index in order {
        let sv_ids = combinations[members[member_index].combination_index]
            .sv_ids
            .as_slice();
        let base_match = bases.iter().find(|(_, base_ids)| {
            is_contiguous_subsequence(sv_ids, *base_ids)
                || is_contiguous_subsequence(*base_ids, sv_ids)
        });
        members[member_index].clone_label = match base_match {
            Some((base_label, base_ids)) => {
                if sv_ids == *base_ids {
                    base_label.clone()
                } else {
                    format!("nested {base_label}")
                }
            }
            None => {
                let label = format!("SC{cluster}.{}", bases.len() + 1);
                bases.push((label.clone(), sv_ids));
                label
            }
        };
    }
}

/// Cluster SV combinations by community detection on the SV co-occurrence graph, and assign clone
/// labels within each cluster
///
/// Only combinations with at least `min_read_count` supporting reads are used. Each combination is
/// assigned to the smallest community of its member SVs. Results are returned in input order.
///
pub fn cluster_combinations(
    combinations: &[SVCombination],
    min_read_count: usize,
) -> Vec<ClusteredCombination> {
    let combination_indexes = (0..combinations.len())
        .filter(|&x| combinations[x].read_count >= min_read_count)
        .collect::<Vec<_>>();

    let (graph, nodes) = build_sv_graph(combinations, &combination_indexes);
    let communities = find_communities(&graph);

    let mut clustered = combination_indexes
        .iter()
        .map(|&combination_index| {
            let combination = &combinations[combination_index];
            let cluster = combination
                .sv_ids
                .iter()
                .map(|x| communities[nodes[x.as_str()].index()])
                .min()
                .unwrap_or(0);
            let (mean_allele_frequency, sd_allele_frequency) =
                get_allele_frequency_stats(&combination.allele_frequencies);
            ClusteredCombination {
                combination_index,
                mean_allele_frequency,
                sd_allele_frequency,
                cluster,
                clone_label: String::new(),
            }
        })
        .collect::<Vec<_>>();

    let mut cluster_members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, x) in clustered.iter().enumerate() {
        cluster_members.entry(x.cluster).or_default().push(index);
    }
    for (cluster, member_indexes) in cluster_members {
        let mut members = member_indexes
            .iter()
            .map(|&x| clustered[x].clone())
            .collect::<Vec<_>>();
        assign_cluster_clones(combinations, cluster, &mut members);
        for (&index, member) in member_indexes.iter().zip(members) {
            clustered[index] = member;
        }
    }

    clustered
}
