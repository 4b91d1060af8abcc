use std::collections::BTreeMap;

use super::groups::ComplexSVGroup;

/// Disjoint-set union over group labels 1..=max_label
///
/// The smaller root always becomes the parent in a union, so each set's root is its smallest label.
///
struct GroupLabelUnion {
    parent: Vec<usize>,
}

impl GroupLabelUnion {
    fn new(max_label: usize) -> Self {
        Self {
            parent: (0..=max_label).collect(),
        }
    }

    fn find(&mut self, label: usize) -> usize {
        let mut root = label;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression
        let mut x = label;
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, label1: usize, label2: usize) {
        let root1 = self.find(label1);
        let root2 = self.find(label2);
        if root1 < root2 {
            self.parent[root2] = root1;
        } else if root2 < root1 {
            self.parent[root1] = root2;
        }
    }
}

/// Assign a network id to each complex SV group
///
/// Groups sharing any group label are joined into the same network, transitively. Network ids are
/// numbered from 1 in ascending order of the smallest group label in each network.
///
pub fn assign_networks(groups: &[ComplexSVGroup]) -> Vec<usize> {
    let max_label = groups
        .iter()
        .flat_map(|x| x.group_labels.iter().copied())
        .max()
        .unwrap_or(0);

    let mut label_union = GroupLabelUnion::new(max_label);
    for group in groups.iter() {
        if let Some((&first, others)) = group.group_labels.split_first() {
            for &label in others.iter() {
                label_union.union(first, label);
            }
        }
    }

    let roots = groups
        .iter()
        .map(|x| label_union.find(x.group_labels.first().copied().unwrap_or(0)))
        .collect::<Vec<_>>();

    let mut network_ids = BTreeMap::new();
    for &root in roots.iter() {
        network_ids.insert(root, 0);
    }
    for (index, network_id) in network_ids.values_mut().enumerate() {
        *network_id = index + 1;
    }

    roots.into_iter().map(|x| network_ids[&x]).collect()
}
