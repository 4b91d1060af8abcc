use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;

use super::combination::SVCombination;

/// A combination selected as a complex SV, with every group label it was assigned
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexSVGroup {
    pub combination_index: usize,

    /// Group labels in assignment order
    pub group_labels: Vec<usize>,
}

impl ComplexSVGroup {
    pub fn group_label(&self) -> String {
        self.group_labels.iter().join(";")
    }
}

/// Partition rows into components of identical SV id sets, each in row order
fn get_identical_set_components(combinations: &[SVCombination], rows: &[usize]) -> Vec<Vec<usize>> {
    let mut components: Vec<Vec<usize>> = Vec::new();
    for &row in rows.iter() {
        match components
            .iter_mut()
            .find(|x| combinations[x[0]].sv_ids == combinations[row].sv_ids)
        {
            Some(component) => component.push(row),
            None => components.push(vec![row]),
        }
    }
    components
}

/// Select the row with the largest SV set, taking the first such row on ties
fn select_representative(combinations: &[SVCombination], component: &[usize]) -> usize {
    let mut representative = component[0];
    for &row in component.iter().skip(1) {
        if combinations[row].sv_count() > combinations[representative].sv_count() {
            representative = row;
        }
    }
    representative
}

/// Add a group label to a combination, registering it as a new group on first use
fn register_group(
    groups: &mut Vec<ComplexSVGroup>,
    registered: &mut HashMap<usize, usize>,
    combination_index: usize,
    group_label: usize,
) {
    match registered.get(&combination_index) {
        Some(&group_index) => groups[group_index].group_labels.push(group_label),
        None => {
            registered.insert(combination_index, groups.len());
            groups.push(ComplexSVGroup {
                combination_index,
                group_labels: vec![group_label],
            });
        }
    }
}

/// Group combinations into complex SVs
///
/// Each SV id is used as a seed, in lexicographic order. When the seed is found in more than one
/// combination, a new group label is created and given to the representative of every component of
/// identical SV sets among those combinations. When the seed is found in one combination, a new
/// group label is only created if that combination does not already have one.
///
/// Groups are returned in order of first registration.
///
pub fn find_complex_sv_groups(combinations: &[SVCombination]) -> Vec<ComplexSVGroup> {
    let mut id_rows: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row, combination) in combinations.iter().enumerate() {
        for sv_id in combination.sv_ids.iter() {
            id_rows.entry(sv_id.as_str()).or_default().push(row);
        }
    }
    let seed_ids = id_rows.keys().copied().collect::<BTreeSet<_>>();

    let mut groups: Vec<ComplexSVGroup> = Vec::new();
    let mut registered: HashMap<usize, usize> = HashMap::new();
    let mut group_label = 0;

    for seed_id in seed_ids {
        let rows = &id_rows[seed_id];
        if rows.len() > 1 {
            group_label += 1;
            for component in get_identical_set_components(combinations, rows) {
                let representative = select_representative(combinations, &component);
                register_group(&mut groups, &mut registered, representative, group_label);
            }
        } else if !registered.contains_key(&rows[0]) {
            group_label += 1;
            register_group(&mut groups, &mut registered, rows[0], group_label);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex_sv::combination::test_utils::get_test_combination;

    #[test]
    fn test_find_complex_sv_groups() {
        let combinations = vec![
            get_test_combination(&["A", "B"], 3),
            get_test_combination(&["B", "C"], 2),
            get_test_combination(&["D", "E"], 2),
        ];
        let groups = find_complex_sv_groups(&combinations);
        assert_eq!(
            groups,
            vec![
                ComplexSVGroup {
                    combination_index: 0,
                    group_labels: vec![1, 2],
                },
                ComplexSVGroup {
                    combination_index: 1,
                    group_labels: vec![2],
                },
                ComplexSVGroup {
                    combination_index: 2,
                    group_labels: vec![3],
                },
            ]
        );
        assert_eq!(groups[0].group_label(), "1;2");
    }

    #[test]
    fn test_whole_token_match() {
        // "A" must not match the "AB" token
        let combinations = vec![
            get_test_combination(&["A", "C"], 2),
            get_test_combination(&["AB", "C"], 2),
        ];
        let groups = find_complex_sv_groups(&combinations);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_labels, vec![1, 3]);
        assert_eq!(groups[1].group_labels, vec![2, 3]);
    }

    #[test]
    fn test_identical_set_components() {
        let combinations = vec![
            get_test_combination(&["A", "B"], 2),
            get_test_combination(&["A", "B", "C"], 2),
            get_test_combination(&["A", "B"], 4),
        ];
        let components = get_identical_set_components(&combinations, &[0, 1, 2]);
        assert_eq!(components, vec![vec![0, 2], vec![1]]);
        assert_eq!(select_representative(&combinations, &[0, 1, 2]), 1);
        assert_eq!(select_representative(&combinations, &[0, 2]), 0);
    }
}
