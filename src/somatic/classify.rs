use std::collections::HashMap;

use log::debug;

use crate::int_range::IntRange;
use crate::sv_record::{SVRecord, SVType};

pub struct ClassifySettings {
    /// Max breakpoint position difference (in either direction) for a tumour/normal match
    pub window: i64,

    /// Deletions and duplications larger than this are matched on one breakpoint only
    pub large_indel_min_size: i64,

    /// Relative length divergence threshold for matched insertions
    pub insertion_sd_ratio: f64,

    /// Relative length divergence threshold for matched large deletions and duplications
    pub large_indel_sd_ratio: f64,
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            window: 200,
            large_indel_min_size: 1000,
            insertion_sd_ratio: 0.3,
            large_indel_sd_ratio: 0.2,
        }
    }
}

/// One record in a classification partition, with its variant id if it was assigned one
#[derive(Clone, Debug)]
pub struct ClassifiedVariant {
    pub record_index: usize,
    pub variant_id: Option<String>,
}

/// Tumour and normal records partitioned by classification
///
/// The first three partitions hold tumour record indexes and the last two hold normal record
/// indexes. All partitions are in input order.
///
#[derive(Debug, Default)]
pub struct ClassifyResult {
    pub somatic: Vec<ClassifiedVariant>,
    pub imprecise_somatic_insertions: Vec<ClassifiedVariant>,
    pub germline_tumour: Vec<ClassifiedVariant>,
    pub germline_normal: Vec<ClassifiedVariant>,
    pub other_normal: Vec<ClassifiedVariant>,

    /// Somatic records which had a positional normal match with divergent SV length
    pub divergent_length_somatic_count: usize,
}

/// Normal records indexed by chromosome and SV type, each list sorted by position
struct NormalIndex<'a> {
    normals: &'a [SVRecord],
    index: HashMap<&'a str, HashMap<SVType, Vec<usize>>>,
}

impl<'a> NormalIndex<'a> {
    fn new(normals: &'a [SVRecord]) -> Self {
        let mut index: HashMap<&str, HashMap<SVType, Vec<usize>>> = HashMap::new();
        for (normal_index, normal) in normals.iter().enumerate() {
            index
                .entry(normal.chrom.as_str())
                .or_default()
                .entry(normal.sv_type)
                .or_default()
                .push(normal_index);
        }

        // Stable sort retains input order for records at the same position
        for normal_indexes in index.values_mut().flat_map(|x| x.values_mut()) {
            normal_indexes.sort_by_key(|&x| normals[x].pos);
        }
        Self { normals, index }
    }

    /// Normal records of the given chromosome and type with position inside `window`
    fn find(&self, chrom: &str, sv_type: SVType, window: &IntRange) -> &[usize] {
        match self.index.get(chrom).and_then(|x| x.get(&sv_type)) {
            Some(normal_indexes) => {
                let begin = normal_indexes.partition_point(|&x| self.normals[x].pos < window.start);
                let end = normal_indexes.partition_point(|&x| self.normals[x].pos < window.end);
                &normal_indexes[begin..end]
            }
            None => &[],
        }
    }
}

fn is_large_indel(sv: &SVRecord, settings: &ClassifySettings) -> bool {
    sv.sv_type.is_deletion_or_duplication() && sv.abs_sv_len() > settings.large_indel_min_size
}

/// Find the nearest normal record matching a tumour record
///
/// Large deletions and duplications are matched on the tumour position, and then on the tumour end
/// only if nothing matched the position. All other types must match both breakpoints, in forward
/// orientation first and then in swapped orientation only if nothing matched forward.
///
/// Candidates are ranked by distance from the tumour position in every orientation, and ties in
/// distance are resolved by normal input order.
///
fn find_normal_match(
    tumour: &SVRecord,
    normal_index: &NormalIndex,
    settings: &ClassifySettings,
) -> Option<usize> {
    let normals = normal_index.normals;
    let pos_window = IntRange::from_window(tumour.pos, settings.window);
    let end_window = IntRange::from_window(tumour.end, settings.window);

    let nearest = |candidates: Vec<usize>, target_pos: i64| {
        candidates
            .into_iter()
            .min_by_key(|&x| ((normals[x].pos - target_pos).abs(), x))
    };

    if is_large_indel(tumour, settings) {
        let forward = normal_index
            .find(&tumour.chrom, tumour.sv_type, &pos_window)
            .to_vec();
        if !forward.is_empty() {
            return nearest(forward, tumour.pos);
        }
        let reverse = normal_index
            .find(&tumour.chrom2, tumour.sv_type, &end_window)
            .to_vec();
        nearest(reverse, tumour.pos)
    } else {
        let forward = normal_index
            .find(&tumour.chrom, tumour.sv_type, &pos_window)
            .iter()
            .copied()
            .filter(|&x| normals[x].chrom2 == tumour.chrom2 && end_window.intersect_pos(normals[x].end))
            .collect::<Vec<_>>();
        if !forward.is_empty() {
            return nearest(forward, tumour.pos);
        }
        let swapped = normal_index
            .find(&tumour.chrom2, tumour.sv_type, &end_window)
            .iter()
            .copied()
            .filter(|&x| normals[x].chrom2 == tumour.chrom && pos_window.intersect_pos(normals[x].end))
            .collect::<Vec<_>>();
        nearest(swapped, tumour.pos)
    }
}

/// Test whether matched tumour and normal SV lengths are too different to be the same event
///
/// This is only applied to insertions and large deletions and duplications. Insertions are only
/// tested when both lengths are non-zero. The length divergence is the standard deviation of the
/// two lengths.
///
fn is_divergent_length(tumour: &SVRecord, normal: &SVRecord, settings: &ClassifySettings) -> bool {
    let ratio = if tumour.sv_type == SVType::Insertion {
        settings.insertion_sd_ratio
    } else if is_large_indel(tumour, settings) {
        settings.large_indel_sd_ratio
    } else {
        return false;
    };
    let tumour_len = tumour.abs_sv_len();
    let normal_len = normal.abs_sv_len();
    if tumour.sv_type == SVType::Insertion && (tumour_len == 0 || normal_len == 0) {
        return false;
    }
    let sd = (tumour_len - normal_len).abs() as f64 / 2.0;
    sd > ratio * normal_len as f64
}

/// Classify tumour records as somatic or germline by matching them against normal records
///
/// Tumour records are processed in input order. Variant ids are assigned from a single counter
/// shared by somatic and germline ids, and a normal record matched by more than one tumour record
/// keeps the germline id assigned by its first match.
///
pub fn classify_variants(
    tumours: &[SVRecord],
    normals: &[SVRecord],
    settings: &ClassifySettings,
) -> ClassifyResult {
    let normal_index = NormalIndex::new(normals);
    let mut normal_variant_ids: Vec<Option<String>> = vec![None; normals.len()];
    let mut result = ClassifyResult::default();
    let mut variant_counter = 0;

    for (tumour_index, tumour) in tumours.iter().enumerate() {
        let normal_match = find_normal_match(tumour, &normal_index, settings);

        let germline_match = match normal_match {
            Some(normal_match) => {
                if is_divergent_length(tumour, &normals[normal_match], settings) {
                    debug!(
                        "Tumour SV {tumour} matches normal SV {} with divergent length",
                        normals[normal_match]
                    );
                    result.divergent_length_somatic_count += 1;
                    None
                } else {
                    Some(normal_match)
                }
            }
            None => None,
        };

        match germline_match {
            Some(normal_match) => {
                let variant_id = match &normal_variant_ids[normal_match] {
                    Some(x) => x.clone(),
                    None => {
                        variant_counter += 1;
                        let x = format!("germline.{}.{variant_counter}", tumour.sv_type);
                        normal_variant_ids[normal_match] = Some(x.clone());
                        x
                    }
                };
                result.germline_tumour.push(ClassifiedVariant {
                    record_index: tumour_index,
                    variant_id: Some(variant_id),
                });
            }
            None => {
                variant_counter += 1;
                let x = ClassifiedVariant {
                    record_index: tumour_index,
                    variant_id: Some(format!("somatic.{}.{variant_counter}", tumour.sv_type)),
                };
                if tumour.sv_type == SVType::Insertion && !tumour.precision.is_precise() {
                    result.imprecise_somatic_insertions.push(x);
                } else {
                    result.somatic.push(x);
                }
            }
        }
    }

    for (normal_index, variant_id) in normal_variant_ids.into_iter().enumerate() {
        let x = ClassifiedVariant {
            record_index: normal_index,
            variant_id,
        };
        if x.variant_id.is_some() {
            result.germline_normal.push(x);
        } else {
            result.other_normal.push(x);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sv_record::test_utils::get_test_record;
    use crate::sv_record::{Precision, SVCaller};

    fn record(id: &str, chrom: &str, pos: i64, sv_type: SVType, sv_len: i64) -> SVRecord {
        get_test_record(id, SVCaller::Consensus, chrom, pos, sv_type, sv_len)
    }

    fn ids(records: &[SVRecord], variants: &[ClassifiedVariant]) -> Vec<String> {
        variants
            .iter()
            .map(|x| records[x.record_index].id.clone())
            .collect()
    }

    #[test]
    fn test_divergent_insertion_is_somatic() {
        let tumours = vec![record("t1", "chr2", 5000, SVType::Insertion, 50)];
        let normals = vec![record("n1", "chr2", 5040, SVType::Insertion, 300)];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&tumours, &result.somatic), vec!["t1"]);
        assert_eq!(
            result.somatic[0].variant_id.as_deref(),
            Some("somatic.INS.1")
        );
        assert_eq!(result.divergent_length_somatic_count, 1);
        assert!(result.germline_tumour.is_empty());
        assert_eq!(ids(&normals, &result.other_normal), vec!["n1"]);
    }

    #[test]
    fn test_germline_match_and_id_reuse() {
        let tumours = vec![
            record("t1", "chr1", 1000, SVType::Deletion, 500),
            record("t2", "chr1", 1010, SVType::Deletion, 500),
            record("t3", "chr1", 9000, SVType::Deletion, 500),
            record("t4", "chr1", 20_000, SVType::Insertion, 100),
        ];
        let normals = vec![
            record("n1", "chr1", 1100, SVType::Deletion, 480),
            record("n2", "chr1", 1005, SVType::Deletion, 500),
            record("n3", "chr1", 20_100, SVType::Insertion, 110),
            record("n4", "chr1", 9000, SVType::Insertion, 500),
        ];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());

        assert_eq!(ids(&tumours, &result.germline_tumour), vec!["t1", "t2", "t4"]);
        let variant_ids = result
            .germline_tumour
            .iter()
            .map(|x| x.variant_id.clone().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            variant_ids,
            vec!["germline.DEL.1", "germline.DEL.1", "germline.INS.3"]
        );

        assert_eq!(ids(&tumours, &result.somatic), vec!["t3"]);
        assert_eq!(result.somatic[0].variant_id.as_deref(), Some("somatic.DEL.2"));

        assert_eq!(ids(&normals, &result.germline_normal), vec!["n2", "n3"]);
        assert_eq!(ids(&normals, &result.other_normal), vec!["n1", "n4"]);
    }

    #[test]
    fn test_nearest_match_tie_uses_input_order() {
        let tumours = vec![record("t1", "chr1", 1000, SVType::Insertion, 100)];
        let normals = vec![
            record("n1", "chr1", 1050, SVType::Insertion, 100),
            record("n2", "chr1", 950, SVType::Insertion, 100),
        ];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&normals, &result.germline_normal), vec!["n1"]);
        assert_eq!(ids(&normals, &result.other_normal), vec!["n2"]);
    }

    #[test]
    fn test_swapped_breakend_match() {
        let mut tumour = record("t1", "chr1", 5000, SVType::Breakend, 0);
        tumour.chrom2 = "chr3".to_string();
        tumour.end = 8000;
        let mut normal = record("n1", "chr3", 8050, SVType::Breakend, 0);
        normal.chrom2 = "chr1".to_string();
        normal.end = 4990;
        let mut unrelated = record("n2", "chr1", 5000, SVType::Breakend, 0);
        unrelated.chrom2 = "chr4".to_string();
        unrelated.end = 8000;

        let tumours = vec![tumour];
        let normals = vec![unrelated, normal];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&tumours, &result.germline_tumour), vec!["t1"]);
        assert_eq!(ids(&normals, &result.germline_normal), vec!["n1"]);
    }

    #[test]
    fn test_large_indel_end_match() {
        // Tumour end is matched against the normal position when the tumour position has no match
        let tumours = vec![record("t1", "chr1", 10_000, SVType::Duplication, 5000)];
        let normals = vec![record("n1", "chr1", 15_100, SVType::Duplication, 5000)];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&tumours, &result.germline_tumour), vec!["t1"]);

        // Length divergence for large indels
        let normals = vec![record("n1", "chr1", 10_050, SVType::Duplication, 9000)];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&tumours, &result.somatic), vec!["t1"]);
    }

    #[test]
    fn test_end_match_ranked_by_tumour_position() {
        // Both normals match the tumour end. The first is further from the tumour end but closer
        // to the tumour position.
        let tumours = vec![record("t1", "chr1", 10_000, SVType::Deletion, 5000)];
        let normals = vec![
            record("n_a", "chr1", 14_850, SVType::Deletion, 5000),
            record("n_b", "chr1", 15_010, SVType::Deletion, 5000),
        ];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&tumours, &result.germline_tumour), vec!["t1"]);
        assert_eq!(ids(&normals, &result.germline_normal), vec!["n_a"]);
        assert_eq!(ids(&normals, &result.other_normal), vec!["n_b"]);
    }

    #[test]
    fn test_swapped_match_ranked_by_tumour_position() {
        let mut t1 = record("t1", "chr1", 5000, SVType::Breakend, 0);
        t1.chrom2 = "chr2".to_string();
        t1.end = 8000;
        let mut n1 = record("n1", "chr2", 7850, SVType::Breakend, 0);
        n1.chrom2 = "chr1".to_string();
        n1.end = 5000;
        let mut n2 = record("n2", "chr2", 8010, SVType::Breakend, 0);
        n2.chrom2 = "chr1".to_string();
        n2.end = 5000;
        let tumours = vec![t1];
        let normals = vec![n2, n1];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&normals, &result.germline_normal), vec!["n1"]);
    }

    #[test]
    fn test_large_indel_zero_length_normal_is_divergent() {
        let tumours = vec![record("t1", "chr1", 10_000, SVType::Deletion, 5000)];
        let mut n1 = record("n1", "chr1", 10_010, SVType::Deletion, 0);
        n1.end = 15_000;
        let normals = vec![n1];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&tumours, &result.somatic), vec!["t1"]);
        assert_eq!(result.divergent_length_somatic_count, 1);

        // Zero length insertions are never divergent
        let tumours = vec![record("t1", "chr1", 10_000, SVType::Insertion, 0)];
        let normals = vec![record("n1", "chr1", 10_010, SVType::Insertion, 300)];
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());
        assert_eq!(ids(&tumours, &result.germline_tumour), vec!["t1"]);
    }

    #[test]
    fn test_imprecise_insertions_partition() {
        let mut t2 = record("t2", "chr1", 5000, SVType::Insertion, 100);
        t2.precision = Precision::Imprecise;
        let tumours = vec![record("t1", "chr1", 1000, SVType::Insertion, 100), t2];
        let result = classify_variants(&tumours, &[], &ClassifySettings::default());
        assert_eq!(ids(&tumours, &result.somatic), vec!["t1"]);
        assert_eq!(ids(&tumours, &result.imprecise_somatic_insertions), vec!["t2"]);
    }

    #[test]
    fn test_partitions_are_complete_and_disjoint() {
        let mut tumours = Vec::new();
        let mut normals = Vec::new();
        let types = [
            SVType::Deletion,
            SVType::Insertion,
            SVType::Duplication,
            SVType::Inversion,
        ];
        for i in 0..40i64 {
            let sv_type = types[(i % 4) as usize];
            let mut t = record(&format!("t{i}"), "chr1", 1000 + i * 170, sv_type, 80 + i * 60);
            if i % 5 == 0 {
                t.precision = Precision::Imprecise;
            }
            tumours.push(t);
            if i % 3 != 0 {
                normals.push(record(
                    &format!("n{i}"),
                    "chr1",
                    1030 + i * 170,
                    sv_type,
                    90 + i * 61,
                ));
            }
        }
        let result = classify_variants(&tumours, &normals, &ClassifySettings::default());

        let mut tumour_indexes = result
            .somatic
            .iter()
            .chain(result.imprecise_somatic_insertions.iter())
            .chain(result.germline_tumour.iter())
            .map(|x| x.record_index)
            .collect::<Vec<_>>();
        tumour_indexes.sort();
        assert_eq!(tumour_indexes, (0..tumours.len()).collect::<Vec<_>>());

        let mut normal_indexes = result
            .germline_normal
            .iter()
            .chain(result.other_normal.iter())
            .map(|x| x.record_index)
            .collect::<Vec<_>>();
        normal_indexes.sort();
        assert_eq!(normal_indexes, (0..normals.len()).collect::<Vec<_>>());
    }
}
