mod classify;

use camino::Utf8Path;
use log::info;
use serde::Serialize;
use simple_error::SimpleResult;

use self::classify::{ClassifiedVariant, ClassifySettings, classify_variants};
use crate::cli::{PairSettings, SVFilterSettings};
use crate::csv_output::write_csv_table;
use crate::filenames::{
    GERMLINE_NORMAL_EVIDENCE_VCF_SUFFIX, GERMLINE_VCF_SUFFIX, MERGED_NORMAL_CSV_FILENAME,
    MOSAIC_NORMAL_VCF_SUFFIX, SOMATIC_IMPRECISE_INSERTIONS_VCF_SUFFIX, SOMATIC_VCF_SUFFIX,
};
use crate::run_stats::{
    ClassifyStats, InputVcfStats, OutputFileStats, PairRunStats, RunStep, write_run_stats,
};
use crate::sv_record::{SVCaller, SVRecord};
use crate::vcf_header::{VcfHeaderLines, combine_header_lines};
use crate::vcf_input::{InputFormat, VcfReadResult, VcfReadSettings, read_sv_vcf};
use crate::vcf_output::{VcfRow, get_vcf_output_filename, write_sv_vcf_file};

/// One row of the merged normal record table
#[derive(Serialize)]
struct MergedNormalRow<'a> {
    #[serde(rename = "Sample")]
    sample: &'a str,
    #[serde(rename = "Caller")]
    caller: String,
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "CHROM")]
    chrom: &'a str,
    #[serde(rename = "POS")]
    pos: i64,
    #[serde(rename = "CHROM2")]
    chrom2: &'a str,
    #[serde(rename = "END")]
    end: i64,
    #[serde(rename = "SVTYPE")]
    sv_type: String,
    #[serde(rename = "SVLEN")]
    sv_len: i64,
    #[serde(rename = "QUAL")]
    qual: Option<f32>,
    #[serde(rename = "FILTER")]
    filter: String,
    #[serde(rename = "PRECISION")]
    precision: String,
    #[serde(rename = "GT")]
    genotype: &'a str,
    #[serde(rename = "AF")]
    allele_frequency: Option<f64>,
}

impl<'a> MergedNormalRow<'a> {
    fn new(sv: &'a SVRecord) -> Self {
        Self {
            sample: &sv.sample_id,
            caller: sv.caller.to_string(),
            id: &sv.id,
            chrom: &sv.chrom,
            pos: sv.pos,
            chrom2: &sv.chrom2,
            end: sv.end,
            sv_type: sv.sv_type.to_string(),
            sv_len: sv.sv_len,
            qual: sv.qual,
            filter: sv.filters.join(";"),
            precision: sv.precision.to_string(),
            genotype: &sv.call.genotype,
            allele_frequency: sv.allele_frequency,
        }
    }
}

/// Tumour files that don't carry a caller name are read as consensus output in auto mode
fn resolve_tumour_caller(vcf_format: InputFormat, filename: &Utf8Path) -> SimpleResult<SVCaller> {
    match vcf_format {
        InputFormat::Auto => {
            Ok(SVCaller::from_filename(filename.as_str()).unwrap_or(SVCaller::Consensus))
        }
        _ => vcf_format.resolve_caller(filename),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PairSample {
    Tumour,
    Normal,
}

/// Get read settings for one side of the tumour/normal pair
///
/// Normal records are read without the QUAL filter. Only the tumour side is reduced to the highest
/// allele frequency record at each locus.
///
fn get_pair_read_settings<'a>(
    filter: &'a SVFilterSettings,
    caller: SVCaller,
    sample_id: Option<&'a str>,
    pair_sample: PairSample,
) -> VcfReadSettings<'a> {
    let is_tumour = pair_sample == PairSample::Tumour;
    VcfReadSettings {
        caller,
        sample_id,
        chrom_set: &filter.chrom_set,
        min_qual: if is_tumour { filter.min_qual } else { 0.0 },
        min_sv_size: filter.min_sv_size,
        max_sv_size: filter.max_sv_size,
        require_read_names: false,
        af_filter: is_tumour,
    }
}

fn read_pair_input(
    filename: &Utf8Path,
    caller: SVCaller,
    sample_id: Option<&str>,
    pair_sample: PairSample,
    settings: &PairSettings,
    input_stats: &mut Vec<InputVcfStats>,
) -> SimpleResult<VcfReadResult> {
    let read_settings = get_pair_read_settings(&settings.filter, caller, sample_id, pair_sample);
    let mut result = read_sv_vcf(filename, &read_settings)?;
    info!(
        "Read {} SV records from {caller} VCF file '{filename}'",
        result.records.len()
    );
    input_stats.push(InputVcfStats {
        filename: filename.to_string(),
        caller,
        sample_id: result.sample_id.clone(),
        read_stats: std::mem::take(&mut result.stats),
    });
    Ok(result)
}

fn get_vcf_rows<'a>(records: &'a [SVRecord], variants: &'a [ClassifiedVariant]) -> Vec<VcfRow<'a>> {
    variants
        .iter()
        .map(|x| VcfRow {
            variant_id: x.variant_id.as_deref(),
            ..VcfRow::new(&records[x.record_index])
        })
        .collect()
}

struct PairOutputWriter<'a> {
    settings: &'a PairSettings,
    output: Vec<OutputFileStats>,
}

impl PairOutputWriter<'_> {
    fn write(
        &mut self,
        suffix: &str,
        header_lines: &VcfHeaderLines,
        sample_id: &str,
        rows: &[VcfRow],
    ) -> SimpleResult<()> {
        let stem = format!("{}_{suffix}", self.settings.output_label);
        let filename =
            get_vcf_output_filename(&self.settings.output_dir, &stem, self.settings.compress);
        let record_count =
            write_sv_vcf_file(&filename, header_lines, sample_id, rows, self.settings.compress)?;
        self.output.push(OutputFileStats {
            filename: filename.to_string(),
            record_count,
        });
        Ok(())
    }
}

/// Classify tumour SV calls as somatic or germline and write each classification to VCF
pub fn run_pair(settings: &PairSettings) -> SimpleResult<()> {
    let mut input_stats = Vec::new();

    let tumour_caller = resolve_tumour_caller(settings.vcf_format, &settings.tumour)?;
    let tumour = read_pair_input(
        &settings.tumour,
        tumour_caller,
        settings.tumour_id.as_deref(),
        PairSample::Tumour,
        settings,
        &mut input_stats,
    )?;

    // Records from all normal files are merged into a single normal table in input order
    let mut normals = Vec::new();
    let mut normal_header_lines = Vec::new();
    let mut normal_sample_id = None;
    for filename in settings.normal.iter() {
        let caller = settings.vcf_format.resolve_caller(filename)?;
        let result = read_pair_input(
            filename,
            caller,
            settings.normal_id.as_deref(),
            PairSample::Normal,
            settings,
            &mut input_stats,
        )?;
        normal_sample_id.get_or_insert(result.sample_id);
        normal_header_lines.push(result.header_lines);
        normals.extend(result.records);
    }
    let normal_sample_id = normal_sample_id.unwrap_or_default();
    info!("Merged {} normal SV records", normals.len());

    let mut output = Vec::new();
    if settings.save_merged_normal {
        let filename = settings.output_dir.join(MERGED_NORMAL_CSV_FILENAME);
        let rows = normals.iter().map(MergedNormalRow::new).collect::<Vec<_>>();
        let record_count = write_csv_table(&filename, &rows)?;
        output.push(OutputFileStats {
            filename: filename.to_string(),
            record_count,
        });
    }

    let classify_settings = ClassifySettings {
        window: settings.window_size,
        ..Default::default()
    };
    let result = classify_variants(&tumour.records, &normals, &classify_settings);
    info!(
        "Classified tumour SV records as {} somatic, {} imprecise somatic insertions and {} germline",
        result.somatic.len(),
        result.imprecise_somatic_insertions.len(),
        result.germline_tumour.len()
    );
    info!(
        "Classified normal SV records as {} germline evidence and {} possible mosaic",
        result.germline_normal.len(),
        result.other_normal.len()
    );

    let chrom_set = &settings.filter.chrom_set;
    let tumour_header_lines = combine_header_lines(&[&tumour.header_lines], chrom_set);
    let normal_header_lines =
        combine_header_lines(&normal_header_lines.iter().collect::<Vec<_>>(), chrom_set);

    let mut writer = PairOutputWriter { settings, output };
    writer.write(
        SOMATIC_VCF_SUFFIX,
        &tumour_header_lines,
        &tumour.sample_id,
        &get_vcf_rows(&tumour.records, &result.somatic),
    )?;
    if !settings.only_somatic {
        writer.write(
            GERMLINE_VCF_SUFFIX,
            &tumour_header_lines,
            &tumour.sample_id,
            &get_vcf_rows(&tumour.records, &result.germline_tumour),
        )?;
        writer.write(
            GERMLINE_NORMAL_EVIDENCE_VCF_SUFFIX,
            &normal_header_lines,
            &normal_sample_id,
            &get_vcf_rows(&normals, &result.germline_normal),
        )?;
        writer.write(
            MOSAIC_NORMAL_VCF_SUFFIX,
            &normal_header_lines,
            &normal_sample_id,
            &get_vcf_rows(&normals, &result.other_normal),
        )?;
    }
    if !result.imprecise_somatic_insertions.is_empty() {
        writer.write(
            SOMATIC_IMPRECISE_INSERTIONS_VCF_SUFFIX,
            &tumour_header_lines,
            &tumour.sample_id,
            &get_vcf_rows(&tumour.records, &result.imprecise_somatic_insertions),
        )?;
    }

    let classify_stats = ClassifyStats {
        tumour_record_count: tumour.records.len(),
        normal_record_count: normals.len(),
        somatic_count: result.somatic.len(),
        imprecise_somatic_insertion_count: result.imprecise_somatic_insertions.len(),
        divergent_length_somatic_count: result.divergent_length_somatic_count,
        germline_tumour_count: result.germline_tumour.len(),
        germline_normal_count: result.germline_normal.len(),
        other_normal_count: result.other_normal.len(),
    };
    write_run_stats(
        &settings.output_dir,
        &PairRunStats {
            run_step: RunStep::new("pair"),
            input: input_stats,
            classify_stats,
            output: writer.output,
        },
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrom_set::ChromSet;
    use crate::sv_record::SVType;
    use crate::sv_record::test_utils::get_test_record;

    #[test]
    fn test_resolve_tumour_caller() {
        assert_eq!(
            resolve_tumour_caller(InputFormat::Auto, Utf8Path::new("tumour.vcf")).unwrap(),
            SVCaller::Consensus
        );
        assert_eq!(
            resolve_tumour_caller(InputFormat::Auto, Utf8Path::new("tumour.cuteSV.vcf")).unwrap(),
            SVCaller::CuteSV
        );
        assert_eq!(
            resolve_tumour_caller(InputFormat::Svim, Utf8Path::new("tumour.vcf")).unwrap(),
            SVCaller::Svim
        );
    }

    #[test]
    fn test_get_pair_read_settings() {
        let filter = SVFilterSettings {
            chrom: "chr1".to_string(),
            chrom_set: ChromSet::from_arg("chr1").unwrap(),
            min_qual: 10.0,
            min_sv_size: 50,
            max_sv_size: 1_000_000,
        };

        let x = get_pair_read_settings(&filter, SVCaller::Consensus, Some("T1"), PairSample::Tumour);
        approx::assert_ulps_eq!(x.min_qual, 10.0);
        assert!(x.af_filter);
        assert_eq!(x.sample_id, Some("T1"));

        let x = get_pair_read_settings(&filter, SVCaller::Sniffles, None, PairSample::Normal);
        approx::assert_ulps_eq!(x.min_qual, 0.0);
        assert!(!x.af_filter);
        assert!(!x.require_read_names);
        assert_eq!(x.min_sv_size, 50);
    }

    #[test]
    fn test_get_vcf_rows() {
        let records = vec![
            get_test_record("t1", SVCaller::Consensus, "chr1", 100, SVType::Deletion, 60),
            get_test_record("t2", SVCaller::Consensus, "chr1", 900, SVType::Deletion, 60),
        ];
        let variants = vec![ClassifiedVariant {
            record_index: 1,
            variant_id: Some("somatic.DEL.1".to_string()),
        }];
        let rows = get_vcf_rows(&records, &variants);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.id, "t2");
        assert_eq!(rows[0].variant_id, Some("somatic.DEL.1"));
        assert_eq!(rows[0].consensus_id, None);
    }

    #[test]
    fn test_merged_normal_row() {
        let mut sv = get_test_record("n1", SVCaller::Sniffles, "chr2", 500, SVType::Insertion, 80);
        sv.allele_frequency = Some(0.25);
        let row = MergedNormalRow::new(&sv);
        assert_eq!(row.caller, "Sniffles2");
        assert_eq!(row.sv_type, "INS");
        assert_eq!(row.filter, "PASS");
        assert_eq!(row.precision, "PRECISE");
    }
}
