//! Write annotated SV record tables back to VCF
//!

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rust_htslib::bcf::{self, record::GenotypeAllele, record::Numeric};
use rust_htslib::errors::Error as HtslibError;
use simple_error::{SimpleResult, try_with};

use crate::sv_record::{Precision, SVRecord, SVType};
use crate::vcf_header::VcfHeaderLines;
use crate::vcf_utils;

/// One output VCF row, with the annotations added by the pipeline that produced it
pub struct VcfRow<'a> {
    pub record: &'a SVRecord,
    pub consensus_id: Option<&'a str>,
    pub variant_id: Option<&'a str>,
    pub caller_count: Option<usize>,
}

impl<'a> VcfRow<'a> {
    pub fn new(record: &'a SVRecord) -> Self {
        Self {
            record,
            consensus_id: None,
            variant_id: None,
            caller_count: None,
        }
    }
}

/// Get the VCF output path for a filename stem, with the extension selected by compression
pub fn get_vcf_output_filename(output_dir: &Utf8Path, stem: &str, compress: bool) -> Utf8PathBuf {
    let extension = if compress { "vcf.gz" } else { "vcf" };
    output_dir.join(format!("{stem}.{extension}"))
}

/// Get all header records for an SV VCF, excluding the basic file format and source lines
///
/// Contig lines are added for any row chromosome not already described in `header_lines`, and
/// FILTER lines are added for any row filter without a description.
///
fn get_sv_vcf_header_records(header_lines: &VcfHeaderLines, rows: &[VcfRow]) -> Vec<String> {
    let mut records = Vec::new();

    let mut contig_ids = HashSet::new();
    for contig in header_lines.contigs.iter() {
        contig_ids.insert(contig.id.as_str());
        records.push(contig.line.clone());
    }
    for row in rows.iter() {
        if contig_ids.insert(row.record.chrom.as_str()) {
            records.push(format!("##contig=<ID={}>", row.record.chrom));
        }
    }

    // Note that the `PASS` and `.` FILTER records below are not typically included in the header,
    // but there's an oddity in programatically creating vcfs in htslib that forces these to be present,
    // and specifically ordered before INFO/FORMAT.
    //
    records.push(r#"##FILTER=<ID=PASS,Description="All filters passed">"#.to_string());
    records.push(r#"##FILTER=<ID=.,Description="Unknown filtration status">"#.to_string());
    let mut filter_ids = HashSet::from(["PASS", "."]);
    for filter in header_lines.filters.iter() {
        if filter_ids.insert(filter.id.as_str()) {
            records.push(filter.line.clone());
        }
    }
    for row in rows.iter() {
        for filter in row.record.filters.iter() {
            if filter_ids.insert(filter.as_str()) {
                records.push(format!(
                    "##FILTER=<ID={filter},Description=\"Filter carried from input VCF\">"
                ));
            }
        }
    }

    records.extend(
        [
            r#"##ALT=<ID=INS,Description="Insertion">"#,
            r#"##ALT=<ID=DEL,Description="Deletion">"#,
            r#"##ALT=<ID=DUP,Description="Duplication">"#,
            r#"##ALT=<ID=INV,Description="Inversion">"#,
            r#"##ALT=<ID=BND,Description="Breakend; Translocation">"#,
            r#"##INFO=<ID=PRECISE,Number=0,Type=Flag,Description="Precise structural variant">"#,
            r#"##INFO=<ID=IMPRECISE,Number=0,Type=Flag,Description="Imprecise structural variant">"#,
            r#"##INFO=<ID=ConsensusSV_ID,Number=1,Type=String,Description="Identifier for consensus structural variant">"#,
            r#"##INFO=<ID=Variant_ID,Number=1,Type=String,Description="Identifier shared by matched tumour and normal variants">"#,
            r#"##INFO=<ID=SVTYPE,Number=1,Type=String,Description="Type of structural variant">"#,
            r#"##INFO=<ID=SVLEN,Number=.,Type=Integer,Description="Length of structural variant">"#,
            r#"##INFO=<ID=END,Number=1,Type=Integer,Description="End position of the variant described in this record">"#,
            r#"##INFO=<ID=RNAMES,Number=.,Type=String,Description="Names of reads supporting SVs">"#,
            r#"##INFO=<ID=AF,Number=A,Type=Float,Description="Allele Frequency">"#,
            r#"##INFO=<ID=NUM_CALLERS,Number=1,Type=Integer,Description="Number of SV callers reporting this variant">"#,
            r#"##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">"#,
            r#"##FORMAT=<ID=GQ,Number=1,Type=Integer,Description="Genotype Quality">"#,
            r#"##FORMAT=<ID=DR,Number=1,Type=Integer,Description="Reference Reads">"#,
            r#"##FORMAT=<ID=DV,Number=1,Type=Integer,Description="Variant Reads">"#,
        ]
        .iter()
        .map(|x| x.to_string()),
    );

    records
}

/// Convert a VCF genotype string such as "0/1" or "1|0" into htslib genotype alleles
///
fn parse_genotype(genotype: &str) -> Vec<GenotypeAllele> {
    let mut alleles = Vec::new();
    let mut is_phased = false;
    let mut allele = String::new();
    let mut push_allele = |allele: &str, is_phased: bool| {
        let x = match allele.parse::<i32>() {
            Ok(index) if is_phased => GenotypeAllele::Phased(index),
            Ok(index) => GenotypeAllele::Unphased(index),
            Err(_) if is_phased => GenotypeAllele::PhasedMissing,
            Err(_) => GenotypeAllele::UnphasedMissing,
        };
        alleles.push(x);
    };
    for c in genotype.trim().chars() {
        if c == '/' || c == '|' {
            push_allele(&allele, is_phased);
            allele.clear();
            is_phased = c == '|';
        } else {
            allele.push(c);
        }
    }
    push_allele(&allele, is_phased);
    alleles
}

fn optional_integer(x: Option<i32>) -> i32 {
    x.unwrap_or_else(i32::missing)
}

fn add_sv_info(row: &VcfRow, record: &mut bcf::Record) -> Result<(), HtslibError> {
    let sv = row.record;
    match sv.precision {
        Precision::Precise => record.push_info_flag(b"PRECISE")?,
        Precision::Imprecise => record.push_info_flag(b"IMPRECISE")?,
        Precision::Unknown => {}
    }

    let consensus_id = row.consensus_id.or(sv.input_consensus_id.as_deref());
    if let Some(x) = consensus_id {
        record.push_info_string(b"ConsensusSV_ID", &[x.as_bytes()])?;
    }
    if let Some(x) = row.variant_id {
        record.push_info_string(b"Variant_ID", &[x.as_bytes()])?;
    }

    record.push_info_string(b"SVTYPE", &[sv.sv_type.to_string().as_bytes()])?;
    if sv.sv_type != SVType::Breakend {
        record.push_info_integer(b"SVLEN", &[sv.sv_len as i32])?;
    }
    record.push_info_integer(b"END", &[sv.end as i32])?;
    if !sv.read_names.is_empty() {
        record.push_info_string(b"RNAMES", &[sv.read_names.join(",").as_bytes()])?;
    }
    if let Some(af) = sv.allele_frequency {
        record.push_info_float(b"AF", &[af as f32])?;
    }
    let caller_count = row.caller_count.or(sv.input_caller_count).unwrap_or(1);
    record.push_info_integer(b"NUM_CALLERS", &[caller_count as i32])?;
    Ok(())
}

fn add_sample_info(sv: &SVRecord, record: &mut bcf::Record) -> Result<(), HtslibError> {
    record.push_genotypes(&parse_genotype(&sv.call.genotype))?;
    record.push_format_integer(b"GQ", &[optional_integer(sv.call.genotype_quality)])?;
    record.push_format_integer(b"DR", &[optional_integer(sv.call.ref_reads)])?;
    record.push_format_integer(b"DV", &[optional_integer(sv.call.variant_reads)])?;
    Ok(())
}

fn convert_row_to_vcf_record(vcf: &bcf::Writer, row: &VcfRow) -> Result<bcf::Record, HtslibError> {
    let sv = row.record;
    let mut record = vcf.empty_record();
    let rid = vcf.header().name2rid(sv.chrom.as_bytes())?;
    record.set_rid(Some(rid));
    record.set_pos(sv.pos - 1);
    record.set_id(sv.id.as_bytes())?;
    record.set_alleles(&[sv.ref_allele.as_bytes(), sv.alt_allele.as_bytes()])?;
    record.set_qual(match sv.qual {
        Some(x) => x,
        None => f32::missing(),
    });
    for filter in sv.filters.iter() {
        record.push_filter(filter.as_bytes())?;
    }
    add_sv_info(row, &mut record)?;
    add_sample_info(sv, &mut record)?;
    Ok(record)
}

/// Write SV rows to a single-sample VCF, preserving the row order
///
/// If `compress` is true, the output is bgzipped and a tabix index is built for it.
///
/// Returns the number of records written
///
pub fn write_sv_vcf_file(
    filename: &Utf8Path,
    header_lines: &VcfHeaderLines,
    sample_id: &str,
    rows: &[VcfRow],
    compress: bool,
) -> SimpleResult<usize> {
    info!("Writing {} SV records to file: '{filename}'", rows.len());

    let mut header = vcf_utils::get_basic_vcf_header();
    for x in get_sv_vcf_header_records(header_lines, rows) {
        header.push_record(x.as_bytes());
    }
    header.push_sample(sample_id.as_bytes());

    {
        let mut vcf = try_with!(
            bcf::Writer::from_path(filename, &header, !compress, bcf::Format::Vcf),
            "Unable to create VCF file '{filename}'"
        );
        for row in rows.iter() {
            let record = try_with!(
                convert_row_to_vcf_record(&vcf, row),
                "Failed to convert SV record {} for VCF file '{filename}'",
                row.record
            );
            try_with!(vcf.write(&record), "Failed to write VCF file '{filename}'");
        }
    }

    if compress {
        try_with!(
            vcf_utils::build_bcf_index(filename, true),
            "Failed to index VCF file '{filename}'"
        );
    }

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sv_record::SVCaller;
    use crate::sv_record::test_utils::get_test_record;
    use crate::vcf_header::HeaderLine;

    #[test]
    fn test_parse_genotype() {
        assert_eq!(
            parse_genotype("0/1"),
            vec![GenotypeAllele::Unphased(0), GenotypeAllele::Unphased(1)]
        );
        assert_eq!(
            parse_genotype("1|0"),
            vec![GenotypeAllele::Unphased(1), GenotypeAllele::Phased(0)]
        );
        assert_eq!(
            parse_genotype("./."),
            vec![
                GenotypeAllele::UnphasedMissing,
                GenotypeAllele::UnphasedMissing
            ]
        );
        assert_eq!(parse_genotype(""), vec![GenotypeAllele::UnphasedMissing]);
    }

    #[test]
    fn test_get_vcf_output_filename() {
        let dir = Utf8Path::new("out");
        assert_eq!(
            get_vcf_output_filename(dir, "consensus_sv", false),
            Utf8PathBuf::from("out/consensus_sv.vcf")
        );
        assert_eq!(
            get_vcf_output_filename(dir, "consensus_sv", true),
            Utf8PathBuf::from("out/consensus_sv.vcf.gz")
        );
    }

    #[test]
    fn test_get_sv_vcf_header_records() {
        let header_lines = VcfHeaderLines {
            contigs: vec![HeaderLine {
                id: "chr1".to_string(),
                line: "##contig=<ID=chr1,length=1000>".to_string(),
            }],
            filters: vec![HeaderLine {
                id: "PASS".to_string(),
                line: "##FILTER=<ID=PASS,Description=\"All filters passed\">".to_string(),
            }],
        };
        let mut r1 = get_test_record("a", SVCaller::Sniffles, "chr1", 100, SVType::Deletion, 100);
        r1.filters = vec!["STRANDBIAS".to_string()];
        let r2 = get_test_record("b", SVCaller::Sniffles, "chr2", 100, SVType::Deletion, 100);
        let rows = vec![VcfRow::new(&r1), VcfRow::new(&r2)];

        let records = get_sv_vcf_header_records(&header_lines, &rows);
        assert_eq!(records[0], "##contig=<ID=chr1,length=1000>");
        assert_eq!(records[1], "##contig=<ID=chr2>");

        let pass_count = records
            .iter()
            .filter(|x| x.starts_with("##FILTER=<ID=PASS,"))
            .count();
        assert_eq!(pass_count, 1);
        assert!(records.iter().any(|x| x.starts_with("##FILTER=<ID=STRANDBIAS,")));

        let first_info = records.iter().position(|x| x.starts_with("##INFO")).unwrap();
        let last_filter = records.iter().rposition(|x| x.starts_with("##FILTER")).unwrap();
        assert!(last_filter < first_info);
    }

    /// Write a small VCF and check that it can be read back through the record provider
    #[test]
    fn test_write_sv_vcf_file() {
        use crate::chrom_set::ChromSet;
        use crate::vcf_input::{VcfReadSettings, read_sv_vcf};

        let mut r1 = get_test_record("a", SVCaller::Sniffles, "chr1", 100, SVType::Deletion, 500);
        r1.read_names = vec!["r1".to_string(), "r2".to_string()];
        r1.allele_frequency = Some(0.25);
        r1.call.genotype = "0/1".to_string();
        r1.call.ref_reads = Some(6);
        r1.call.variant_reads = Some(2);
        let mut r2 = get_test_record("b", SVCaller::CuteSV, "chr1", 5000, SVType::Breakend, 0);
        r2.chrom2 = "chr2".to_string();
        r2.end = 700;
        r2.alt_allele = "N[chr2:700[".to_string();
        r2.read_names = vec!["r1".to_string()];
        r2.call.genotype = "1/1".to_string();

        let mut row = VcfRow::new(&r1);
        row.consensus_id = Some("consensusSV.DEL.1");
        row.caller_count = Some(2);
        let rows = vec![row, VcfRow::new(&r2)];

        let filename = Utf8PathBuf::from_path_buf(std::env::temp_dir().join(format!(
            "oncosv_test_write_sv_vcf_{}.vcf",
            std::process::id()
        )))
        .unwrap();
        let count = write_sv_vcf_file(&filename, &VcfHeaderLines::default(), "S1", &rows, false)
            .unwrap();
        assert_eq!(count, 2);

        let chrom_set = ChromSet::from_arg("chr1,chr2").unwrap();
        let settings = VcfReadSettings {
            caller: SVCaller::Consensus,
            sample_id: None,
            chrom_set: &chrom_set,
            min_qual: 0.0,
            min_sv_size: 50,
            max_sv_size: 1_000_000,
            require_read_names: true,
            af_filter: false,
        };
        let result = read_sv_vcf(&filename, &settings).unwrap();
        std::fs::remove_file(&filename).ok();

        assert_eq!(result.sample_id, "S1");
        assert_eq!(result.records.len(), 2);
        let x = &result.records[0];
        assert_eq!(x.id, "a");
        assert_eq!(x.end, 600);
        assert_eq!(x.sv_len, 500);
        assert_eq!(x.read_names, vec!["r1", "r2"]);
        assert_eq!(x.input_consensus_id.as_deref(), Some("consensusSV.DEL.1"));
        assert_eq!(x.input_caller_count, Some(2));
        assert_eq!(x.call.genotype, "0/1");

        let x = &result.records[1];
        assert_eq!(x.sv_type, SVType::Breakend);
        assert_eq!(x.chrom2, "chr2");
        assert_eq!(x.end, 700);
        assert_eq!(x.input_caller_count, Some(1));
    }
}
