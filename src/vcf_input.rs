//! Read SV calls from caller VCF output into the canonical SV record table
//!

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use camino::Utf8Path;
use log::{debug, info};
use regex::Regex;
use rust_htslib::bcf::{self, Read, record::Numeric};
use serde::Serialize;
use simple_error::{SimpleResult, bail, try_with};

use crate::chrom_set::ChromSet;
use crate::sv_record::{Precision, SVCaller, SVRecord, SVType, SampleCall};
use crate::vcf_header::{VcfHeaderLines, get_vcf_header_lines};
use crate::vcf_utils::get_rid_to_chrom_names;

/// VCF format selection from the command line, where `auto` detects the caller from each filename
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum InputFormat {
    Auto,
    Consensus,
    Sniffles,
    Cutesv,
    Svim,
}

impl InputFormat {
    /// Resolve the caller format to use for one input file
    pub fn resolve_caller(&self, filename: &Utf8Path) -> SimpleResult<SVCaller> {
        Ok(match self {
            InputFormat::Consensus => SVCaller::Consensus,
            InputFormat::Sniffles => SVCaller::Sniffles,
            InputFormat::Cutesv => SVCaller::CuteSV,
            InputFormat::Svim => SVCaller::Svim,
            InputFormat::Auto => match SVCaller::from_filename(filename.as_str()) {
                Some(x) => x,
                None => {
                    bail!(
                        "Can't detect SV caller from VCF filename '{filename}'. Filename must contain 'sniffles', 'cutesv' or 'svim', or the VCF format must be given explicitly"
                    );
                }
            },
        })
    }
}

/// Filtration and parsing options for one VCF input
pub struct VcfReadSettings<'a> {
    pub caller: SVCaller,

    /// Sample to read genotype fields from, the first sample is used if not specified
    pub sample_id: Option<&'a str>,

    pub chrom_set: &'a ChromSet,
    pub min_qual: f32,
    pub min_sv_size: i64,
    pub max_sv_size: i64,

    /// If true, the input header must declare the RNAMES INFO field
    pub require_read_names: bool,

    /// If true, drop non-breakend records without allele frequency and keep only the highest
    /// allele frequency record at each (chrom, pos, end) locus
    pub af_filter: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct VcfReadStats {
    pub input_record_count: usize,
    pub unknown_sv_type_count: usize,
    pub unparsed_breakend_count: usize,
    pub filtered_chrom_count: usize,
    pub filtered_qual_count: usize,
    pub filtered_size_count: usize,
    pub filtered_af_count: usize,
    pub output_record_count: usize,
}

pub struct VcfReadResult {
    pub records: Vec<SVRecord>,
    pub header_lines: VcfHeaderLines,
    pub sample_id: String,
    pub stats: VcfReadStats,
}

static BND_MATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]]([^\[\]:]+):(\d+)[\[\]]").unwrap());

/// Parse the mate chromosome and position from a VCF breakend ALT allele, such as `N[chr2:1000[`
///
fn parse_bnd_mate(alt_allele: &str) -> Option<(String, i64)> {
    let caps = BND_MATE_REGEX.captures(alt_allele)?;
    let pos = caps[2].parse::<i64>().ok()?;
    Some((caps[1].to_string(), pos))
}

fn passes_size_filter(sv_type: SVType, sv_len: i64, min_sv_size: i64, max_sv_size: i64) -> bool {
    if sv_type.bypasses_size_filter() {
        return true;
    }
    let sv_len = sv_len.abs();
    sv_len >= min_sv_size && sv_len <= max_sv_size
}

fn get_info_strings(rec: &bcf::Record, tag: &[u8]) -> Vec<String> {
    match rec.info(tag).string() {
        Ok(Some(x)) => x
            .iter()
            .map(|v| String::from_utf8_lossy(v).to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn get_info_string(rec: &bcf::Record, tag: &[u8]) -> Option<String> {
    get_info_strings(rec, tag).into_iter().next()
}

fn get_info_integer(rec: &bcf::Record, tag: &[u8]) -> Option<i64> {
    match rec.info(tag).integer() {
        Ok(Some(x)) => x.first().filter(|v| !v.is_missing()).map(|&v| v as i64),
        _ => None,
    }
}

fn has_info_flag(rec: &bcf::Record, tag: &[u8]) -> bool {
    rec.info(tag).flag().unwrap_or(false)
}

/// Get the non-missing integer values of a FORMAT field for one sample
fn get_format_integers(rec: &bcf::Record, tag: &[u8], sample_index: usize) -> Option<Vec<i32>> {
    let values = rec.format(tag).integer().ok()?;
    let sample_values = values.get(sample_index)?;
    let sample_values = sample_values
        .iter()
        .take_while(|&&v| v != i32::MIN + 1)
        .filter(|v| !v.is_missing())
        .copied()
        .collect::<Vec<_>>();
    if sample_values.is_empty() {
        None
    } else {
        Some(sample_values)
    }
}

fn get_format_integer(rec: &bcf::Record, tag: &[u8], sample_index: usize) -> Option<i32> {
    get_format_integers(rec, tag, sample_index).and_then(|x| x.first().copied())
}

/// Supporting read names, which may be stored as one comma-separated string or as separate values
///
fn get_read_names(rec: &bcf::Record) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut read_names = Vec::new();
    for value in get_info_strings(rec, b"RNAMES") {
        for name in value.split(',') {
            let name = name.trim();
            if name.is_empty() || name == "." {
                continue;
            }
            if seen.insert(name.to_string()) {
                read_names.push(name.to_string());
            }
        }
    }
    read_names
}

fn get_genotype(rec: &bcf::Record, sample_index: usize) -> String {
    match rec.genotypes() {
        Ok(x) => x.get(sample_index).to_string(),
        Err(_) => ".".to_string(),
    }
}

/// Get sample read support and allele frequency according to the caller's FORMAT conventions
///
fn get_sample_call(
    rec: &bcf::Record,
    caller: SVCaller,
    sv_type: SVType,
    sample_index: usize,
) -> (SampleCall, Option<f64>) {
    let genotype = get_genotype(rec, sample_index);
    let genotype_quality = get_format_integer(rec, b"GQ", sample_index);

    let (ref_reads, variant_reads, allele_frequency) = match caller {
        SVCaller::Svim => {
            let ad = get_format_integers(rec, b"AD", sample_index).filter(|x| x.len() == 2);
            match ad {
                Some(ad) if sv_type != SVType::Breakend => {
                    let total = ad[0] + ad[1];
                    let af = if total > 0 {
                        Some(ad[1] as f64 / total as f64)
                    } else {
                        None
                    };
                    (ad[0], ad[1], af)
                }
                _ => {
                    let support = get_info_integer(rec, b"SUPPORT").unwrap_or(0) as i32;
                    (0, support, None)
                }
            }
        }
        _ => {
            let dr = get_format_integer(rec, b"DR", sample_index).unwrap_or(0);
            let dv = get_format_integer(rec, b"DV", sample_index).unwrap_or(0);
            let total = dr + dv;
            let af = if total > 0 {
                dv as f64 / total as f64
            } else {
                0.0
            };
            (dr, dv, Some(af))
        }
    };

    let call = SampleCall {
        genotype,
        genotype_quality,
        ref_reads: Some(ref_reads),
        variant_reads: Some(variant_reads),
    };
    (call, allele_frequency)
}

fn get_precision(rec: &bcf::Record, caller: SVCaller) -> Precision {
    if caller == SVCaller::Svim {
        Precision::Unknown
    } else if has_info_flag(rec, b"PRECISE") {
        Precision::Precise
    } else if has_info_flag(rec, b"IMPRECISE") {
        Precision::Imprecise
    } else {
        Precision::Unknown
    }
}

fn get_filters(rec: &bcf::Record) -> Vec<String> {
    let header = rec.header();
    rec.filters()
        .map(|id| String::from_utf8_lossy(&header.id_to_name(id)).to_string())
        .collect()
}

/// Drop non-breakend records without allele frequency, then retain only the highest allele
/// frequency record at each (chrom, pos, end) locus
///
/// Ties keep the first record in input order, and input order is preserved in the output.
///
fn filter_max_af_records(records: Vec<SVRecord>) -> (Vec<SVRecord>, usize) {
    let mut best: HashMap<(&str, i64, i64), (usize, f64)> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        if record.sv_type == SVType::Breakend {
            continue;
        }
        let Some(af) = record.allele_frequency else {
            continue;
        };
        let key = (record.chrom.as_str(), record.pos, record.end);
        best.entry(key)
            .and_modify(|x| {
                if af > x.1 {
                    *x = (index, af);
                }
            })
            .or_insert((index, af));
    }
    let keep = best.values().map(|x| x.0).collect::<HashSet<_>>();

    let input_count = records.len();
    let records = records
        .into_iter()
        .enumerate()
        .filter(|(index, record)| record.sv_type == SVType::Breakend || keep.contains(index))
        .map(|(_, record)| record)
        .collect::<Vec<_>>();
    let filtered_count = input_count - records.len();
    (records, filtered_count)
}

/// Read all SV records from one caller VCF
///
/// Records are returned in input order after chromosome, quality, size and optional allele
/// frequency filtration.
///
pub fn read_sv_vcf(filename: &Utf8Path, settings: &VcfReadSettings) -> SimpleResult<VcfReadResult> {
    info!(
        "Reading {} SV calls from file: '{filename}'",
        settings.caller
    );

    let mut reader = try_with!(
        bcf::Reader::from_path(filename),
        "Unable to open VCF file '{filename}'"
    );
    let header = reader.header();

    if header.info_type(b"SVTYPE").is_err() {
        bail!("VCF file '{filename}' header does not declare required INFO field SVTYPE");
    }
    if settings.require_read_names && header.info_type(b"RNAMES").is_err() {
        bail!(
            "VCF file '{filename}' header does not declare INFO field RNAMES, which is required to find supporting read names"
        );
    }

    let (sample_index, sample_id) = match settings.sample_id {
        Some(sample_id) => match header.sample_id(sample_id.as_bytes()) {
            Some(x) => (x, sample_id.to_string()),
            None => {
                bail!("Sample '{sample_id}' not found in VCF file '{filename}'");
            }
        },
        None => match header.samples().first() {
            Some(x) => (0, String::from_utf8_lossy(x).to_string()),
            None => {
                bail!("VCF file '{filename}' has no sample columns");
            }
        },
    };

    let rid_to_chrom = get_rid_to_chrom_names(header);
    let header_lines = get_vcf_header_lines(header);

    let caller = settings.caller;
    let mut stats = VcfReadStats::default();
    let mut records = Vec::new();

    let mut rec = reader.empty_record();
    while let Some(r) = reader.read(&mut rec) {
        try_with!(r, "Failed to parse variant record from VCF file '{filename}'");
        stats.input_record_count += 1;
        let record_number = stats.input_record_count;

        let chrom = match rec.rid() {
            Some(rid) => rid_to_chrom[rid as usize].clone(),
            None => {
                bail!("VCF record {record_number} in file '{filename}' has no chromosome");
            }
        };
        if !settings.chrom_set.contains(&chrom) {
            stats.filtered_chrom_count += 1;
            continue;
        }

        let sv_type = match get_info_string(&rec, b"SVTYPE")
            .as_deref()
            .and_then(SVType::from_vcf_label)
        {
            Some(x) => x,
            None => {
                stats.unknown_sv_type_count += 1;
                continue;
            }
        };

        let pos = rec.pos() + 1;
        let alleles = rec.alleles();
        let ref_allele = String::from_utf8_lossy(alleles[0]).to_string();
        let alt_allele = match alleles.get(1) {
            Some(x) => String::from_utf8_lossy(x).to_string(),
            None => ".".to_string(),
        };

        let (chrom2, end) = if sv_type == SVType::Breakend {
            match parse_bnd_mate(&alt_allele) {
                Some(x) => x,
                None => {
                    debug!("Skipping breakend with unparsed mate location: {chrom}:{pos} {alt_allele}");
                    stats.unparsed_breakend_count += 1;
                    continue;
                }
            }
        } else {
            let chrom2 = get_info_string(&rec, b"CHR2").unwrap_or_else(|| chrom.clone());
            let end = get_info_integer(&rec, b"END")
                .unwrap_or(pos + ref_allele.len() as i64 - 1);
            (chrom2, end)
        };

        let sv_len = {
            let x = get_info_integer(&rec, b"SVLEN").unwrap_or(0);
            if sv_type == SVType::Deletion { x.abs() } else { x }
        };

        let qual = {
            let q = rec.qual();
            if q.is_missing() || q.is_nan() { None } else { Some(q) }
        };
        if qual.unwrap_or(0.0) < settings.min_qual {
            stats.filtered_qual_count += 1;
            continue;
        }

        if !passes_size_filter(sv_type, sv_len, settings.min_sv_size, settings.max_sv_size) {
            stats.filtered_size_count += 1;
            continue;
        }

        let id = {
            let x = String::from_utf8_lossy(&rec.id()).to_string();
            if x.is_empty() || x == "." {
                format!("{caller}.{sv_type}.{record_number}")
            } else {
                x
            }
        };

        let (call, allele_frequency) = get_sample_call(&rec, caller, sv_type, sample_index);

        let (input_consensus_id, input_caller_count) = if caller == SVCaller::Consensus {
            (
                get_info_string(&rec, b"ConsensusSV_ID"),
                get_info_integer(&rec, b"NUM_CALLERS").map(|x| x as usize),
            )
        } else {
            (None, None)
        };

        records.push(SVRecord {
            id,
            chrom,
            pos,
            chrom2,
            end,
            sv_type,
            sv_len,
            allele_frequency,
            qual,
            precision: get_precision(&rec, caller),
            read_names: get_read_names(&rec),
            caller,
            sample_id: sample_id.clone(),
            ref_allele,
            alt_allele,
            filters: get_filters(&rec),
            call,
            input_consensus_id,
            input_caller_count,
        });
    }

    if settings.af_filter {
        let (filtered_records, filtered_af_count) = filter_max_af_records(records);
        records = filtered_records;
        stats.filtered_af_count = filtered_af_count;
    }

    stats.output_record_count = records.len();

    info!(
        "Read {} of {} SV records from file: '{filename}'",
        stats.output_record_count, stats.input_record_count
    );
    if stats.unknown_sv_type_count > 0 || stats.unparsed_breakend_count > 0 {
        info!(
            "Skipped {} records with unrecognized SVTYPE and {} breakends with unparsed mate location",
            stats.unknown_sv_type_count, stats.unparsed_breakend_count
        );
    }

    Ok(VcfReadResult {
        records,
        header_lines,
        sample_id,
        stats,
    })
}
