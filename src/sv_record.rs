use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural variant type as reported in the VCF SVTYPE field
///
/// Caller-specific subtypes such as SVIM's `DUP:TANDEM` and `DUP:INT` are reduced to their primary type.
///
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize, strum::Display,
)]
pub enum SVType {
    #[strum(serialize = "DEL")]
    Deletion,
    #[strum(serialize = "DUP")]
    Duplication,
    #[strum(serialize = "INS")]
    Insertion,
    #[strum(serialize = "INV")]
    Inversion,
    #[strum(serialize = "BND")]
    Breakend,
}

impl SVType {
    pub fn from_vcf_label(label: &str) -> Option<Self> {
        use SVType::*;
        let primary_label = label.split(':').next().unwrap_or(label);
        match primary_label {
            "DEL" => Some(Deletion),
            "DUP" => Some(Duplication),
            "INS" => Some(Insertion),
            "INV" => Some(Inversion),
            "BND" | "TRA" => Some(Breakend),
            _ => None,
        }
    }

    pub fn is_deletion_or_duplication(&self) -> bool {
        matches!(self, SVType::Deletion | SVType::Duplication)
    }

    /// True for types which are not subject to the SV size filter
    pub fn bypasses_size_filter(&self) -> bool {
        matches!(self, SVType::Breakend | SVType::Inversion)
    }
}

/// SV caller which produced a record, which also determines how its VCF sample fields are parsed
///
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    Deserialize,
    Serialize,
    clap::ValueEnum,
    strum::Display,
)]
pub enum SVCaller {
    #[strum(serialize = "Sniffles2")]
    #[value(name = "sniffles")]
    Sniffles,
    #[strum(serialize = "cuteSV")]
    #[value(name = "cutesv")]
    CuteSV,
    #[strum(serialize = "SVIM")]
    #[value(name = "svim")]
    Svim,
    #[strum(serialize = "consensus")]
    #[value(name = "consensus")]
    Consensus,
}

impl SVCaller {
    /// Detect the caller from an input filename, for callers which can't be specified directly
    ///
    pub fn from_filename(filename: &str) -> Option<Self> {
        let filename = filename.to_lowercase();
        if filename.contains("sniffles") {
            Some(SVCaller::Sniffles)
        } else if filename.contains("cutesv") {
            Some(SVCaller::CuteSV)
        } else if filename.contains("svim") {
            Some(SVCaller::Svim)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display)]
pub enum Precision {
    #[strum(serialize = "PRECISE")]
    Precise,
    #[strum(serialize = "IMPRECISE")]
    Imprecise,
    #[default]
    #[strum(serialize = ".")]
    Unknown,
}

impl Precision {
    pub fn is_precise(&self) -> bool {
        *self == Precision::Precise
    }
}

/// Per-sample genotype and read support values carried through from the input VCF
///
#[derive(Clone, Debug, Default)]
pub struct SampleCall {
    /// Genotype in VCF text form, e.g. "0/1"
    pub genotype: String,
    pub genotype_quality: Option<i32>,
    pub ref_reads: Option<i32>,
    pub variant_reads: Option<i32>,
}

/// A single SV call from one caller and one sample
///
/// Records are not modified after they are read, later stages attach annotations alongside a record
/// reference instead.
///
#[derive(Clone, Debug)]
pub struct SVRecord {
    /// VCF ID field, unique within a caller's output
    pub id: String,
    pub chrom: String,

    /// 1-indexed position
    pub pos: i64,

    pub chrom2: String,

    /// 1-indexed end position, or the mate position for breakends
    pub end: i64,

    pub sv_type: SVType,

    /// Deletion lengths are normalized to non-negative values
    pub sv_len: i64,

    pub allele_frequency: Option<f64>,
    pub qual: Option<f32>,
    pub precision: Precision,

    /// Supporting read names, de-duplicated in input order
    pub read_names: Vec<String>,

    pub caller: SVCaller,
    pub sample_id: String,

    pub ref_allele: String,
    pub alt_allele: String,
    pub filters: Vec<String>,
    pub call: SampleCall,

    /// Consensus annotations found on input records which were written by an earlier consensus run
    pub input_consensus_id: Option<String>,
    pub input_caller_count: Option<usize>,
}

impl SVRecord {
    pub fn abs_sv_len(&self) -> i64 {
        self.sv_len.abs()
    }
}

impl fmt::Display for SVRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) {}:{}-{}:{} {} len={}",
            self.id,
            self.caller,
            self.chrom,
            self.pos,
            self.chrom2,
            self.end,
            self.sv_type,
            self.sv_len
        )
    }
}
