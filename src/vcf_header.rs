//! Contig and FILTER header lines carried from the input VCFs through to the output VCFs
//!

use std::collections::HashSet;

use rust_htslib::bcf::header::{HeaderRecord, HeaderView};

use crate::chrom_set::ChromSet;

/// A single structured header line along with its ID value
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeaderLine {
    pub id: String,

    /// Full header line, e.g. `##contig=<ID=chr1,length=248956422>`
    pub line: String,
}

/// Header lines taken from one or more input VCF files
#[derive(Clone, Debug, Default)]
pub struct VcfHeaderLines {
    pub contigs: Vec<HeaderLine>,
    pub filters: Vec<HeaderLine>,
}

impl VcfHeaderLines {
    pub fn has_filter(&self, id: &str) -> bool {
        self.filters.iter().any(|x| x.id == id)
    }
}

fn needs_quotes(key: &str, value: &str) -> bool {
    key == "Description" || value.contains([' ', ',', '"', '=', ';'])
}

/// Format one structured header line from its parsed key/value pairs
///
/// The `IDX` value is added by htslib when a header is parsed and is not part of the input text.
///
fn format_structured_line<'a>(
    key: &str,
    values: impl Iterator<Item = (&'a String, &'a String)>,
) -> Option<HeaderLine> {
    let mut id = None;
    let mut fields = Vec::new();
    for (k, v) in values {
        if k == "IDX" {
            continue;
        }
        if k == "ID" {
            id = Some(v.clone());
        }
        if needs_quotes(k, v) {
            fields.push(format!("{k}=\"{}\"", v.replace('"', "\\\"")));
        } else {
            fields.push(format!("{k}={v}"));
        }
    }
    id.map(|id| HeaderLine {
        id,
        line: format!("##{key}=<{}>", fields.join(",")),
    })
}

/// Extract contig and FILTER lines from a parsed VCF header
pub fn get_vcf_header_lines(header: &HeaderView) -> VcfHeaderLines {
    let mut header_lines = VcfHeaderLines::default();
    for record in header.header_records() {
        match record {
            HeaderRecord::Contig { key, values } => {
                if let Some(x) = format_structured_line(&key, values.iter()) {
                    header_lines.contigs.push(x);
                }
            }
            HeaderRecord::Filter { key, values } => {
                if let Some(x) = format_structured_line(&key, values.iter()) {
                    header_lines.filters.push(x);
                }
            }
            _ => {}
        }
    }
    header_lines
}

/// Combine header lines from several input files
///
/// Contig lines are restricted to `chrom_set`, de-duplicated on contig ID with the first entry
/// retained, and sorted by chromosome set order. FILTER lines are de-duplicated on ID and sorted by
/// ID.
///
pub fn combine_header_lines(all_header_lines: &[&VcfHeaderLines], chrom_set: &ChromSet) -> VcfHeaderLines {
    let mut contigs = Vec::new();
    let mut filters = Vec::new();
    let mut contig_ids = HashSet::new();
    let mut filter_ids = HashSet::new();
    for header_lines in all_header_lines {
        for contig in header_lines.contigs.iter() {
            if chrom_set.contains(&contig.id) && contig_ids.insert(contig.id.clone()) {
                contigs.push(contig.clone());
            }
        }
        for filter in header_lines.filters.iter() {
            if filter_ids.insert(filter.id.clone()) {
                filters.push(filter.clone());
            }
        }
    }

    // Contigs are all in the chromosome set, so index_of always succeeds here
    contigs.sort_by_key(|x: &HeaderLine| chrom_set.index_of(&x.id));
    filters.sort_by(|a, b| a.id.cmp(&b.id));

    VcfHeaderLines { contigs, filters }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contig(id: &str, length: usize) -> HeaderLine {
        HeaderLine {
            id: id.to_string(),
            line: format!("##contig=<ID={id},length={length}>"),
        }
    }

    fn filter(id: &str) -> HeaderLine {
        HeaderLine {
            id: id.to_string(),
            line: format!("##FILTER=<ID={id},Description=\"{id} filter\">"),
        }
    }

    #[test]
    fn test_format_structured_line() {
        let values = vec![
            ("ID".to_string(), "GT".to_string()),
            ("Description".to_string(), "Genotype".to_string()),
            ("IDX".to_string(), "3".to_string()),
        ];
        let line = format_structured_line("FILTER", values.iter().map(|(a, b)| (a, b))).unwrap();
        assert_eq!(line.id, "GT");
        assert_eq!(line.line, "##FILTER=<ID=GT,Description=\"Genotype\">");

        let values = vec![("length".to_string(), "100".to_string())];
        assert!(format_structured_line("contig", values.iter().map(|(a, b)| (a, b))).is_none());
    }

    #[test]
    fn test_combine_header_lines() {
        let chrom_set = ChromSet::from_arg("chr1,chr2,chrX").unwrap();

        let h1 = VcfHeaderLines {
            contigs: vec![contig("chrX", 30), contig("chr1", 10), contig("chrM", 5)],
            filters: vec![filter("PASS"), filter("STRANDBIAS")],
        };
        let h2 = VcfHeaderLines {
            contigs: vec![contig("chr2", 20), contig("chr1", 11)],
            filters: vec![filter("GT"), filter("PASS")],
        };

        let combined = combine_header_lines(&[&h1, &h2], &chrom_set);
        let contig_ids = combined.contigs.iter().map(|x| x.id.as_str()).collect::<Vec<_>>();
        assert_eq!(contig_ids, vec!["chr1", "chr2", "chrX"]);
        assert_eq!(combined.contigs[0].line, "##contig=<ID=chr1,length=10>");

        let filter_ids = combined.filters.iter().map(|x| x.id.as_str()).collect::<Vec<_>>();
        assert_eq!(filter_ids, vec!["GT", "PASS", "STRANDBIAS"]);
        assert!(combined.has_filter("GT"));
        assert!(!combined.has_filter("MinQUAL"));
    }
}
