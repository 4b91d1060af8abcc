use std::collections::HashMap;

use simple_error::{SimpleResult, bail};

/// Keyword selecting the default human autosome and sex chromosome set
pub const ALL_CHROMS_KEYWORD: &str = "all";

/// Ordered set of chromosome labels selected for analysis
///
/// The label order defines chromosome processing order for consensus merging and the sort order of
/// all VCF output.
///
#[derive(Clone, Debug, Default)]
pub struct ChromSet {
    pub labels: Vec<String>,
    label_to_index: HashMap<String, usize>,
}

impl ChromSet {
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> SimpleResult<Self> {
        let mut chrom_set = Self::default();
        for label in labels.iter().map(|x| x.as_ref().trim()) {
            if label.is_empty() {
                bail!("Empty chromosome name in chromosome list");
            }
            if chrom_set.label_to_index.contains_key(label) {
                bail!("Chromosome name '{label}' repeated in chromosome list");
            }
            chrom_set
                .label_to_index
                .insert(label.to_string(), chrom_set.labels.len());
            chrom_set.labels.push(label.to_string());
        }
        Ok(chrom_set)
    }

    /// chr1-chr22, chrX and chrY
    pub fn default_human() -> Self {
        let labels = (1..=22)
            .map(|x| format!("chr{x}"))
            .chain(["chrX".to_string(), "chrY".to_string()])
            .collect::<Vec<_>>();
        // Labels are unique by construction
        Self::from_labels(&labels).unwrap()
    }

    /// Parse the command-line chromosome argument, either `all` or a comma-separated list
    pub fn from_arg(arg: &str) -> SimpleResult<Self> {
        if arg.trim() == ALL_CHROMS_KEYWORD {
            Ok(Self::default_human())
        } else {
            let labels = arg.split(',').collect::<Vec<_>>();
            Self::from_labels(&labels)
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.label_to_index.contains_key(label)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.label_to_index.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|x| x.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_human() {
        let chroms = ChromSet::from_arg("all").unwrap();
        assert_eq!(chroms.len(), 24);
        assert_eq!(chroms.index_of("chr1"), Some(0));
        assert_eq!(chroms.index_of("chr10"), Some(9));
        assert_eq!(chroms.index_of("chrY"), Some(23));
        assert!(!chroms.contains("chrM"));
    }

    #[test]
    fn test_chrom_list_arg() {
        let chroms = ChromSet::from_arg("chr2, chr1").unwrap();
        assert_eq!(chroms.labels, vec!["chr2", "chr1"]);
        assert_eq!(chroms.index_of("chr1"), Some(1));

        assert!(ChromSet::from_arg("chr1,,chr2").is_err());
        assert!(ChromSet::from_arg("chr1,chr1").is_err());
    }
}
