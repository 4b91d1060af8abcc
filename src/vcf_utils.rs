use rust_htslib::bcf::header::{Header, HeaderView};
use rust_htslib::{htslib, utils};

use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};

/// Get a new bcf header which is actually empty so that we can set our own version number
///
fn get_empty_bcf_header() -> Header {
    // Give the incorrect mode to htslib to prevent it from writing the wrong VCF version number.
    // As of 202409 htslib doesn't store the mode argument so this shouldn't break the output.
    //
    let mode = std::ffi::CString::new("r").unwrap();
    Header {
        inner: unsafe { htslib::bcf_hdr_init(mode.as_ptr()) },
        subset: None,
    }
}

/// Builds common fields into a VCF header, upon which contig, filter and record field
/// declarations can be added
///
pub fn get_basic_vcf_header() -> Header {
    let mut header = get_empty_bcf_header();
    header.push_record(b"##fileformat=VCFv4.2");

    let date_string = chrono::Local::now().format("%Y%m%d").to_string();
    header.push_record(format!("##fileDate={date_string}").as_bytes());
    header.push_record(format!("##source=\"{PROGRAM_NAME} {PROGRAM_VERSION}\"").as_bytes());
    let cmdline = std::env::args().collect::<Vec<_>>().join(" ");
    header.push_record(format!("##{PROGRAM_NAME}_cmdline=\"{cmdline}\"").as_bytes());
    header
}

/// Get chrom names from a bcf header, indexed by rid
///
pub fn get_rid_to_chrom_names(header: &HeaderView) -> Vec<String> {
    (0..header.contig_count())
        .map(|rid| {
            let chrom_bytes = header.rid2name(rid).unwrap();
            String::from_utf8_lossy(chrom_bytes).to_string()
        })
        .collect()
}

#[derive(Debug)]
pub struct BcfBuildError {
    pub msg: String,
}

impl BcfBuildError {
    pub fn error_message(error: i32) -> &'static str {
        match error {
            -1 => "indexing failed",
            -2 => "opening @fn failed",
            -3 => "format not indexable",
            -4 => "failed to create and/or save the index",
            _ => "unknown error",
        }
    }
}

impl std::error::Error for BcfBuildError {}

impl std::fmt::Display for BcfBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BcfBuildError{{msg: {}}}", self.msg)
    }
}

/// Build index for bcf or vcf.gz file
///
/// # Arguments
/// * `bcf_path` - Path to bcf/vcf file for indexing
/// * `build_tbi` - If true build older tbi style index, otherwise build csi index
///
pub fn build_bcf_index<P: AsRef<std::path::Path>>(
    bcf_path: P,
    build_tbi: bool,
) -> Result<(), BcfBuildError> {
    let min_shift = if build_tbi { 0 } else { 14 };
    let idx_path_ptr = std::ptr::null();
    let bcf_path = utils::path_to_cstring(&bcf_path).ok_or_else(|| BcfBuildError {
        msg: "Failed to convert bcf index path".to_string(),
    })?;
    let ret = unsafe {
        // Returns 0 if successful, or negative if an error occurred.
        // The final argument is the number of decoder threads.
        htslib::bcf_index_build3(bcf_path.as_ptr(), idx_path_ptr, min_shift, 1)
    };
    match ret {
        0 => Ok(()),
        e => Err(BcfBuildError {
            msg: format!(
                "Failed to build bcf index. Error: {e:?}/{}",
                BcfBuildError::error_message(e)
            ),
        }),
    }
}
