use camino::Utf8Path;
use simple_error::{SimpleResult, bail};

/// Check a required input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_required_filename(filename: &Utf8Path, label: &str) -> SimpleResult<()> {
    if filename.as_str().is_empty() {
        bail!("Must specify {label} file");
    }
    if !filename.exists() {
        bail!("Can't find specified {label} file: '{filename}'");
    }
    if !filename.is_file() {
        bail!("Specified {label} file path does not appear to be a file: '{filename}'");
    }
    Ok(())
}

/// Check that a string label can be used as part of an output filename
///
pub fn check_filename_label(value: &str, label: &str) -> SimpleResult<()> {
    if value.is_empty() {
        bail!("{label} must not be empty");
    }
    if value.contains(std::path::MAIN_SEPARATOR) || value.contains('/') {
        bail!("{label} must not contain a path separator: '{value}'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_filename_label() {
        assert!(check_filename_label("tumour1", "Output label").is_ok());
        assert!(check_filename_label("", "Output label").is_err());
        assert!(check_filename_label("a/b", "Output label").is_err());
    }

    #[test]
    fn test_check_required_filename() {
        assert!(check_required_filename(Utf8Path::new(""), "tumour VCF").is_err());
        assert!(check_required_filename(Utf8Path::new("/no/such/file.vcf"), "tumour VCF").is_err());
        assert!(check_required_filename(Utf8Path::new("Cargo.toml"), "tumour VCF").is_ok());
    }
}
