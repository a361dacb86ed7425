//! Output file naming.
//!
//! Files are named `<stem><index>.jpg` where `stem` is the page OID with
//! path separators replaced by underscores and `index` is the image's
//! position in the slideshow, zero-padded to four digits:
//! `england/london` image 3 becomes `england_london0003.jpg`.

use std::path::{Path, PathBuf};

/// Extension for every written image.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Converts a page OID into a filename stem.
#[must_use]
pub fn page_stem(oid: &str) -> String {
    oid.trim_matches('/').replace(['/', '\\'], "_")
}

/// Returns the file name for image `index` of page `oid`.
#[must_use]
pub fn output_file_name(oid: &str, index: usize) -> String {
    format!("{}{index:04}.{OUTPUT_EXTENSION}", page_stem(oid))
}

/// Returns the full output path for image `index` of page `oid`.
#[must_use]
pub fn output_path(output_dir: &Path, oid: &str, index: usize) -> PathBuf {
    output_dir.join(output_file_name(oid, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_stem_replaces_separators() {
        assert_eq!(page_stem("england/london"), "england_london");
        assert_eq!(page_stem("scotland"), "scotland");
        assert_eq!(page_stem("/wales/"), "wales");
        assert_eq!(page_stem(r"a\b"), "a_b");
    }

    #[test]
    fn test_output_file_name_zero_pads_index() {
        assert_eq!(output_file_name("england/london", 0), "england_london0000.jpg");
        assert_eq!(output_file_name("wales", 42), "wales0042.jpg");
        assert_eq!(output_file_name("wales", 12345), "wales12345.jpg");
    }

    #[test]
    fn test_distinct_pages_same_index_never_collide() {
        let a = output_file_name("england/london", 1);
        let b = output_file_name("scotland/edinburgh", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_path_joins_dir() {
        let path = output_path(Path::new("data"), "england", 7);
        assert_eq!(path, Path::new("data").join("england0007.jpg"));
    }
}
