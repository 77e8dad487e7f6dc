//! Content type lookup
//!
//! Maps a file name's extension to a MIME type.

mod table;

pub use table::lookup_extension;

/// Fallback for names without a recognized extension
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returns the content type for `filename`, judged by its last `.`-delimited extension.
pub fn mime_for(filename: &str) -> &'static str {
    filename
        .rsplit_once('.')
        .and_then(|(_, ext)| lookup_extension(ext))
        .unwrap_or(OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_extension_wins() {
        assert_eq!(mime_for("archive.tar.gz"), "application/gzip");
        assert_eq!(mime_for("app-release.apk"), "application/vnd.android.package-archive");
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(mime_for("noext"), OCTET_STREAM);
        assert_eq!(mime_for("trailing."), OCTET_STREAM);
        assert_eq!(mime_for("weird.zzz"), OCTET_STREAM);
        assert_eq!(mime_for(""), OCTET_STREAM);
    }

    #[test]
    fn test_extension_case_is_ignored() {
        assert_eq!(mime_for("PHOTO.JPG"), "image/jpeg");
        assert_eq!(mime_for(".png"), "image/png");
    }
}
