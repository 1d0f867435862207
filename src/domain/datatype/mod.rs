pub mod report;

use base64::{engine::general_purpose::STANDARD, Engine};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::upload::UploadError;

// ### ImageFormat

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Webp,
}

impl ImageFormat {
    /// Detects the format from the extension of a file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            other => other.extension(),
        }
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| UploadError::InvalidType(s.into()))
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ### FileName

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex =
        Regex::new(r"[^A-Za-z0-9_.-]").expect("Expect a valid file name character class");
}

/// Upload file name safe to store and display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileName(String);

impl FileName {
    /// Sanitizes a client supplied file name.
    ///
    /// The name is folded to ASCII through NFKD decomposition, so accented
    /// letters keep their base letter. Path separators become word breaks,
    /// words are joined with `_` and anything outside `[A-Za-z0-9_.-]` is
    /// removed. Leading and trailing `.` and `_` are trimmed, so the result
    /// never names a parent directory or a hidden file.
    pub fn sanitize(raw: &str, format: ImageFormat) -> Self {
        let ascii: String = raw
            .nfkd()
            .filter(char::is_ascii)
            .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
            .collect();
        let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
        let stripped = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
        let trimmed = stripped.trim_matches(|c| c == '.' || c == '_');

        if trimmed.is_empty() {
            return Self(format!("upload.{}", format.extension()));
        }
        Self(trimmed.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates the client file name of an upload, returning its sanitized
/// form and the image format named by its extension.
pub fn validate_file_name(raw: &str) -> Result<(FileName, ImageFormat), UploadError> {
    if raw.is_empty() {
        return Err(UploadError::EmptyFileName);
    }
    let format =
        ImageFormat::from_file_name(raw).ok_or_else(|| UploadError::InvalidType(raw.into()))?;
    Ok((FileName::sanitize(raw, format), format))
}

pub fn validate_size(size: u64, limit: u64) -> Result<(), UploadError> {
    if size > limit {
        return Err(UploadError::TooLarge { size, limit });
    }
    Ok(())
}

// ### ImageUpload

/// Accepted image upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    file_name: FileName,
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: FileName, format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            format,
            bytes,
        }
    }

    pub fn file_name(&self) -> &FileName {
        &self.file_name
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(self.bytes())
    }
}

pub fn data_url(format: ImageFormat, base64: &str) -> String {
    format!("data:{};base64,{}", format.mime_type(), base64)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn detects_allowed_extensions_case_insensitively() {
        assert_eq!(ImageFormat::from_file_name("a.PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_file_name("a.jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_file_name("a.b.JpEg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_file_name("a.gif"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_file_name("a.bmp"), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::from_file_name("a.webp"), Some(ImageFormat::Webp));
    }

    #[test]
    fn rejects_other_names() {
        assert_eq!(ImageFormat::from_file_name("png"), None);
        assert_eq!(ImageFormat::from_file_name("photo.tiff"), None);
        assert_eq!(ImageFormat::from_file_name("photo.png.exe"), None);
        assert_eq!(ImageFormat::from_file_name("photo."), None);
    }

    #[test]
    fn sanitizes_file_names() {
        let cases = [
            ("My cool movie.jpg", "My_cool_movie.jpg"),
            ("../../../etc/passwd.png", "etc_passwd.png"),
            ("  spaced   out .gif", "spaced_out_.gif"),
            ("café☕.png", "cafe.png"),
            ("crème brûlée.png", "creme_brulee.png"),
            ("ﬁsh.jpg", "fish.jpg"),
            ("a;b$c|d.webp", "abcd.webp"),
            (".hidden.bmp", "hidden.bmp"),
        ];
        for (raw, expected) in cases {
            let format = ImageFormat::from_file_name(raw).unwrap();
            assert_eq!(FileName::sanitize(raw, format).as_str(), expected, "{raw}");
        }
    }

    #[test]
    fn sanitize_falls_back_to_a_generic_name() {
        let name = FileName::sanitize("日本語.__", ImageFormat::Webp);
        assert_eq!(name.as_str(), "upload.webp");
    }

    #[test]
    fn validates_file_names_in_order() {
        assert!(matches!(validate_file_name(""), Err(UploadError::EmptyFileName)));
        assert!(matches!(
            validate_file_name("notes.txt"),
            Err(UploadError::InvalidType(name)) if name == "notes.txt"
        ));

        let (name, format) = validate_file_name("dinner plate.JPEG").unwrap();
        assert_eq!(name.as_str(), "dinner_plate.JPEG");
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[test]
    fn validates_size_inclusive_limit() {
        assert!(validate_size(16, 16).is_ok());
        assert!(matches!(
            validate_size(17, 16),
            Err(UploadError::TooLarge { size: 17, limit: 16 })
        ));
    }

    #[test]
    fn encodes_base64_and_data_url() {
        let (name, format) = validate_file_name("dot.png").unwrap();
        let upload = ImageUpload::new(name, format, b"hello".to_vec());
        assert_eq!(upload.base64(), "aGVsbG8=");
        assert_eq!(
            data_url(upload.format(), &upload.base64()),
            "data:image/png;base64,aGVsbG8="
        );
    }
}
