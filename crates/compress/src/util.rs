use crate::Compression;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl Compression {
    /// Returns the file extension for this compression format, including the dot.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Bzip2 => ".bz2",
            Compression::Gzip => ".gz",
            #[cfg(feature = "xz")]
            Compression::Xz => ".xz",
            #[cfg(feature = "zstd")]
            Compression::Zstd => ".zst",
        }
    }

    /// Returns the short name used in configuration.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Bzip2 => "bzip2",
            Compression::Gzip => "gzip",
            #[cfg(feature = "xz")]
            Compression::Xz => "xz",
            #[cfg(feature = "zstd")]
            Compression::Zstd => "zstd",
        }
    }

    /// Append this format's extension to a base file name, e.g. `Packages` to `Packages.gz`.
    #[must_use]
    pub fn file_name(&self, base: &str) -> String {
        format!("{base}{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[rstest]
    #[case(Compression::None, "Packages")]
    #[case(Compression::Bzip2, "Packages.bz2")]
    #[case(Compression::Gzip, "Packages.gz")]
    #[cfg_attr(feature = "xz", case(Compression::Xz, "Packages.xz"))]
    #[cfg_attr(feature = "zstd", case(Compression::Zstd, "Packages.zst"))]
    fn test_file_name(#[case] format: Compression, #[case] expected: &str) {
        assert_eq!(format.file_name("Packages"), expected);
    }

    #[test]
    fn display_matches_config_name() {
        for format in Compression::ALL {
            assert_eq!(format.to_string().parse::<Compression>().unwrap(), *format);
        }
    }
}
