//! One package's unit in a `Packages` index.

use debstash_catalogue::IndexEntry;

/// The stored control stanza followed by the repository-assigned fields.
/// Every line ends with `\n`; there is no trailing blank line.
pub fn render(entry: &IndexEntry) -> String {
    let package = &entry.package;
    let mut out = String::with_capacity(package.control.len() + 256);
    out.push_str(&package.control);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("Filename: {}\n", entry.path.display()));
    out.push_str(&format!("Size: {}\n", package.size));
    out.push_str(&format!("MD5sum: {}\n", package.md5sum));
    out.push_str(&format!("SHA1: {}\n", package.sha1));
    out.push_str(&format!("SHA256: {}\n", package.sha256));
    if let Some(description_md5) = &package.description_md5 {
        out.push_str(&format!("Description-md5: {description_md5}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use debstash_catalogue::Package;
    use std::path::PathBuf;

    fn entry(control: &str, description_md5: Option<&str>) -> IndexEntry {
        IndexEntry {
            package: Package {
                id: 1,
                name: "hello".into(),
                version: "1.0".into(),
                architecture: "amd64".into(),
                udeb: false,
                control: control.into(),
                size: 42,
                md5sum: "m".into(),
                sha1: "s1".into(),
                sha256: "s256".into(),
                description_md5: description_md5.map(str::to_string),
            },
            path: PathBuf::from("pool/main/h/hello/hello_1.0_amd64.deb"),
        }
    }

    #[test]
    fn full_unit() {
        let rendered = render(&entry("Package: hello\nVersion: 1.0\n", Some("abc")));
        assert_eq!(
            rendered,
            "Package: hello\nVersion: 1.0\n\
             Filename: pool/main/h/hello/hello_1.0_amd64.deb\n\
             Size: 42\n\
             MD5sum: m\n\
             SHA1: s1\n\
             SHA256: s256\n\
             Description-md5: abc\n"
        );
    }

    #[test]
    fn unterminated_control_and_no_description() {
        let rendered = render(&entry("Package: hello", None));
        assert!(rendered.starts_with("Package: hello\nFilename: "));
        assert!(rendered.ends_with("SHA256: s256\n"));
    }
}
