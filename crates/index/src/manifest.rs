//! The `Release` manifest of one release.

use crate::writer::IndexFile;
use debstash_config::Release;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc2822;

#[derive(Debug, Clone)]
pub struct ReleaseManifest<'a> {
    release: &'a Release,
    files: Vec<IndexFile>,
}

impl<'a> ReleaseManifest<'a> {
    pub fn new(release: &'a Release, files: Vec<IndexFile>) -> Self {
        Self { release, files }
    }

    pub fn files(&self) -> &[IndexFile] {
        &self.files
    }

    /// Render the manifest text, dated `date` (converted to UTC).
    pub fn render(&self, date: OffsetDateTime) -> String {
        let release = self.release;
        let mut out = String::new();
        let optional = [
            ("Description", &release.description),
            ("Origin", &release.origin),
            ("Label", &release.label),
            ("Version", &release.version),
            ("Suite", &release.suite),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                out.push_str(&format!("{field}: {value}\n"));
            }
        }
        out.push_str(&format!("Codename: {}\n", release.name));
        out.push_str(&format!("Architectures: {}\n", release.architectures.join(" ")));
        out.push_str(&format!("Components: {}\n", release.components.join(" ")));
        out.push_str(&format!("Date: {}\n", format_date(date)));

        let mut files: Vec<&IndexFile> = self.files.iter().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let sections: [(&str, fn(&IndexFile) -> &str); 3] = [
            ("MD5Sum", |f| &f.digests.md5),
            ("SHA1", |f| &f.digests.sha1),
            ("SHA256", |f| &f.digests.sha256),
        ];
        for (section, digest) in sections {
            out.push_str(section);
            out.push_str(":\n");
            for file in &files {
                out.push_str(&format!(" {} {:>9} {}\n", digest(file), file.digests.size, file.path));
            }
        }
        out
    }
}

/// RFC 2822 in UTC, which always renders the offset as `+0000`.
fn format_date(date: OffsetDateTime) -> String {
    let utc = date.to_offset(time::UtcOffset::UTC);
    utc.format(&Rfc2822)
        .unwrap_or_else(|_| format!("{} +0000", utc.unix_timestamp()))
}
