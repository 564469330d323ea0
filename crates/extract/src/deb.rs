//! Reading the control stanza out of a `.deb` (an `ar` archive holding
//! `debian-binary`, `control.tar.*` and `data.tar.*`).

use crate::control::Control;
use crate::digest::open;
use crate::error::{ErrorKind, Result};
use crate::ControlExtractor;
use debstash_compress::Compression;
use exn::{OptionExt, ResultExt};
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::instrument;

const AR_MAGIC: &[u8; 8] = b"!<arch>\n";
const AR_HEADER_LEN: usize = 60;
const AR_HEADER_END: &[u8; 2] = b"`\n";

/// Extracts `./control` from real Debian binary packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebExtractor;

impl ControlExtractor for DebExtractor {
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn control(&self, path: &Path) -> Result<Control> {
        let mut reader = BufReader::new(open(path)?);
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).or_raise(|| ErrorKind::Malformed("not an ar archive".into()))?;
        if &magic != AR_MAGIC {
            exn::bail!(ErrorKind::Malformed("not an ar archive".into()));
        }
        loop {
            let mut header = [0u8; AR_HEADER_LEN];
            match reader.read_exact(&mut header) {
                Ok(()) => {},
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
            }
            let (name, size) = parse_header(&header)?;
            if name.starts_with("control.tar") {
                tracing::debug!(member = %name, size, "found control archive");
                let member = (&mut reader).take(size);
                let format = Compression::from_path(&name);
                let member = format
                    .wrap_reader(member)
                    .or_raise(|| ErrorKind::Malformed(format!("cannot decode {name}")))?;
                let text = read_control_member(member)?;
                return Control::parse(&text);
            }
            // Members are padded to an even length.
            let skip = size + (size % 2);
            let skip = i64::try_from(skip).or_raise(|| ErrorKind::Malformed(format!("member {name} too large")))?;
            reader.seek_relative(skip).or_raise(|| ErrorKind::Io)?;
        }
        exn::bail!(ErrorKind::Malformed("no control.tar member".into()))
    }
}

fn parse_header(header: &[u8; AR_HEADER_LEN]) -> Result<(String, u64)> {
    if &header[58..60] != AR_HEADER_END {
        exn::bail!(ErrorKind::Malformed("bad ar member header".into()));
    }
    let name = String::from_utf8_lossy(&header[0..16]);
    // GNU ar terminates names with a slash.
    let name = name.trim_end().trim_end_matches('/').to_string();
    let size = std::str::from_utf8(&header[48..58])
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_raise(|| ErrorKind::Malformed(format!("bad size for ar member {name}")))?;
    Ok((name, size))
}

fn read_control_member(reader: impl Read) -> Result<String> {
    let unreadable = || ErrorKind::Malformed("unreadable control.tar".into());
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().or_raise(unreadable)? {
        let mut entry = entry.or_raise(unreadable)?;
        let is_control = {
            let path = entry.path().or_raise(unreadable)?;
            path == Path::new("./control") || path == Path::new("control")
        };
        if is_control {
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .or_raise(|| ErrorKind::Malformed("control file is not valid UTF-8".into()))?;
            return Ok(text);
        }
    }
    exn::bail!(ErrorKind::Malformed("control.tar has no control file".into()))
}
