//! Streaming artifact writer.

use crate::artifact::Artifact;
use crate::error::{Error, Result};
use crate::session::IdentifierSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Streams an ordered identifier set to `dir/name`, one identifier per line.
///
/// Lines are written in the set's frozen ascending order, each terminated by
/// a single `\n`, UTF-8 throughout. The file handle is flushed and closed on
/// every exit path; on failure the partial file is removed so a broken write
/// is never left behind looking like a usable artifact.
///
/// This blocks on disk I/O. Callers on an async runtime should wrap it in
/// `spawn_blocking`.
///
/// # Errors
///
/// - [`Error::DestinationUnwritable`] if the file cannot be created
///   (missing directory, permissions).
/// - [`Error::DiskExhausted`] if a write or flush fails mid-stream.
pub fn write_artifact(ids: &IdentifierSet, dir: &Path, name: &str) -> Result<Artifact> {
    let path = dir.join(name);

    let file = File::create(&path).map_err(|source| Error::DestinationUnwritable {
        path: path.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    if let Err(source) = stream_lines(&mut writer, ids) {
        drop(writer);
        let _ = fs::remove_file(&path);
        return Err(Error::DiskExhausted { path, source });
    }
    drop(writer);

    let size_bytes = match fs::metadata(&path) {
        Ok(meta) => meta.len(),
        Err(source) => {
            let _ = fs::remove_file(&path);
            return Err(Error::DiskExhausted { path, source });
        }
    };

    tracing::info!(
        artifact = %name,
        size_bytes,
        lines = ids.len(),
        "artifact written"
    );

    Ok(Artifact {
        name: name.to_owned(),
        path,
        size_bytes,
        line_count: ids.len() as u64,
    })
}

fn stream_lines<W: Write>(writer: &mut W, ids: &IdentifierSet) -> io::Result<()> {
    for id in ids.iter() {
        writer.write_all(id.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::IdentifierSet;
    use tempfile::TempDir;

    fn set(ids: &[&str]) -> IdentifierSet {
        IdentifierSet(ids.iter().map(|s| (*s).to_owned()).collect())
    }

    #[test]
    fn writes_one_identifier_per_line_in_order() {
        let dir = TempDir::new().unwrap();
        let ids = set(&["13912340000", "13912340001", "13912340002"]);

        let artifact = write_artifact(&ids, dir.path(), "out.txt").unwrap();

        assert_eq!(artifact.line_count, 3);
        assert_eq!(artifact.size_bytes, 3 * 12);
        let content = std::fs::read_to_string(&artifact.path).unwrap();
        assert_eq!(content, "13912340000\n13912340001\n13912340002\n");
    }

    #[test]
    fn empty_set_produces_empty_artifact() {
        let dir = TempDir::new().unwrap();
        let artifact = write_artifact(&set(&[]), dir.path(), "empty.txt").unwrap();
        assert_eq!(artifact.size_bytes, 0);
        assert_eq!(artifact.line_count, 0);
        assert!(artifact.path.exists());
    }

    #[test]
    fn missing_directory_is_destination_unwritable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no_such_subdir");
        let err = write_artifact(&set(&["13912340000"]), &missing, "out.txt").unwrap_err();
        assert!(matches!(err, Error::DestinationUnwritable { .. }));
    }
}
