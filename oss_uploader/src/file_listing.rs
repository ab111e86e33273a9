use std::io;
use std::path::Path;

use tracing::warn;

/// Names of the non-directory entries directly inside `dir`, sorted.
///
/// Entry types are taken from the directory entry without following links.
/// Names that are not valid UTF-8 cannot become object keys and are skipped.
///
/// Upload checkpoints (`<file>.cp`) left by an interrupted run are listed
/// like any other file. Resuming `<file>` removes its checkpoint, so the
/// later `.cp` entry then fails every attempt.
pub fn list_upload_files(dir: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => warn!("skipping {name:?}: file name is not valid UTF-8"),
        }
    }

    names.sort();
    Ok(names)
}
