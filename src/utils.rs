use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};

/// Lists regular files in `dir` whose extension matches one of `extensions`
/// (case-insensitive, without the leading dot), sorted by path.
///
/// Sorting makes every downstream "first-seen" decision independent of the
/// order in which the filesystem returns directory entries.
pub fn list_files_with_extensions(dir: &Path, extensions: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
            });
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Last-modified time of `path`, in UTC.
pub fn file_modified_utc(path: &Path) -> io::Result<DateTime<Utc>> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_matching_files_sorted() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["c.nc4", "a.NC4", "b.h5", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"")?;
        }
        std::fs::create_dir(dir.path().join("nested.nc4"))?;

        let files = list_files_with_extensions(dir.path(), &["nc4".to_string()])?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.NC4", "c.nc4"]);

        let files =
            list_files_with_extensions(dir.path(), &[".h5".to_string(), "txt".to_string()])?;
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result =
            list_files_with_extensions(Path::new("/definitely/not/here"), &["h5".to_string()]);
        assert!(result.is_err());
    }
}
