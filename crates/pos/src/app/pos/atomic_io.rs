use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes through a sibling `.tmp` file and renames it over `path`, so a crash
/// mid-write leaves the previous file or nothing, never half a document.
pub(crate) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    replace_file(&tmp_path, path)
}

/// Returns `true` when a file was removed.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(error),
    }
}

/// `Ok(None)` when the file does not exist yet.
pub(crate) fn read_text_if_exists(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    if let Err(error) = remove_if_exists(final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }

    if let Err(error) = fs::rename(tmp_path, final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("nexus.json");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_existing_file_and_leaves_no_temp() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("settings.json");

        write_bytes_atomic(&path, b"first").expect("first write");
        write_bytes_atomic(&path, b"second").expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn missing_files_read_as_none_and_remove_as_false() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("products.json");

        assert_eq!(read_text_if_exists(&path).expect("read"), None);
        assert!(!remove_if_exists(&path).expect("remove"));

        write_bytes_atomic(&path, b"[]").expect("write");
        assert_eq!(read_text_if_exists(&path).expect("read").as_deref(), Some("[]"));
        assert!(remove_if_exists(&path).expect("remove"));
    }
}
