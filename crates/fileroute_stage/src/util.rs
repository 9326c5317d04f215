use std::fs;
use std::io;
use std::path::{Path, PathBuf};

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Parent directory of `path_dst`, or `None` for a bare file name.
///
/// A trailing separator names a directory: `out/new/` has parent `out/new`.
pub(crate) fn derive_parent_dir(path_dst: &Path) -> Option<&Path> {
    if has_trailing_separator(path_dst) {
        return Some(path_dst);
    }
    path_dst
        .parent()
        .filter(|path_parent| !path_parent.as_os_str().is_empty())
}

fn has_trailing_separator(path: &Path) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .last()
        .is_some_and(|&byte| std::path::is_separator(char::from(byte)))
}

/// Whether both paths name the same existing file (hard links included).
pub(crate) fn is_same_file(path_a: &Path, path_b: &Path) -> bool {
    let (Ok(stat_a), Ok(stat_b)) = (fs::metadata(path_a), fs::metadata(path_b)) else {
        return false;
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        stat_a.dev() == stat_b.dev() && stat_a.ino() == stat_b.ino()
    }
    #[cfg(not(unix))]
    {
        let _ = (stat_a, stat_b);
        match (fs::canonicalize(path_a), fs::canonicalize(path_b)) {
            (Ok(path_canon_a), Ok(path_canon_b)) => path_canon_a == path_canon_b,
            _ => false,
        }
    }
}

/// Create the full directory chain above `path_dst`; existing directories are fine.
pub(crate) fn create_parent_dirs(path_dst: &Path) -> Result<(), io::Error> {
    let Some(path_parent) = derive_parent_dir(path_dst) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("No parent directory in path: {}", path_dst.display()),
        ));
    };
    fs::create_dir_all(path_parent)
}

/// When `path_dst` is an existing directory, target `path_dst/<source name>`.
pub(crate) fn resolve_destination_path(path_src: &Path, path_dst: &Path) -> PathBuf {
    if path_dst.is_dir()
        && let Some(name_file) = path_src.file_name()
    {
        return path_dst.join(name_file);
    }
    path_dst.to_path_buf()
}

/// A move into an existing directory never replaces a file already inside it.
pub(crate) fn ensure_vacant_target(path_dst: &Path, path_target: &Path) -> Result<(), io::Error> {
    if path_target != path_dst && path_target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Destination path '{}' already exists", path_target.display()),
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileOperations

pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    // fs::copy truncates the destination, which would empty a self-copy.
    if is_same_file(path_file_src, path_file_dst) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "'{}' and '{}' are the same file",
                path_file_src.display(),
                path_file_dst.display()
            ),
        ));
    }
    fs::copy(path_file_src, path_file_dst)?;
    #[cfg(target_os = "linux")]
    {
        apply_metadata_linux(path_file_src, path_file_dst)?;
    }
    Ok(())
}

/// Rename `path_src` onto `path_dst`; across devices fall back to copy + remove.
pub(crate) fn move_file(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    match fs::rename(path_src, path_dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices && path_src.is_file() => {
            copy_file_with_metadata(path_src, path_dst)?;
            fs::remove_file(path_src)
        }
        Err(e) => Err(e),
    }
}

#[cfg(target_os = "linux")]
fn apply_metadata_linux(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

// Best effort: filesystems without xattr support are common.
#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(error = %e, path = %path_file_dst.display(), "Skipping xattr");
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
