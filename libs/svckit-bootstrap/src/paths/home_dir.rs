use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Errors for resolving the home directory
#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("HOME environment variable is not set")]
    HomeMissing,
    #[error("home_dir must be an absolute path (after ~ expansion): {0}")]
    AbsoluteRequired(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(target_os = "windows")]
fn user_home() -> Option<PathBuf> {
    env::var_os("USERPROFILE")
        .or_else(|| env::var_os("APPDATA"))
        .map(PathBuf::from)
}

#[cfg(not(target_os = "windows"))]
fn user_home() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

/// Expand a leading `~` against `home` and require an absolute result.
fn expand(raw: &str, home: Option<&Path>) -> Result<PathBuf, HomeDirError> {
    let expanded = if raw == "~" {
        home.ok_or(HomeDirError::HomeMissing)?.to_path_buf()
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        home.ok_or(HomeDirError::HomeMissing)?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if !expanded.is_absolute() {
        return Err(HomeDirError::AbsoluteRequired(
            expanded.to_string_lossy().into(),
        ));
    }
    Ok(expanded)
}

/// Resolve the application home directory.
///
/// A configured value may start with `~` and must be absolute after
/// expansion. Without one, `<user home>/<default_subdir>` is used. The
/// directory is created when `create` is set.
pub fn resolve_home_dir(
    config_home: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let home = user_home();
    let path = match config_home {
        Some(raw) => expand(&raw, home.as_deref())?,
        None => home.ok_or(HomeDirError::HomeMissing)?.join(default_subdir),
    };

    if create {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}
