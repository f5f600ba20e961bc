//! Path resolution between logical names and repository paths.
//!
//! Content lives below `content_dir`; assets live below
//! `{static_dir}/{assets_dir}`, with the static segment omitted when the
//! layout has no distinct static root. Duplicate, leading and trailing
//! separators are collapsed in every direction, so
//! `relative_to_asset_root(resolve_asset_path(f))` is always `"/" + f`.

use quire_config::SiteLayout;

use crate::error::SyncError;

/// Join path parts, collapsing empty segments.
///
/// `.` and `..` segments are rejected so a resolved path can never escape
/// its root.
fn normalize(parts: &[&str]) -> Result<String, SyncError> {
    let mut segments = Vec::new();
    for part in parts {
        for segment in part.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(SyncError::validation(format!(
                    "relative segment '{segment}' in '{part}'"
                )));
            }
            segments.push(segment);
        }
    }
    Ok(segments.join("/"))
}

/// Reject empty names and names containing a separator.
pub(crate) fn validate_name(name: &str) -> Result<(), SyncError> {
    if name.trim().is_empty() {
        return Err(SyncError::validation("name cannot be empty"));
    }
    if name.contains('/') {
        return Err(SyncError::validation(format!(
            "name '{name}' cannot contain '/'"
        )));
    }
    if name == "." || name == ".." {
        return Err(SyncError::validation(format!("invalid name '{name}'")));
    }
    Ok(())
}

/// Repository path of the content root.
///
/// # Errors
///
/// Returns [`SyncError::Validation`] if `content_dir` is malformed.
pub fn content_root(layout: &SiteLayout) -> Result<String, SyncError> {
    normalize(&[&layout.content_dir])
}

/// Repository path of the asset root.
///
/// # Errors
///
/// Returns [`SyncError::Validation`] if `assets_dir` is empty or a
/// directory setting is malformed.
pub fn asset_root(layout: &SiteLayout) -> Result<String, SyncError> {
    let static_dir = layout.static_dir.as_deref().unwrap_or_default();
    let assets = normalize(&[&layout.assets_dir])?;
    if assets.is_empty() {
        return Err(SyncError::validation("assets_dir cannot be empty"));
    }
    normalize(&[static_dir, &assets])
}

/// Resolve a file name in a content-root-relative directory.
///
/// # Errors
///
/// Returns [`SyncError::Validation`] for an empty or multi-segment
/// `filename`, or a malformed directory.
pub fn resolve_content_path(
    layout: &SiteLayout,
    relative_dir: &str,
    filename: &str,
) -> Result<String, SyncError> {
    validate_name(filename)?;
    normalize(&[&layout.content_dir, relative_dir, filename])
}

/// Resolve an asset file name to its repository path.
///
/// # Errors
///
/// Returns [`SyncError::Validation`] for an empty or multi-segment
/// `filename`, or a malformed layout.
pub fn resolve_asset_path(layout: &SiteLayout, filename: &str) -> Result<String, SyncError> {
    validate_name(filename)?;
    let root = asset_root(layout)?;
    normalize(&[&root, filename])
}

/// Link text for an asset: its path below the asset root, with a leading `/`.
///
/// # Errors
///
/// Returns [`SyncError::Validation`] if the path is not below the asset root.
pub fn relative_to_asset_root(layout: &SiteLayout, path: &str) -> Result<String, SyncError> {
    let root = asset_root(layout)?;
    let path = normalize(&[path])?;
    path.strip_prefix(root.as_str())
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .map(|rest| format!("/{rest}"))
        .ok_or_else(|| SyncError::validation(format!("'{path}' is not below '{root}'")))
}

/// Content-root-relative form of a repository path, or `None` outside it.
#[must_use]
pub fn relative_to_content_root(layout: &SiteLayout, path: &str) -> Option<String> {
    let root = content_root(layout).ok()?;
    let path = normalize(&[path]).ok()?;
    if root.is_empty() {
        return Some(path);
    }
    if path == root {
        return Some(String::new());
    }
    path.strip_prefix(root.as_str())?
        .strip_prefix('/')
        .map(str::to_owned)
}
