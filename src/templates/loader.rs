use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::manifest::RecipeManifest;

/// Default location for user preset manifests: a `recipes` directory next to
/// the executable, else `<config dir>/audiogram/recipes`.
pub fn find_recipes_dir() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));

    if let Some(ref dir) = exe_dir {
        let recipes_dir = dir.join("recipes");
        if recipes_dir.is_dir() {
            return Some(recipes_dir);
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("audiogram").join("recipes"))
        .filter(|dir| dir.is_dir())
}

/// `*.json` files in `dir`, sorted by file name.
pub fn list_manifests(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read recipes dir: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn load_manifest(path: &Path) -> Result<RecipeManifest> {
    let manifest_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    parse_manifest(&manifest_str)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

pub fn parse_manifest(json: &str) -> Result<RecipeManifest> {
    Ok(serde_json::from_str(json)?)
}

/// Parse `key=value` pairs; entries without `=` are dropped.
pub fn parse_param_overrides(params: &[String]) -> HashMap<String, String> {
    params
        .iter()
        .filter_map(|s| {
            let mut parts = s.splitn(2, '=');
            let key = parts.next()?.trim().to_string();
            let val = parts.next()?.trim().to_string();
            Some((key, val))
        })
        .collect()
}
