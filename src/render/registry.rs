use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

use super::recipe::Recipe;
use crate::templates::{embedded, loader};

pub const DEFAULT_RECIPE: &str = "radial-bars";

/// Recipes addressable by name or by integer index (registration order).
#[derive(Clone, Debug, Default)]
pub struct RecipeRegistry {
    recipes: Vec<Recipe>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the compiled-in presets.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, json) in embedded::embedded_manifests() {
            match loader::parse_manifest(json) {
                Ok(manifest) => registry.register(manifest.into_recipe()),
                Err(err) => log::error!("Built-in recipe '{}' is invalid: {:#}", name, err),
            }
        }
        registry
    }

    /// Add `recipe`, replacing an existing one with the same id in place.
    pub fn register(&mut self, recipe: Recipe) {
        match self.recipes.iter_mut().find(|r| r.id == recipe.id) {
            Some(existing) => *existing = recipe,
            None => self.recipes.push(recipe),
        }
    }

    /// Load every `*.json` manifest in `dir`. Unparseable files are skipped
    /// with a warning; returns how many were registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut loaded = 0;
        for path in loader::list_manifests(dir)? {
            match loader::load_manifest(&path) {
                Ok(manifest) => {
                    log::info!("Loaded recipe '{}' from {}", manifest.name, path.display());
                    self.register(manifest.into_recipe());
                    loaded += 1;
                }
                Err(err) => log::warn!("Skipping recipe manifest: {:#}", err),
            }
        }
        Ok(loaded)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    /// Look up by exact name, then by integer index.
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        let id = id.trim();
        self.recipes.iter().find(|r| r.id == id).or_else(|| {
            id.parse::<usize>()
                .ok()
                .and_then(|index| self.recipes.get(index))
        })
    }

    /// Resolve `id`, falling back to the default recipe when it is unknown.
    /// Returns `None` only for an empty registry.
    pub fn resolve(&self, id: &str) -> Option<Recipe> {
        if let Some(recipe) = self.get(id) {
            return Some(recipe.clone());
        }
        let fallback = self.get(DEFAULT_RECIPE).or_else(|| self.recipes.first())?;
        log::warn!(
            "Unknown recipe '{}', falling back to '{}'",
            id,
            fallback.id
        );
        Some(fallback.clone())
    }

    /// Resolve `id` and apply `key=value` knob overrides.
    pub fn resolve_with(&self, id: &str, overrides: &HashMap<String, String>) -> Option<Recipe> {
        let mut recipe = self.resolve(id)?;
        recipe.params.apply_overrides(overrides);
        Some(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recipe::{Capability, RecipeParams, RecipeRenderer, Template};

    #[test]
    fn builtin_has_default_and_both_capabilities() {
        let registry = RecipeRegistry::builtin();
        assert_eq!(registry.len(), 8);
        assert!(registry.get(DEFAULT_RECIPE).is_some());
        assert!(registry.iter().any(|r| r.capability() == Capability::Stateless));
        assert!(registry.iter().any(|r| r.capability() == Capability::Stateful));
    }

    #[test]
    fn resolves_by_name_and_index() {
        let registry = RecipeRegistry::builtin();
        assert_eq!(registry.get("waterfall").unwrap().template, Template::Waterfall);
        assert_eq!(registry.get("0").unwrap().id, "radial-bars");
        assert_eq!(registry.get("2").unwrap().id, "mirror-bars");
        assert!(registry.get("99").is_none());
    }

    #[test]
    fn unknown_id_falls_back_to_default() {
        let registry = RecipeRegistry::builtin();
        let recipe = registry.resolve("does-not-exist").unwrap();
        assert_eq!(recipe.id, DEFAULT_RECIPE);
        assert_eq!(registry.resolve("1234").unwrap().id, DEFAULT_RECIPE);
    }

    #[test]
    fn fallback_without_default_uses_first() {
        let mut registry = RecipeRegistry::new();
        assert!(registry.resolve("x").is_none());
        registry.register(Recipe::new("only", Template::MirrorBars, RecipeParams::default()));
        assert_eq!(registry.resolve("x").unwrap().id, "only");
    }

    #[test]
    fn register_replaces_same_id() {
        let mut registry = RecipeRegistry::builtin();
        let before = registry.len();
        registry.register(Recipe::new("waterfall", Template::MirrorBars, RecipeParams::default()));
        assert_eq!(registry.len(), before);
        assert_eq!(registry.get("waterfall").unwrap().template, Template::MirrorBars);
    }

    #[test]
    fn load_dir_skips_broken_manifests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.json"),
            r#"{ "name": "custom", "template": "waterfall", "params": { "decay": 0.5 } }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let mut registry = RecipeRegistry::builtin();
        assert_eq!(registry.load_dir(dir.path()).unwrap(), 1);
        assert_eq!(registry.get("custom").unwrap().params.decay, 0.5);
    }

    #[test]
    fn overrides_apply_to_resolved_copy() {
        let registry = RecipeRegistry::builtin();
        let overrides = HashMap::from([("jitter".to_string(), "0.75".to_string())]);
        let recipe = registry.resolve_with("mirror-bars", &overrides).unwrap();
        assert_eq!(recipe.params.jitter, 0.75);
        assert_eq!(registry.get("mirror-bars").unwrap().params.jitter, 0.0);
    }
}
