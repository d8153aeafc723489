use serde::Deserialize;

use crate::render::recipe::{Recipe, RecipeParams, Template};

/// On-disk (JSON) description of a recipe preset.
#[derive(Debug, Deserialize)]
pub struct RecipeManifest {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub template: Template,
    #[serde(default)]
    pub params: RecipeParams,
}

impl RecipeManifest {
    pub fn into_recipe(self) -> Recipe {
        let display_name = if self.display_name.is_empty() {
            self.name.clone()
        } else {
            self.display_name
        };
        Recipe {
            id: self.name,
            display_name,
            description: self.description,
            template: self.template,
            params: self.params,
        }
    }
}
