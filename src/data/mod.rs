//! Built-in Catalog
//!
//! The champion catalog (stats and ability numbers) is authored in RON and
//! embedded at compile time; the behavior behind each catalog name lives in
//! the hook registrations of the submodules. Matches reference all of this
//! content by name from their config.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::Deserialize;

use crate::sim::constants::DEFAULT_CAST_SECONDS;
use crate::sim::hooks::{EffectVariables, HookRegistry};
use crate::sim::unit::BaseStats;

pub mod augments;
pub mod champions;
pub mod items;
pub mod traits;

/// One champion as authored in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ChampionDef {
    pub name: String,
    pub stats: BaseStats,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub ability: Option<AbilityDef>,
}

/// Ability numbers, per star level.
#[derive(Debug, Clone, Deserialize)]
pub struct AbilityDef {
    pub name: String,
    #[serde(default = "default_cast_seconds")]
    pub cast_seconds: f32,
    /// Star-indexed values; star levels beyond the list reuse the last entry.
    #[serde(default)]
    pub variables: HashMap<String, Vec<f32>>,
}

fn default_cast_seconds() -> f32 {
    DEFAULT_CAST_SECONDS
}

impl AbilityDef {
    /// Resolve the variable table for one star level.
    pub fn variables_for_star(&self, star_level: u8) -> EffectVariables {
        let index = star_level.max(1) as usize - 1;
        let values = self
            .variables
            .iter()
            .map(|(key, per_star)| {
                let value = if per_star.is_empty() {
                    0.0
                } else {
                    per_star[index.min(per_star.len() - 1)]
                };
                (key.clone(), value)
            })
            .collect();
        EffectVariables::new(self.name.clone(), values)
    }
}

/// All authored champions, loaded from the embedded RON catalog.
#[derive(Resource, Debug, Default, Deserialize)]
pub struct ChampionCatalog {
    champions: Vec<ChampionDef>,
}

impl ChampionCatalog {
    pub fn load_embedded() -> Result<Self, String> {
        ron::from_str(include_str!("champions.ron"))
            .map_err(|err| format!("champion catalog: {err}"))
    }

    pub fn get(&self, name: &str) -> Option<&ChampionDef> {
        self.champions.iter().find(|champion| champion.name == name)
    }

    pub fn ability_of(&self, name: &str) -> Option<&AbilityDef> {
        self.get(name)?.ability.as_ref()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.champions.iter().map(|champion| champion.name.as_str())
    }
}

/// Loads the catalog and registers the built-in hook tables.
pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        let catalog = ChampionCatalog::load_embedded()
            .expect("embedded champion catalog is well-formed");
        app.insert_resource(catalog)
            .add_systems(PreStartup, register_builtin_hooks);
    }
}

fn register_builtin_hooks(mut registry: ResMut<HookRegistry>) {
    champions::register(&mut registry);
    traits::register(&mut registry);
    items::register(&mut registry);
    augments::register(&mut registry);
}
