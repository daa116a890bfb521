use serde::de::DeserializeOwned;
use std::{fs, path::Path};
use tracing::info;

use crate::{
    error::Result,
    models::{
        gunsmith::{ModEntry, Weapon},
        post::Post,
    },
};

const POSTS_JSON: &str = include_str!("../../seed/posts.json");
const MODS_JSON: &str = include_str!("../../seed/mods.json");
const WEAPONS_JSON: &str = include_str!("../../seed/weapons.json");

/// Read-only content shipped with the app.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub posts: Vec<Post>,
    pub mods: Vec<ModEntry>,
    pub weapons: Vec<Weapon>,
}

impl SeedData {
    pub fn bundled() -> Result<Self> {
        Ok(Self {
            posts: serde_json::from_str(POSTS_JSON)?,
            mods: serde_json::from_str(MODS_JSON)?,
            weapons: serde_json::from_str(WEAPONS_JSON)?,
        })
    }

    /// Files present in `dir` replace the bundled copy of that file.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            posts: load_or_bundled(dir, "posts.json", POSTS_JSON)?,
            mods: load_or_bundled(dir, "mods.json", MODS_JSON)?,
            weapons: load_or_bundled(dir, "weapons.json", WEAPONS_JSON)?,
        })
    }

    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::bundled(),
        }
    }
}

fn load_or_bundled<T: DeserializeOwned>(dir: &Path, file: &str, bundled: &str) -> Result<Vec<T>> {
    let path = dir.join(file);
    if path.exists() {
        info!("Loading seed override {}", path.display());
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    } else {
        Ok(serde_json::from_str(bundled)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bundled_seed_parses() {
        let seed = SeedData::bundled().unwrap();
        assert!(!seed.posts.is_empty());
        assert!(!seed.mods.is_empty());
        assert!(!seed.weapons.is_empty());

        let ids: HashSet<u64> = seed.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), seed.posts.len());
        assert!(seed.posts.iter().all(|p| p.id <= 100));
    }

    #[test]
    fn every_seed_mod_names_a_catalogued_weapon() {
        let seed = SeedData::bundled().unwrap();
        for entry in &seed.mods {
            assert!(
                seed.weapons.iter().any(|w| w.name == entry.weapon_name),
                "unknown weapon {}",
                entry.weapon_name
            );
        }
    }

    #[test]
    fn directory_override_replaces_only_present_files() {
        let dir = std::env::temp_dir().join(format!("squad-hub-seed-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("posts.json"), "[]").unwrap();

        let seed = SeedData::from_dir(&dir).unwrap();
        assert!(seed.posts.is_empty());
        assert!(!seed.weapons.is_empty());

        fs::remove_dir_all(dir).ok();
    }
}
