use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// A shared weapon build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModEntry {
    pub id: String,
    pub weapon_name: String,
    pub code: String,
    pub nickname: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub playstyle: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: String,
    #[serde(default)]
    pub recommends: u64,
}

/// Catalogue row; only name and category matter to mod filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Weapon {
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponCategory {
    pub id: &'static str,
    pub label: &'static str,
}

pub const ALL_CATEGORIES: &str = "all";
pub const ALL_WEAPONS: &str = "all";

pub static WEAPON_CATEGORIES: [WeaponCategory; 6] = [
    WeaponCategory { id: "assault", label: "돌격소총" },
    WeaponCategory { id: "smg", label: "기관단총" },
    WeaponCategory { id: "dmr", label: "지정사수소총" },
    WeaponCategory { id: "sniper", label: "저격소총" },
    WeaponCategory { id: "shotgun", label: "샷건" },
    WeaponCategory { id: "lmg", label: "경기관총" },
];

pub const MAPS: [&str; 6] = [
    "Operation Blackout",
    "Desert Storm",
    "Urban Assault",
    "Night Raid",
    "Coastal Strike",
    "Mountain Pass",
];

pub const DISTANCES: [&str; 3] = ["근거리", "중거리", "장거리"];

pub fn find_category(id: &str) -> Option<&'static WeaponCategory> {
    WEAPON_CATEGORIES.iter().find(|c| c.id == id)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateModRequest {
    #[validate(length(max = 100))]
    pub weapon_name: String,
    #[validate(length(max = 200))]
    pub code: String,
    #[validate(length(max = 100))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    pub playstyle: Option<String>,
    #[serde(default)]
    pub maps: Vec<String>,
    #[serde(default)]
    pub distances: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModQuery {
    pub category: Option<String>,
    pub weapon: Option<String>,
}
