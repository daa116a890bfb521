use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use std::{collections::BTreeSet, sync::Arc};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::{
        gunsmith::{
            find_category, CreateModRequest, ModEntry, ModQuery, Weapon, ALL_CATEGORIES,
            ALL_WEAPONS, DISTANCES, MAPS,
        },
        profile::ActorIdentity,
    },
    services::{
        identity::IdentityResolver,
        votes::{cast_vote, SessionLedger, VoteResult},
    },
    utils::{
        listing::rank_desc_by,
        validation::{require_selection, require_text},
    },
};

const BEST_MODS: usize = 3;

/// Weapon mod sharing. Votes and submissions last for the session only.
#[derive(Clone)]
pub struct ModService {
    mods: Arc<RwLock<Vec<ModEntry>>>,
    weapons: Arc<Vec<Weapon>>,
    ledger: Arc<SessionLedger<String>>,
    resolver: IdentityResolver,
}

impl ModService {
    pub fn new(seed_mods: Vec<ModEntry>, weapons: Vec<Weapon>, resolver: IdentityResolver) -> Self {
        Self {
            mods: Arc::new(RwLock::new(seed_mods)),
            weapons: Arc::new(weapons),
            ledger: Arc::new(SessionLedger::new()),
            resolver,
        }
    }

    /// Weapon names of a category id, or every weapon for `all`.
    pub fn weapons_in_category(&self, category: &str) -> Result<Vec<String>> {
        let names: BTreeSet<String> = if category == ALL_CATEGORIES {
            self.weapons.iter().map(|w| w.name.clone()).collect()
        } else {
            let category = find_category(category)
                .ok_or_else(|| AppError::bad_request("Unknown weapon category"))?;
            self.weapons
                .iter()
                .filter(|w| w.category == category.label)
                .map(|w| w.name.clone())
                .collect()
        };

        Ok(names.into_iter().collect())
    }

    /// Filtered by category, then by weapon, ordered by live vote count.
    pub fn list_mods(&self, query: &ModQuery) -> Result<Vec<ModEntry>> {
        let category = query.category.as_deref().unwrap_or(ALL_CATEGORIES);
        let weapon = query.weapon.as_deref().unwrap_or(ALL_WEAPONS);

        let mut mods = self.mods.read().clone();

        if category != ALL_CATEGORIES {
            let in_category = self.weapons_in_category(category)?;
            mods.retain(|m| in_category.contains(&m.weapon_name));
        }

        if weapon != ALL_WEAPONS {
            mods.retain(|m| m.weapon_name == weapon);
        }

        rank_desc_by(&mut mods, |m| m.recommends);
        debug!("Mod listing returned {} entries", mods.len());
        Ok(mods)
    }

    pub fn best_mods(&self, query: &ModQuery) -> Result<Vec<ModEntry>> {
        let mut mods = self.list_mods(query)?;
        mods.truncate(BEST_MODS);
        Ok(mods)
    }

    pub fn recommend_mod(&self, id: &str, actor: Option<&ActorIdentity>) -> Result<VoteResult> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required to recommend"))?;
        let mut recommends = self
            .mods
            .read()
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.recommends)
            .ok_or_else(|| AppError::not_found("Mod"))?;

        let outcome = cast_vote(self.ledger.as_ref(), Some(actor), id, || {
            let mut mods = self.mods.write();
            let entry = mods
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| AppError::not_found("Mod"))?;
            entry.recommends += 1;
            recommends = entry.recommends;
            Ok(())
        })?;

        Ok(VoteResult {
            outcome,
            recommends,
        })
    }

    pub async fn submit_mod(
        &self,
        request: CreateModRequest,
        actor: Option<&ActorIdentity>,
    ) -> Result<ModEntry> {
        let actor = actor.ok_or_else(|| AppError::unauthorized("Login required"))?;

        request.validate()?;
        let weapon_name = require_text("Weapon", &request.weapon_name, 100)?;
        let code = require_text("Code", &request.code, 200)?;
        let title = require_text("Title", &request.title, 100)?;
        let description = require_text("Description", &request.description, 5000)?;

        if !self.weapons.iter().any(|w| w.name == weapon_name) {
            return Err(AppError::validation("Unknown weapon"));
        }
        require_selection("map", &request.maps, &MAPS)?;
        require_selection("distance", &request.distances, &DISTANCES)?;

        let nickname = self.resolver.resolve(actor).await;
        let now = Utc::now();

        let entry = ModEntry {
            id: format!("mod_{}_{}", now.timestamp_millis(), Uuid::new_v4().simple()),
            weapon_name,
            code,
            nickname,
            title,
            description,
            playstyle: request
                .playstyle
                .map(|p| p.trim().to_string())
                .unwrap_or_default(),
            tags: request.maps.into_iter().chain(request.distances).collect(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            recommends: 0,
        };

        self.mods.write().push(entry.clone());
        info!("Mod {} submitted by {}", entry.id, actor.id);
        Ok(entry)
    }
}
