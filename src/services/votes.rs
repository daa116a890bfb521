//! At-most-one vote per item per voted-set.
//!
//! Post votes are remembered durably under `recommended_{postId}`; mod votes
//! live only as long as the process.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::debug;

use crate::{
    error::{AppError, Result},
    models::profile::ActorIdentity,
    services::storage::{keys, CollectionStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteOutcome {
    Accepted,
    AlreadyVoted,
}

/// Outcome plus the counter value after the vote path ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub outcome: VoteOutcome,
    pub recommends: u64,
}

pub trait VoteLedger: Send + Sync {
    type Id: ?Sized;

    fn contains(&self, id: &Self::Id) -> bool;

    fn insert(&self, id: &Self::Id) -> Result<()>;
}

/// Voted post ids, one stored set per post.
#[derive(Clone)]
pub struct DurablePostLedger {
    store: CollectionStore,
}

impl DurablePostLedger {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }
}

impl VoteLedger for DurablePostLedger {
    type Id = u64;

    fn contains(&self, id: &u64) -> bool {
        self.store
            .load::<u64>(&keys::recommended(*id))
            .contains(id)
    }

    fn insert(&self, id: &u64) -> Result<()> {
        let key = keys::recommended(*id);
        let mut voted = self.store.load::<u64>(&key);
        if !voted.contains(id) {
            voted.push(*id);
            self.store.save(&key, &voted)?;
        }
        Ok(())
    }
}

/// In-process voted set.
#[derive(Debug)]
pub struct SessionLedger<T> {
    voted: Mutex<HashSet<T>>,
}

impl<T> Default for SessionLedger<T> {
    fn default() -> Self {
        Self {
            voted: Mutex::new(HashSet::new()),
        }
    }
}

impl<T> SessionLedger<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }
}

impl VoteLedger for SessionLedger<String> {
    type Id = str;

    fn contains(&self, id: &str) -> bool {
        self.voted.lock().contains(id)
    }

    fn insert(&self, id: &str) -> Result<()> {
        self.voted.lock().insert(id.to_string());
        Ok(())
    }
}

/// Runs the vote path: reject anonymous actors, skip items already in the
/// ledger, otherwise apply `increment` and then record the id.
///
/// `increment` persists the counter change; when it fails nothing is recorded.
pub fn cast_vote<L, F>(
    ledger: &L,
    actor: Option<&ActorIdentity>,
    id: &L::Id,
    increment: F,
) -> Result<VoteOutcome>
where
    L: VoteLedger,
    L::Id: std::fmt::Debug,
    F: FnOnce() -> Result<()>,
{
    if actor.is_none() {
        return Err(AppError::unauthorized("Login required to recommend"));
    }

    if ledger.contains(id) {
        debug!("Vote for {:?} already recorded", id);
        return Ok(VoteOutcome::AlreadyVoted);
    }

    increment()?;
    ledger.insert(id)?;
    Ok(VoteOutcome::Accepted)
}
