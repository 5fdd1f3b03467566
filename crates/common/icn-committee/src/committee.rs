use crate::error::{CommitteeError, CommitteeResult};
use crate::storage::KeyValueStore;
use std::collections::HashSet;
use tracing::info;

/// Key holding the persisted member sequence
pub const MEMBERS_KEY: &str = "members";

/// The set of identities authorized to vote, persisted in insertion order.
pub struct Committee<S> {
    store: S,
    members: Vec<String>,
}

impl<S: KeyValueStore> Committee<S> {
    /// Create the committee with its founding members. Fails if one already exists.
    pub fn initialize(store: S, initial_members: Vec<String>) -> CommitteeResult<Self> {
        if store.get(MEMBERS_KEY)?.is_some() {
            return Err(CommitteeError::State("committee is already initialized".to_string()));
        }
        validate_members(&initial_members)?;

        let committee = Self {
            store,
            members: initial_members,
        };
        committee.persist()?;
        info!(members = committee.members.len(), "committee created");
        Ok(committee)
    }

    /// Load the persisted committee
    pub fn load(store: S) -> CommitteeResult<Self> {
        let members: Vec<String> = store
            .get_json(MEMBERS_KEY)?
            .ok_or(CommitteeError::NotInitialized)?;
        Ok(Self { store, members })
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_member(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }

    pub fn add_member(&mut self, id: &str) -> CommitteeResult<()> {
        if id.trim().is_empty() {
            return Err(CommitteeError::Validation("member id must not be empty".to_string()));
        }
        if self.is_member(id) {
            return Err(CommitteeError::Conflict(format!("{} is already a committee member", id)));
        }
        self.members.push(id.to_string());
        self.persist()?;
        info!(member = %id, "committee member added");
        Ok(())
    }

    pub fn remove_member(&mut self, id: &str) -> CommitteeResult<()> {
        let position = self
            .members
            .iter()
            .position(|m| m == id)
            .ok_or_else(|| CommitteeError::NotFound(format!("committee member {}", id)))?;
        if self.members.len() == 1 {
            return Err(CommitteeError::State(
                "cannot remove the last committee member".to_string(),
            ));
        }
        self.members.remove(position);
        self.persist()?;
        info!(member = %id, "committee member removed");
        Ok(())
    }

    fn persist(&self) -> CommitteeResult<()> {
        self.store.set_json(MEMBERS_KEY, &self.members)?;
        Ok(())
    }
}

fn validate_members(members: &[String]) -> CommitteeResult<()> {
    if members.is_empty() {
        return Err(CommitteeError::Validation(
            "initial_members must not be empty".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for member in members {
        if member.trim().is_empty() {
            return Err(CommitteeError::Validation("member id must not be empty".to_string()));
        }
        if !seen.insert(member.as_str()) {
            return Err(CommitteeError::Validation(format!("duplicate member {}", member)));
        }
    }
    Ok(())
}
