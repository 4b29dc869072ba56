//! Session-scoped UI state
//!
//! Everything loaded for a signed-in owner lives here and is dropped as a
//! whole when the identity goes away or changes.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Guest, Owner, Property, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Public,
    Admin,
}

/// Properties, settings and guests loaded for the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub owner_id: Uuid,
    pub properties: Vec<Property>,
    pub active_property_id: Option<Uuid>,
    /// Stored settings of the active property
    pub settings: Option<Settings>,
    pub guests: Vec<Guest>,
    /// Unsaved edit-mode copy of `settings`
    pub draft: Option<Settings>,
}

impl DashboardState {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            properties: Vec::new(),
            active_property_id: None,
            settings: None,
            guests: Vec::new(),
            draft: None,
        }
    }

    pub fn active_property(&self) -> Option<&Property> {
        let id = self.active_property_id?;
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    /// Forget everything tied to the active property
    pub fn clear_active(&mut self) {
        self.active_property_id = None;
        self.settings = None;
        self.guests.clear();
        self.draft = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub view: View,
    owner: Option<Owner>,
    dashboard: Option<DashboardState>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    /// Follow an identity change. Returns true when session state was cleared.
    pub fn apply_identity(&mut self, identity: Option<&Owner>) -> bool {
        let same = match (&self.owner, identity) {
            (Some(current), Some(next)) => current.id == next.id,
            (None, None) => true,
            _ => false,
        };
        if same {
            return false;
        }

        self.owner = identity.cloned();
        self.dashboard = None;
        self.view = View::Public;
        true
    }

    /// Switch to the admin view, creating empty dashboard state if needed
    pub fn open_admin(&mut self) -> Result<&mut DashboardState> {
        let owner_id = self
            .owner
            .as_ref()
            .map(|o| o.id)
            .ok_or_else(|| Error::NotFound("signed-in owner".into()))?;

        self.view = View::Admin;
        Ok(self
            .dashboard
            .get_or_insert_with(|| DashboardState::new(owner_id)))
    }

    pub fn dashboard(&self) -> Option<&DashboardState> {
        self.dashboard.as_ref()
    }

    pub fn show_public(&mut self) {
        self.view = View::Public;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Owner {
        Owner {
            id: Uuid::new_v4(),
            email: "r@x.com".into(),
        }
    }

    #[test]
    fn test_admin_requires_owner() {
        let mut ctx = SessionContext::new();
        assert!(matches!(ctx.open_admin(), Err(Error::NotFound(_))));
        assert_eq!(ctx.view, View::Public);
    }

    #[test]
    fn test_sign_out_clears_everything() {
        let me = owner();
        let mut ctx = SessionContext::new();
        assert!(ctx.apply_identity(Some(&me)));

        let state = ctx.open_admin().unwrap();
        state.properties.push(Property::new(me.id, "1 A St"));
        state.guests.push(Guest::new("A", "B", "a@b.co", "5551234567"));
        assert_eq!(ctx.view, View::Admin);

        // same identity again is not a change
        assert!(!ctx.apply_identity(Some(&me)));
        assert!(ctx.dashboard().is_some());

        assert!(ctx.apply_identity(None));
        assert_eq!(ctx.view, View::Public);
        assert!(ctx.dashboard().is_none());
        assert!(ctx.owner().is_none());
    }

    #[test]
    fn test_owner_switch_drops_previous_state() {
        let mut ctx = SessionContext::new();
        ctx.apply_identity(Some(&owner()));
        ctx.open_admin().unwrap().guests.push(Guest::new("A", "B", "a@b.co", "5551234567"));

        let other = owner();
        assert!(ctx.apply_identity(Some(&other)));
        let state = ctx.open_admin().unwrap();
        assert_eq!(state.owner_id, other.id);
        assert!(state.guests.is_empty());
    }
}
