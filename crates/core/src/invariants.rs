//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use uuid::Uuid;

use crate::context::DashboardState;
use crate::models::Property;

/// Validate that a property's state is internally consistent
pub fn assert_property_invariants(property: &Property) {
    debug_assert!(
        property.owner_id != Uuid::nil(),
        "Property {} has nil owner_id",
        property.id
    );

    // Name must not be empty
    debug_assert!(
        !property.name.trim().is_empty(),
        "Property {} has empty name",
        property.id
    );
}

/// Validate that loaded dashboard state matches its selection
pub fn assert_dashboard_invariants(state: &DashboardState) {
    match state.active_property_id {
        Some(active) => {
            debug_assert!(
                state.properties.iter().any(|p| p.id == active),
                "Active property {} is not in the property list",
                active
            );
            debug_assert!(
                state.settings.is_some(),
                "Active property {} has no settings loaded",
                active
            );
        }
        None => {
            debug_assert!(
                state.settings.is_none() && state.guests.is_empty() && state.draft.is_none(),
                "Owner {} has property data loaded without a selection",
                state.owner_id
            );
        }
    }

    for property in &state.properties {
        debug_assert!(
            property.owner_id == state.owner_id,
            "Property {} belongs to {} but is loaded for {}",
            property.id,
            property.owner_id,
            state.owner_id
        );
    }
}

/// Validate that an owner ID is not nil
pub fn assert_owner_id_valid(owner_id: Uuid, context: &str) {
    debug_assert!(
        owner_id != Uuid::nil(),
        "Nil owner_id in context: {}",
        context
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;

    #[test]
    fn test_valid_property() {
        assert_property_invariants(&Property::new(Uuid::new_v4(), "1 Main St"));
    }

    #[test]
    fn test_valid_dashboard() {
        let owner = Uuid::new_v4();
        let mut state = DashboardState::new(owner);
        assert_dashboard_invariants(&state);

        let property = Property::new(owner, "1 Main St");
        state.active_property_id = Some(property.id);
        state.properties.push(property);
        state.settings = Some(Settings::default());
        assert_dashboard_invariants(&state);
    }

    #[test]
    #[should_panic(expected = "not in the property list")]
    fn test_dangling_selection() {
        let mut state = DashboardState::new(Uuid::new_v4());
        state.active_property_id = Some(Uuid::new_v4());
        state.settings = Some(Settings::default());
        assert_dashboard_invariants(&state);
    }

    #[test]
    #[should_panic(expected = "Nil owner_id")]
    fn test_nil_owner() {
        assert_owner_id_valid(Uuid::nil(), "test");
    }
}
