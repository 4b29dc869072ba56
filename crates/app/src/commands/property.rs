//! Property list management

use super::{confirm, find_property, short_id, with_dashboard, Session};
use crate::error::Result;
use crate::state::AppState;

pub fn list(state: &AppState, session: &mut Session) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let dashboard_state = dashboard.state();
        if dashboard_state.properties.is_empty() {
            println!("No properties yet. Create one with `openhouse property create <address>`.");
            return Ok(());
        }

        for property in &dashboard_state.properties {
            let marker = if dashboard_state.active_property_id == Some(property.id) {
                "*"
            } else {
                " "
            };
            println!(
                "{} {}  {}  (created {})",
                marker,
                short_id(property.id),
                property.name,
                property.created_at.format("%Y-%m-%d")
            );
        }
        Ok(())
    })
}

pub fn create(state: &AppState, session: &mut Session, name: &str) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let property = dashboard.create_property(name)?;
        println!("Created and selected '{}' ({}).", property.name, short_id(property.id));
        Ok(())
    })
}

pub fn select(state: &AppState, session: &mut Session, query: &str) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let property_id = find_property(&dashboard.state().properties, query)?;
        dashboard.select(property_id)?;
        if let Some(property) = dashboard.state().active_property() {
            println!("Selected '{}'.", property.name);
        }
        Ok(())
    })
}

pub fn delete(state: &AppState, session: &mut Session, query: &str, yes: bool) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let property_id = find_property(&dashboard.state().properties, query)?;
        let name = dashboard
            .state()
            .properties
            .iter()
            .find(|p| p.id == property_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();

        if !yes
            && !confirm(&format!(
                "Delete '{}' with its settings and all of its guests?",
                name
            ))?
        {
            println!("Nothing deleted.");
            return Ok(());
        }

        let report = dashboard.delete_property(property_id)?;
        println!("Deleted '{}' ({} steps).", name, report.completed());
        if let Some(active) = dashboard.state().active_property() {
            println!("Now showing '{}'.", active.name);
        }
        Ok(())
    })
}

pub fn dedupe(state: &AppState, session: &mut Session) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let report = dashboard.remove_duplicates()?;
        match report.removed {
            0 => println!("No duplicate properties found."),
            1 => println!("Removed 1 duplicate property."),
            n => println!("Removed {} duplicate properties.", n),
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::sign_up;
    use crate::state::test_state;
    use openhouse_core::PropertyRepository;

    #[test]
    fn test_create_select_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let mut session = Session::restore(&state).unwrap();
        sign_up(&state, &mut session, "pat@realty.com", Some("secret1".into())).unwrap();
        let owner_id = session.owner().unwrap().id;

        create(&state, &mut session, "12 Oak St").unwrap();
        create(&state, &mut session, "9 Elm Ave").unwrap();
        select(&state, &mut session, "12 Oak St").unwrap();

        let active = state.db().unwrap().active_property(owner_id).unwrap();
        let oak = state.db().unwrap().list_properties(owner_id).unwrap()[0].clone();
        assert_eq!(active, Some(oak.id));

        delete(&state, &mut session, "12 Oak St", true).unwrap();
        let remaining = state.db().unwrap().list_properties(owner_id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "9 Elm Ave");

        // last property stays
        assert!(delete(&state, &mut session, "9 Elm Ave", true).is_err());
    }
}
