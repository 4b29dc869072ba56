//! Command handlers
//!
//! Each handler works against the shared [`AppState`] and the restored
//! [`Session`], and prints its result for the operator.

pub mod auth;
pub mod guest;
pub mod property;
pub mod public;
pub mod settings;

use std::io::{self, BufRead, Write};

use openhouse_core::{
    Dashboard, Database, Guest, LocalIdentityProvider, Owner, Property, SessionContext,
    SessionGate,
};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Identity restored from the session file plus the per-session UI state
pub struct Session {
    pub gate: SessionGate<LocalIdentityProvider>,
    pub context: SessionContext,
    identity: watch::Receiver<Option<Owner>>,
}

impl Session {
    /// Resume the session saved by the last sign-in, dropping it if expired
    pub fn restore(state: &AppState) -> Result<Self> {
        let provider = LocalIdentityProvider::new(state.db.clone());
        let identity = match state.load_session() {
            Some(session_id) => {
                let owner = provider.restore_session(session_id)?;
                if owner.is_none() {
                    tracing::info!("Stored session expired");
                    state.clear_session()?;
                }
                owner
            }
            None => None,
        };

        let gate = SessionGate::with_identity(provider, identity);
        let identity = gate.subscribe();
        let mut context = SessionContext::new();
        context.apply_identity(identity.borrow().as_ref());
        Ok(Self {
            gate,
            context,
            identity,
        })
    }

    /// Follow the gate's identity and persist (or forget) the session id
    pub fn sync(&mut self, state: &AppState) -> Result<()> {
        if !self.identity.has_changed().unwrap_or(false) {
            return Ok(());
        }
        let identity = self.identity.borrow_and_update().clone();
        self.context.apply_identity(identity.as_ref());
        match self.gate.provider().current_session() {
            Some(session_id) if identity.is_some() => state.save_session(session_id),
            _ => state.clear_session(),
        }
    }

    pub fn owner(&self) -> Result<&Owner> {
        self.context.owner().ok_or(AppError::NotSignedIn)
    }
}

/// Run `f` on a freshly loaded dashboard for the signed-in owner
pub fn with_dashboard<T>(
    state: &AppState,
    session: &mut Session,
    f: impl FnOnce(&mut Dashboard<'_, Database>) -> Result<T>,
) -> Result<T> {
    session.owner()?;
    let db = state.db()?;
    let dashboard_state = session.context.open_admin()?;
    let mut dashboard = Dashboard::new(&*db, dashboard_state);

    let outcome = dashboard.load()?;
    if outcome.migrated {
        println!("Moved your existing open house into your property list.");
    }
    f(&mut dashboard)
}

/// Match a property by full id, id prefix or exact name
pub fn find_property(properties: &[Property], query: &str) -> Result<Uuid> {
    let query = query.trim();
    if let Some(property) = properties.iter().find(|p| p.name == query) {
        return Ok(property.id);
    }
    unique_match(
        properties.iter().map(|p| p.id),
        query,
        &format!("property '{}'", query),
    )
}

/// Match a guest by full id, id prefix or email
pub fn find_guest(guests: &[Guest], query: &str) -> Result<Uuid> {
    let query = query.trim();
    if let Some(guest) = guests.iter().find(|g| g.has_email(query)) {
        return Ok(guest.id);
    }
    unique_match(
        guests.iter().map(|g| g.id),
        query,
        &format!("guest '{}'", query),
    )
}

fn unique_match(ids: impl Iterator<Item = Uuid>, prefix: &str, what: &str) -> Result<Uuid> {
    let prefix = prefix.to_ascii_lowercase();
    let matches: Vec<Uuid> = if prefix.is_empty() {
        Vec::new()
    } else {
        ids.filter(|id| id.to_string().starts_with(&prefix)).collect()
    };

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(openhouse_core::Error::NotFound(what.to_string()).into()),
        _ => Err(AppError::InvalidArgument(format!(
            "{} matches more than one entry; use more of the id",
            what
        ))),
    }
}

/// Ask a yes/no question on the terminal
pub fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Read a line from the terminal after a prompt
pub fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// First eight characters of an id, as shown in listings
pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    #[test]
    fn test_find_property() {
        let owner = Uuid::new_v4();
        let a = Property::new(owner, "12 Oak St");
        let b = Property::new(owner, "9 Elm Ave");
        let properties = vec![a.clone(), b.clone()];

        assert_eq!(find_property(&properties, "9 Elm Ave").unwrap(), b.id);
        assert_eq!(find_property(&properties, &a.id.to_string()).unwrap(), a.id);
        assert_eq!(
            find_property(&properties, &a.id.to_string()[..8]).unwrap(),
            a.id
        );
        assert!(find_property(&properties, "1 Nowhere Ln").is_err());
        assert!(find_property(&properties, "").is_err());
    }

    #[test]
    fn test_find_guest_by_email() {
        let guest = Guest::new("Jo", "Doe", "jo@x.com", "5551234567");
        let guests = vec![guest.clone()];
        assert_eq!(find_guest(&guests, "JO@x.com").unwrap(), guest.id);
        assert!(matches!(
            find_guest(&guests, "zz"),
            Err(AppError::Core(openhouse_core::Error::NotFound(_)))
        ));
    }

    #[test]
    fn test_restore_without_session_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let session = Session::restore(&state).unwrap();
        assert!(matches!(session.owner(), Err(AppError::NotSignedIn)));
    }

    #[test]
    fn test_restore_drops_unknown_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        state.save_session(Uuid::new_v4()).unwrap();

        let session = Session::restore(&state).unwrap();
        assert!(session.owner().is_err());
        assert_eq!(state.load_session(), None);
    }

    #[test]
    fn test_with_dashboard_requires_owner() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let mut session = Session::restore(&state).unwrap();
        let result = with_dashboard(&state, &mut session, |_| Ok(()));
        assert!(matches!(result, Err(AppError::NotSignedIn)));
    }
}
