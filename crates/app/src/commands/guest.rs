//! Guest list management for the selected property

use chrono::Local;
use clap::Args;
use openhouse_core::{Guest, GuestForm};

use super::{confirm, find_guest, short_id, with_dashboard, Session};
use crate::error::Result;
use crate::state::AppState;

/// Guest fields as command-line options
#[derive(Debug, Clone, Default, Args)]
pub struct GuestFields {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// "yes" or "no"
    #[arg(long)]
    pub do_not_call: Option<String>,
    /// "yes" or "no"
    #[arg(long)]
    pub agency_agreement: Option<String>,
    #[arg(long)]
    pub broker_name: Option<String>,
    #[arg(long)]
    pub company_name: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl GuestFields {
    /// Overlay the given options onto `form`
    pub fn apply(self, form: &mut GuestForm) {
        let GuestFields {
            first_name,
            last_name,
            email,
            phone,
            do_not_call,
            agency_agreement,
            broker_name,
            company_name,
            notes,
        } = self;

        let slots = [
            (first_name, &mut form.first_name),
            (last_name, &mut form.last_name),
            (email, &mut form.email),
            (phone, &mut form.phone),
            (do_not_call, &mut form.do_not_call),
            (agency_agreement, &mut form.has_agency_agreement),
            (broker_name, &mut form.broker_name),
            (company_name, &mut form.company_name),
            (notes, &mut form.notes),
        ];
        for (value, slot) in slots {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

fn print_guest(guest: &Guest) {
    let answer = |v: Option<openhouse_core::YesNo>| v.map(|v| v.as_str()).unwrap_or("N/A");
    println!(
        "{}  {:<24} {:<28} {:<14} DNC:{:<3} Agent:{:<3} {}",
        short_id(guest.id),
        guest.name,
        guest.email,
        guest.phone,
        answer(guest.do_not_call),
        answer(guest.has_agency_agreement),
        guest
            .timestamp
            .with_timezone(&Local)
            .format("%-m/%-d/%Y %-I:%M %p")
    );
}

pub fn list(state: &AppState, session: &mut Session) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let guests = &dashboard.state().guests;
        if guests.is_empty() {
            println!("No guests registered yet.");
        }
        for guest in guests {
            print_guest(guest);
        }
        Ok(())
    })
}

pub fn add(state: &AppState, session: &mut Session, fields: GuestFields) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let mut form = GuestForm::default();
        fields.apply(&mut form);
        let guest = dashboard.add_guest(&form)?;
        println!("Added {}.", guest.name);
        Ok(())
    })
}

pub fn edit(state: &AppState, session: &mut Session, query: &str, fields: GuestFields) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let guests = &dashboard.state().guests;
        let guest_id = find_guest(guests, query)?;
        let mut form = guests
            .iter()
            .find(|g| g.id == guest_id)
            .map(GuestForm::from_guest)
            .unwrap_or_default();

        fields.apply(&mut form);
        let guest = dashboard.update_guest(guest_id, &form)?;
        println!("Updated {}.", guest.name);
        Ok(())
    })
}

pub fn delete(state: &AppState, session: &mut Session, query: &str, yes: bool) -> Result<()> {
    with_dashboard(state, session, |dashboard| {
        let guests = &dashboard.state().guests;
        let guest_id = find_guest(guests, query)?;
        let name = guests
            .iter()
            .find(|g| g.id == guest_id)
            .map(|g| g.name.clone())
            .unwrap_or_default();

        if !yes && !confirm(&format!("Delete guest {}?", name))? {
            println!("Nothing deleted.");
            return Ok(());
        }
        dashboard.delete_guest(guest_id)?;
        println!("Deleted {}.", name);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::sign_up;
    use crate::commands::property;
    use crate::error::AppError;
    use crate::state::test_state;
    use openhouse_core::{Error, GuestRepository, PropertyRepository, YesNo};

    fn fields(first: &str, email: &str) -> GuestFields {
        GuestFields {
            first_name: Some(first.into()),
            last_name: Some("Doe".into()),
            email: Some(email.into()),
            phone: Some("(555) 123-4567".into()),
            ..GuestFields::default()
        }
    }

    #[test]
    fn test_add_edit_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let mut session = Session::restore(&state).unwrap();
        sign_up(&state, &mut session, "pat@realty.com", Some("secret1".into())).unwrap();
        let owner_id = session.owner().unwrap().id;
        property::create(&state, &mut session, "12 Oak St").unwrap();
        let property_id = state.db().unwrap().list_properties(owner_id).unwrap()[0].id;

        add(&state, &mut session, fields("Jo", "jo@x.com")).unwrap();
        let err = add(&state, &mut session, fields("Jo", "JO@x.com")).unwrap_err();
        assert!(matches!(err, AppError::Core(Error::DuplicateEmail(_))));

        let edit_fields = GuestFields {
            do_not_call: Some("yes".into()),
            notes: Some("Loved the kitchen".into()),
            ..GuestFields::default()
        };
        edit(&state, &mut session, "jo@x.com", edit_fields).unwrap();

        let guests = state.db().unwrap().get_guests(owner_id, property_id).unwrap();
        assert_eq!(guests.len(), 1);
        assert_eq!(guests[0].first_name, "Jo");
        assert_eq!(guests[0].do_not_call, Some(YesNo::Yes));
        assert_eq!(guests[0].notes, "Loved the kitchen");

        delete(&state, &mut session, "jo@x.com", true).unwrap();
        assert!(state
            .db()
            .unwrap()
            .get_guests(owner_id, property_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_fields_overlay_keeps_unset() {
        let mut form = GuestForm {
            first_name: "Jo".into(),
            email: "jo@x.com".into(),
            ..GuestForm::default()
        };
        GuestFields {
            email: Some("new@x.com".into()),
            ..GuestFields::default()
        }
        .apply(&mut form);
        assert_eq!(form.first_name, "Jo");
        assert_eq!(form.email, "new@x.com");
    }
}
