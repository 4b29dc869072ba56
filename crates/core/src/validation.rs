//! Guest form validation
//!
//! The public form reports every problem at once. The admin form stops at
//! the first problem, in a fixed order.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Field, Result, ValidationErrors};
use crate::models::{Guest, YesNo};

pub const MIN_PHONE_DIGITS: usize = 10;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

/// `local@domain.tld` with no whitespace
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn phone_digit_count(phone: &str) -> usize {
    phone.chars().filter(|c| c.is_ascii_digit()).count()
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone_digit_count(phone) >= MIN_PHONE_DIGITS
}

/// Reject `email` if another guest already uses it, ignoring case.
///
/// `exclude` skips the guest being edited.
pub fn ensure_unique_email(guests: &[Guest], email: &str, exclude: Option<Uuid>) -> Result<()> {
    let taken = guests
        .iter()
        .filter(|g| Some(g.id) != exclude)
        .any(|g| g.has_email(email));

    if taken {
        Err(Error::DuplicateEmail(email.trim().to_string()))
    } else {
        Ok(())
    }
}

/// Broker details collected when the visitor has an agency agreement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrokerInfo {
    pub broker_name: String,
    pub company_name: String,
}

/// Raw public registration form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Submission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub do_not_call: String,
    pub has_agency_agreement: String,
    pub broker: BrokerInfo,
}

/// Submission whose answers have been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answers {
    pub do_not_call: YesNo,
    pub has_agency_agreement: YesNo,
}

impl Submission {
    /// Check every field, collecting all messages
    pub fn validate(&self) -> Result<Answers> {
        let mut errors = ValidationErrors::new();

        if self.first_name.trim().is_empty() {
            errors.add(Field::FirstName, "First name is required");
        }
        if self.last_name.trim().is_empty() {
            errors.add(Field::LastName, "Last name is required");
        }

        if self.email.trim().is_empty() {
            errors.add(Field::Email, "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.add(Field::Email, "Please enter a valid email");
        }

        if self.phone.trim().is_empty() {
            errors.add(Field::Phone, "Phone is required");
        } else if !is_valid_phone(&self.phone) {
            errors.add(Field::Phone, "Please enter a valid phone (10+ digits)");
        }

        let do_not_call = YesNo::parse(&self.do_not_call);
        if do_not_call.is_none() {
            errors.add(Field::DoNotCall, "Please select an option");
        }

        let has_agency_agreement = YesNo::parse(&self.has_agency_agreement);
        match has_agency_agreement {
            None => errors.add(Field::HasAgencyAgreement, "Please select an option"),
            Some(YesNo::Yes) => {
                if self.broker.broker_name.trim().is_empty() {
                    errors.add(
                        Field::BrokerName,
                        "Please fill in both broker name and company name",
                    );
                }
                if self.broker.company_name.trim().is_empty() {
                    errors.add(
                        Field::CompanyName,
                        "Please fill in both broker name and company name",
                    );
                }
            }
            Some(YesNo::No) => {}
        }

        match (do_not_call, has_agency_agreement) {
            (Some(do_not_call), Some(has_agency_agreement)) if errors.is_empty() => Ok(Answers {
                do_not_call,
                has_agency_agreement,
            }),
            _ => Err(Error::Validation(errors)),
        }
    }

    /// Build the guest record; broker details are kept only with an agreement
    pub fn to_guest(&self, answers: Answers) -> Guest {
        let mut guest = Guest::new(&self.first_name, &self.last_name, &self.email, &self.phone);
        guest.do_not_call = Some(answers.do_not_call);
        guest.has_agency_agreement = Some(answers.has_agency_agreement);
        if answers.has_agency_agreement == YesNo::Yes {
            guest.broker_name = self.broker.broker_name.trim().to_string();
            guest.company_name = self.broker.company_name.trim().to_string();
        }
        guest
    }
}

/// Dashboard add/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuestForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub do_not_call: String,
    pub has_agency_agreement: String,
    pub broker_name: String,
    pub company_name: String,
    pub notes: String,
}

impl GuestForm {
    /// Prefill from a stored guest, splitting legacy single-field names
    pub fn from_guest(guest: &Guest) -> Self {
        Self {
            first_name: guest.display_first_name(),
            last_name: guest.display_last_name(),
            email: guest.email.clone(),
            phone: guest.phone.clone(),
            do_not_call: guest
                .do_not_call
                .map(|v| v.as_str().to_string())
                .unwrap_or_default(),
            has_agency_agreement: guest
                .has_agency_agreement
                .map(|v| v.as_str().to_string())
                .unwrap_or_default(),
            broker_name: guest.broker_name.clone(),
            company_name: guest.company_name.clone(),
            notes: guest.notes.clone(),
        }
    }

    /// Required fields, then email format, then phone digits. Stops at the first failure.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (Field::FirstName, &self.first_name),
            (Field::LastName, &self.last_name),
            (Field::Email, &self.email),
            (Field::Phone, &self.phone),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::Validation(ValidationErrors::single(
                *field,
                "Please fill in all required fields",
            )));
        }

        if !is_valid_email(&self.email) {
            return Err(Error::Validation(ValidationErrors::single(
                Field::Email,
                "Please enter a valid email",
            )));
        }

        if !is_valid_phone(&self.phone) {
            return Err(Error::Validation(ValidationErrors::single(
                Field::Phone,
                "Please enter a valid phone number",
            )));
        }

        Ok(())
    }

    /// New guest stamped with the current time
    pub fn to_new_guest(&self) -> Guest {
        let mut guest = Guest::new(&self.first_name, &self.last_name, &self.email, &self.phone);
        self.apply_answers(&mut guest);
        guest
    }

    /// Overwrite the editable fields, keeping id and registration time
    pub fn apply_to(&self, guest: &mut Guest) {
        let edited = Guest::new(&self.first_name, &self.last_name, &self.email, &self.phone);
        guest.first_name = edited.first_name;
        guest.last_name = edited.last_name;
        guest.name = edited.name;
        guest.email = edited.email;
        guest.phone = edited.phone;
        self.apply_answers(guest);
    }

    fn apply_answers(&self, guest: &mut Guest) {
        guest.do_not_call = YesNo::parse(&self.do_not_call);
        guest.has_agency_agreement = YesNo::parse(&self.has_agency_agreement);
        guest.broker_name = self.broker_name.trim().to_string();
        guest.company_name = self.company_name.trim().to_string();
        guest.notes = self.notes.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submission() -> Submission {
        Submission {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            phone: "(555) 123-4567".into(),
            do_not_call: "No".into(),
            has_agency_agreement: "No".into(),
            broker: BrokerInfo::default(),
        }
    }

    fn validation_errors(result: Result<Answers>) -> ValidationErrors {
        match result {
            Err(Error::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email(" jane.doe@mail.example.com "));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_phone_digits() {
        assert!(is_valid_phone("(555) 123-4567"));
        assert!(is_valid_phone("+1 555 123 4567"));
        assert!(!is_valid_phone("555-1234"));
        assert_eq!(phone_digit_count("a1b2c3"), 3);
    }

    #[test]
    fn test_valid_submission() {
        let answers = valid_submission().validate().unwrap();
        assert_eq!(answers.do_not_call, YesNo::No);

        let guest = valid_submission().to_guest(answers);
        assert_eq!(guest.name, "Jane Doe");
        assert_eq!(guest.has_agency_agreement, Some(YesNo::No));
        assert!(guest.broker_name.is_empty());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let submission = Submission {
            email: "nope".into(),
            phone: "123".into(),
            ..Submission::default()
        };
        let errors = validation_errors(submission.validate());

        assert_eq!(errors.get(Field::FirstName), Some("First name is required"));
        assert_eq!(errors.get(Field::LastName), Some("Last name is required"));
        assert_eq!(errors.get(Field::Email), Some("Please enter a valid email"));
        assert_eq!(
            errors.get(Field::Phone),
            Some("Please enter a valid phone (10+ digits)")
        );
        assert!(errors.contains(Field::DoNotCall));
        assert!(errors.contains(Field::HasAgencyAgreement));
    }

    #[test]
    fn test_agency_agreement_requires_broker() {
        let mut submission = valid_submission();
        submission.has_agency_agreement = "Yes".into();
        submission.broker.broker_name = "Bea Broker".into();

        let errors = validation_errors(submission.validate());
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(Field::CompanyName));

        submission.broker.company_name = "Acme Realty".into();
        let answers = submission.validate().unwrap();
        let guest = submission.to_guest(answers);
        assert_eq!(guest.company_name, "Acme Realty");
    }

    #[test]
    fn test_broker_dropped_without_agreement() {
        let mut submission = valid_submission();
        submission.broker.broker_name = "Leftover".into();
        let guest = submission.to_guest(submission.validate().unwrap());
        assert!(guest.broker_name.is_empty());
    }

    #[test]
    fn test_guest_form_fails_fast_in_order() {
        let mut form = GuestForm {
            first_name: "Al".into(),
            last_name: "".into(),
            email: "bad".into(),
            phone: "1".into(),
            ..GuestForm::default()
        };
        match form.validate() {
            Err(Error::Validation(e)) => {
                assert_eq!(e.get(Field::LastName), Some("Please fill in all required fields"));
                assert_eq!(e.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }

        form.last_name = "Lee".into();
        match form.validate() {
            Err(Error::Validation(e)) => assert!(e.contains(Field::Email)),
            other => panic!("unexpected {other:?}"),
        }

        form.email = "al@lee.com".into();
        match form.validate() {
            Err(Error::Validation(e)) => {
                assert_eq!(e.get(Field::Phone), Some("Please enter a valid phone number"))
            }
            other => panic!("unexpected {other:?}"),
        }

        form.phone = "555 123 4567".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_guest_form_edit_keeps_identity() {
        let mut guest = Guest::new("Old", "Name", "old@x.com", "5551234567");
        let original = guest.clone();

        let mut form = GuestForm::from_guest(&guest);
        form.first_name = "New".into();
        form.notes = "Called back".into();
        form.do_not_call = "Yes".into();
        form.apply_to(&mut guest);

        assert_eq!(guest.id, original.id);
        assert_eq!(guest.timestamp, original.timestamp);
        assert_eq!(guest.name, "New Name");
        assert_eq!(guest.notes, "Called back");
        assert_eq!(guest.do_not_call, Some(YesNo::Yes));
        assert_eq!(guest.has_agency_agreement, None);
    }

    #[test]
    fn test_unique_email_excludes_edited_guest() {
        let a = Guest::new("A", "A", "A@x.com", "5551234567");
        let b = Guest::new("B", "B", "b@x.com", "5551234567");
        let guests = vec![a.clone(), b.clone()];

        assert!(matches!(
            ensure_unique_email(&guests, "a@X.com", None),
            Err(Error::DuplicateEmail(_))
        ));
        assert!(ensure_unique_email(&guests, "a@x.com", Some(a.id)).is_ok());
        assert!(ensure_unique_email(&guests, "b@x.com", Some(a.id)).is_err());
        assert!(ensure_unique_email(&guests, "c@x.com", None).is_ok());
    }
}
