//! Sign-up, sign-in and sign-out

use tracing::instrument;

use super::{prompt, Session};
use crate::error::Result;
use crate::state::AppState;

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => prompt("Password"),
    }
}

#[instrument(skip(state, session, password))]
pub fn sign_up(
    state: &AppState,
    session: &mut Session,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    let owner = session.gate.provider().sign_up(email, &password)?;
    let owner = session.gate.signed_up(owner);
    session.sync(state)?;
    println!("Account created. Signed in as {}.", owner.email);
    Ok(())
}

pub async fn sign_in(
    state: &AppState,
    session: &mut Session,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    let owner = session.gate.sign_in_with_password(email, &password).await?;
    session.sync(state)?;
    println!("Signed in as {}.", owner.email);
    Ok(())
}

pub async fn sign_in_with_provider(
    state: &AppState,
    session: &mut Session,
    provider: &str,
) -> Result<()> {
    match session.gate.sign_in_with_provider(provider).await? {
        Some(owner) => {
            session.sync(state)?;
            println!("Signed in as {}.", owner.email);
        }
        None => println!("Sign-in was not completed."),
    }
    Ok(())
}

pub async fn sign_out(state: &AppState, session: &mut Session) -> Result<()> {
    session.gate.sign_out().await?;
    session.sync(state)?;
    println!("Signed out.");
    Ok(())
}

pub async fn reset_password(session: &Session, email: &str) -> Result<()> {
    session.gate.request_password_reset(email).await?;
    println!("If an account exists for {}, a reset link is on its way.", email.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::state::test_state;
    use openhouse_core::{AuthError, Error};

    #[tokio::test]
    async fn test_sign_up_persists_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let mut session = Session::restore(&state).unwrap();

        sign_up(&state, &mut session, "pat@realty.com", Some("secret1".into())).unwrap();
        assert!(state.load_session().is_some());
        assert_eq!(
            session.gate.current().map(|o| o.email),
            Some("pat@realty.com".to_string())
        );

        let restored = Session::restore(&state).unwrap();
        assert_eq!(restored.owner().unwrap().email, "pat@realty.com");
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let mut session = Session::restore(&state).unwrap();
        sign_up(&state, &mut session, "pat@realty.com", Some("secret1".into())).unwrap();
        sign_out(&state, &mut session).await.unwrap();
        assert_eq!(state.load_session(), None);
        assert!(session.owner().is_err());

        let err = sign_in(&state, &mut session, "pat@realty.com", Some("wrong!".into()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Core(Error::Auth(AuthError::InvalidCredentials))
        ));

        sign_in(&state, &mut session, "pat@realty.com", Some("secret1".into()))
            .await
            .unwrap();
        assert!(state.load_session().is_some());
        assert_eq!(session.owner().unwrap().email, "pat@realty.com");
    }
}
