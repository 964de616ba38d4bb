//! Session commands.

use tracing::info;

use mercadito_client::Storefront;
use mercadito_core::{CityId, LoginRequest, RegisterRequest};

/// Sign in and persist the session.
///
/// # Errors
///
/// Returns an error if the login request fails.
pub async fn login(
    storefront: &Storefront,
    email: String,
    password: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = storefront
        .auth()
        .login(&LoginRequest { email, password })
        .await?;
    info!("signed in as {} ({:?})", user.name, user.role);
    Ok(())
}

/// Create an account and open a session.
///
/// # Errors
///
/// Returns an error if the registration request fails.
pub async fn register(
    storefront: &Storefront,
    email: String,
    password: String,
    name: String,
    city: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = storefront
        .auth()
        .register(&RegisterRequest {
            email,
            password,
            name,
            city: CityId::new(city),
            role: None,
        })
        .await?;
    info!("registered {} ({})", user.name, user.email);
    Ok(())
}

/// Drop the local session.
pub fn logout(storefront: &Storefront) {
    storefront.auth().logout();
    info!("signed out");
}

/// Show the signed-in user.
pub fn whoami(storefront: &Storefront) {
    match storefront.auth().current_user() {
        Some(user) => info!("{} <{}> ({:?})", user.name, user.email, user.role),
        None => info!("not signed in"),
    }
}
