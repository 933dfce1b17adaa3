//! Login command.

#![allow(clippy::print_stdout)]

use secrecy::ExposeSecret;

use super::{CliError, Shop};

/// Print the token obtained by `--username`/`--password`.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` if no credentials were given.
pub fn login(shop: &Shop) -> Result<(), CliError> {
    let session = shop.session.get().ok_or(CliError::NotSignedIn)?;
    let name = session
        .user
        .as_ref()
        .map_or("(unknown user)", |u| u.username.as_str());

    println!("Signed in as {name}.");
    println!("export FURNISTORE_TOKEN={}", session.token.expose_secret());
    Ok(())
}
