//! Login, registration and logout.

use std::io::Write;

use clap::Args;
use pocketshop_core::RegisterRequest;
use pocketshop_storefront::AppState;

use super::CommandError;
use crate::render;

/// Fields for a new account.
#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(short, long)]
    pub email: String,

    #[arg(short, long, env = "POCKETSHOP_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    /// Default shipping address
    #[arg(short, long)]
    pub address: String,
}

impl From<RegisterArgs> for RegisterRequest {
    fn from(args: RegisterArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            password: args.password,
            phone: args.phone,
            address: args.address,
        }
    }
}

pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let user = state.profile().login(email, password).await?;
    writeln!(out, "Logged in as {}.", user.display_name())?;
    Ok(())
}

pub async fn register(
    state: &AppState,
    args: RegisterArgs,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let user = state.profile().register(args.into()).await?;
    writeln!(out, "Welcome, {}. You are logged in.", user.first_name)?;
    Ok(())
}

pub async fn logout(state: &AppState, out: &mut impl Write) -> Result<(), CommandError> {
    state.logout().await?;
    writeln!(out, "Logged out.")?;
    Ok(())
}

pub fn whoami(state: &AppState, out: &mut impl Write) -> Result<(), CommandError> {
    match state.profile().current_user() {
        Some(user) => render::user(out, &user)?,
        None => writeln!(out, "Not logged in.")?,
    }
    Ok(())
}
