use crate::storage::{session_path, session_store};
use anyhow::{Result, anyhow, bail};
use clap::Subcommand;
use rpassword::prompt_password;
use shared::{
    api::ChatApiClient,
    auth::{self, LOGIN_SUCCESS_NOTICE, SIGNUP_SUCCESS_NOTICE},
    config::ClientConfig,
    models::RegisterRequest,
    session::{SessionValidity, validate_session},
};
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Sign in and store the session token
    Login {
        /// Username or email; prompted for when omitted
        #[arg(long, short)]
        identifier: Option<String>,
    },
    /// Create a new account
    Signup {
        #[arg(long, short)]
        username: Option<String>,
        #[arg(long, short)]
        email: Option<String>,
    },
    /// Check the stored session against the backend
    Status,
    /// Forget the stored session
    Logout,
}

pub async fn run(command: SessionCommand, config: &ClientConfig) -> Result<()> {
    let client = ChatApiClient::new(&config.api_base_url);
    match command {
        SessionCommand::Login { identifier } => login(&client, identifier).await,
        SessionCommand::Signup { username, email } => signup(&client, username, email).await,
        SessionCommand::Status => status(&client).await,
        SessionCommand::Logout => {
            auth::sign_out(&session_store());
            println!("Logged out; removed {}", session_path().display());
            Ok(())
        }
    }
}

async fn login(client: &ChatApiClient, identifier: Option<String>) -> Result<()> {
    let identifier = match identifier {
        Some(value) => value,
        None => prompt("Username or email: ")?,
    };
    let password = prompt_password("Password: ")?;

    let session = auth::sign_in(&session_store(), client, &identifier, &password)
        .await
        .map_err(|err| anyhow!("{} ({err})", err.login_notice()))?;
    println!("{LOGIN_SUCCESS_NOTICE} Signed in as {}.", session.username);
    Ok(())
}

async fn signup(
    client: &ChatApiClient,
    username: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let username = match username {
        Some(value) => value,
        None => prompt("Username: ")?,
    };
    let email = match email {
        Some(value) => value,
        None => prompt("Email: ")?,
    };
    let password = prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("password must not be empty");
    }

    let request = RegisterRequest {
        username,
        email,
        password,
    };
    auth::sign_up(client, &request)
        .await
        .map_err(|err| anyhow!(err.signup_notice()))?;
    println!("{SIGNUP_SUCCESS_NOTICE}");
    Ok(())
}

async fn status(client: &ChatApiClient) -> Result<()> {
    let store = session_store();
    let Some(session) = store.load() else {
        println!("Not logged in.");
        return Ok(());
    };

    match validate_session(&store, client).await {
        SessionValidity::Valid => println!("Logged in as {}.", session.username),
        SessionValidity::Invalid | SessionValidity::Pending => {
            println!("Session expired; run `ayna session login` to sign in again.");
        }
    }
    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}
