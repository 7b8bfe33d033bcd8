//! Command handlers wired to the session core.
//!
//! `App` owns one controller, the guard that protects feed/profile, and the
//! navigator that turns gateway invalidations into a trip to the login view.
//! Handlers return `Ok(false)` for user-facing failures that were already
//! reported, and `Err` only for things the user cannot fix by logging in.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{error, warn};

use social_core::api::{session_channel, CredentialStatus};
use social_core::{
    ApiClient, ApiError, AuthController, Config, CredentialStore, GuardDecision, Navigator, Route,
    RouteGuard,
};

use crate::views;

/// Read instead of prompting when set (scripts, CI)
const ENV_PASSWORD: &str = "SOCIAL_PASSWORD";

pub struct App {
    config: Config,
    controller: AuthController,
    guard: RouteGuard,
    navigator: Navigator,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let credentials = CredentialStore::new(config.open_storage()?);
        let (events_tx, events_rx) = session_channel();
        let api =
            ApiClient::with_timeout(&config.api_base_url, credentials, config.request_timeout())
                .context("Failed to create API client")?
                .with_events(events_tx);

        let controller = AuthController::new(api);
        let guard = RouteGuard::new(controller.clone());
        let navigator = Navigator::new(controller.clone(), events_rx, Route::Home);

        Ok(Self {
            config,
            controller,
            guard,
            navigator,
        })
    }

    pub fn shutdown(&self) {
        self.controller.teardown();
    }

    fn api(&self) -> &ApiClient {
        self.controller.api()
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Enter a protected view. Prints the login notice and returns false
    /// if the guard sends us away.
    async fn enter(&mut self, route: Route) -> bool {
        self.navigator.navigate(route);
        match self.guard.resolve().await {
            GuardDecision::Render => true,
            GuardDecision::Waiting => {
                println!("Still checking your session, try again in a moment.");
                false
            }
            GuardDecision::RedirectToLogin => {
                self.navigator.process_pending_events();
                if self.navigator.current().is_protected() {
                    self.navigator.navigate(Route::Login { expired: false });
                }
                views::login_prompt(self.navigator.current(), self.config.last_email.as_deref());
                false
            }
        }
    }

    /// Report a failed feature call. Session errors end at the login view.
    fn report(&mut self, err: ApiError) -> Result<bool> {
        if let Some(route) = self.navigator.process_pending_events() {
            views::login_prompt(route, self.config.last_email.as_deref());
            return Ok(false);
        }
        match err {
            ApiError::Storage(e) => Err(e),
            err if err.is_session_error() => {
                views::login_prompt(
                    Route::Login { expired: true },
                    self.config.last_email.as_deref(),
                );
                Ok(false)
            }
            err => {
                error!(error = %err, "Request failed");
                eprintln!("Error: {}", err.user_message());
                Ok(false)
            }
        }
    }

    // =========================================================================
    // Public views
    // =========================================================================

    pub async fn login(&mut self, email: Option<&str>) -> Result<bool> {
        let email = match email {
            Some(email) => email.to_string(),
            None => match self.config.last_email.clone() {
                Some(last) => prompt_with_default("Email", &last)?,
                None => prompt("Email")?,
            },
        };
        let password = match std::env::var(ENV_PASSWORD) {
            Ok(password) => password,
            Err(_) => rpassword::prompt_password("Password: ")?,
        };

        println!("Authenticating...");
        match self.controller.login(&email, &password).await {
            Ok(user) => {
                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.navigator.navigate(Route::Home);
                println!("Logged in as {}.", user.username);
                Ok(true)
            }
            Err(ApiError::Storage(e)) => Err(e),
            Err(_) => {
                let session = self.controller.snapshot();
                eprintln!(
                    "Login failed: {}",
                    session.error_message.as_deref().unwrap_or("unknown error")
                );
                self.controller.clear_error();
                Ok(false)
            }
        }
    }

    pub fn logout(&mut self) -> Result<bool> {
        self.controller.logout()?;
        self.navigator.navigate(Route::Login { expired: false });
        println!("Logged out.");
        Ok(true)
    }

    pub async fn status(&mut self) -> Result<bool> {
        match self.api().credential_status()? {
            CredentialStatus::Missing => {
                println!("Not logged in.");
                Ok(false)
            }
            CredentialStatus::Expired => {
                println!("Session expired.");
                Ok(false)
            }
            CredentialStatus::Fresh { remaining } => {
                if !self.enter(Route::Home).await {
                    return Ok(false);
                }
                views::status(&self.controller.snapshot(), remaining);
                Ok(true)
            }
        }
    }

    pub async fn register(&mut self, username: &str, email: &str) -> Result<bool> {
        self.navigator.navigate(Route::Register);
        let password = match std::env::var(ENV_PASSWORD) {
            Ok(password) => password,
            Err(_) => {
                let password = rpassword::prompt_password("Password: ")?;
                let confirm = rpassword::prompt_password("Confirm password: ")?;
                if password != confirm {
                    eprintln!("Passwords do not match.");
                    return Ok(false);
                }
                password
            }
        };

        match self.api().register(username, email, &password).await {
            Ok(user) => {
                println!(
                    "Account created for {}. Log in with: social login {}",
                    user.username, user.email
                );
                Ok(true)
            }
            Err(ApiError::Storage(e)) => Err(e),
            Err(e) => {
                eprintln!("Registration failed: {}", e.user_message());
                Ok(false)
            }
        }
    }

    // =========================================================================
    // Protected views
    // =========================================================================

    pub async fn feed(&mut self) -> Result<bool> {
        if !self.enter(Route::Home).await {
            return Ok(false);
        }
        match self.api().fetch_posts().await {
            Ok(posts) => {
                views::feed(&posts);
                Ok(true)
            }
            Err(e) => self.report(e),
        }
    }

    pub async fn post(&mut self, content: &str) -> Result<bool> {
        if !self.enter(Route::Home).await {
            return Ok(false);
        }
        match self.api().create_post(content).await {
            Ok(post) => {
                println!("Posted #{}.", post.id);
                Ok(true)
            }
            Err(e) => self.report(e),
        }
    }

    pub async fn profile(&mut self) -> Result<bool> {
        if !self.enter(Route::Profile).await {
            return Ok(false);
        }
        match self.api().fetch_profile().await {
            Ok(user) => {
                views::profile(&user);
                Ok(true)
            }
            Err(e) => self.report(e),
        }
    }

    pub async fn bio(&mut self, bio: &str) -> Result<bool> {
        if !self.enter(Route::Profile).await {
            return Ok(false);
        }
        match self.api().update_profile(bio).await {
            Ok(user) => {
                views::profile(&user);
                Ok(true)
            }
            Err(e) => self.report(e),
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_with_default(label: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]", label, default))?;
    Ok(if input.is_empty() { default.to_string() } else { input })
}
