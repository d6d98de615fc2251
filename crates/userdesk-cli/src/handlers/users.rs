//! Users command handlers

use crate::cli::{UsersAction, UsersArgs, UsersCreateArgs, UsersListArgs};
use crate::config::is_yaml;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use userdesk_core::notify::{handle_api_error, Severity, ToastOptions};
use userdesk_core::{CreateUserParams, RequestConfig, User, UserState, UsersService};

use super::AppContext;

/// Tags created records with where they came from
const REQUEST_SOURCE_HEADER: &str = "X-Request-Source";

/// What `users list` prints in machine formats
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserListing<'a> {
    fetched_at: DateTime<Utc>,
    count: usize,
    users: &'a [User],
}

/// Handle the users command
pub async fn handle_users(args: UsersArgs, ctx: &AppContext, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        UsersAction::List(list_args) => handle_users_list(list_args, ctx, output).await,
        UsersAction::Create(create_args) => handle_users_create(create_args, ctx, output).await,
    }
}

async fn handle_users_list(
    _args: UsersListArgs,
    ctx: &AppContext,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::new("users_list");
    let service = UsersService::new(ctx.adapter.clone());

    let mut state = UserState::default();
    let loading = ctx
        .notifier
        .notify(Severity::Loading, "Loading users", ToastOptions::sticky());
    let watcher = abort_on_ctrl_c(service.clone());

    let outcome = state.fetch(&service, &ctx.notifier).await;

    watcher.abort();
    ctx.notifier.dismiss(loading);
    outcome.map_err(Error::reported)?;

    if output.is_human() {
        output.section(&format!("Users ({})", state.users.len()))?;
        output.users_table(&state.users)?;
        if state.users.is_empty() {
            output.info("No users found")?;
        }
        Ok(())
    } else {
        output.data(&UserListing {
            fetched_at: Utc::now(),
            count: state.users.len(),
            users: &state.users,
        })
    }
}

async fn handle_users_create(
    args: UsersCreateArgs,
    ctx: &AppContext,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::new("users_create");
    let users = read_users(&args.file)?;
    output.info(&format!("Creating {} user(s) from {}", users.len(), args.file.display()))?;

    let service = UsersService::new(ctx.adapter.clone());
    let request_config = args
        .request_source
        .map(|source| RequestConfig::new().header(REQUEST_SOURCE_HEADER, source));

    let watcher = abort_on_ctrl_c(service.clone());
    let outcome = service
        .create_user(CreateUserParams {
            request_body: users,
            request_config,
        })
        .await;
    watcher.abort();

    let response = outcome.map_err(|error| {
        handle_api_error(&error, &ctx.notifier);
        Error::reported(error)
    })?;

    if output.is_human() {
        output.success(&format!(
            "✓ Created {} user(s) [{} {}]",
            response.body.len(),
            response.status,
            response.status_text
        ))?;
        output.users_table(&response.body)
    } else {
        output.data(&response)
    }
}

/// Read a JSON or YAML array of users
fn read_users(path: &Path) -> Result<Vec<User>> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;

    let users = if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| {
            tracing::debug!(error = %e, "Users file is not valid YAML");
            Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "a YAML array of users".to_string(),
            }
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| {
            tracing::debug!(error = %e, "Users file is not valid JSON");
            Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "a JSON array of users".to_string(),
            }
        })?
    };

    Ok(users)
}

/// Abort the latest request when the user presses Ctrl-C
fn abort_on_ctrl_c(service: UsersService) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, aborting request");
            service.abort_request();
        }
    })
}
