//! Session command handlers

use crate::cli::{LoginArgs, SessionAction, SessionArgs};
use crate::error::Result;
use crate::logging::redaction;
use crate::output::OutputWriter;
use serde::Serialize;
use userdesk_core::{get_storage_item, remove_storage_items, set_storage_item, KeyValueStore};

use super::AppContext;

/// Stored session as shown by `session show`
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    logged_in: bool,
    token: Option<String>,
    client_identifier: Option<String>,
    storage: String,
}

/// Handle the session command
pub async fn handle_session(args: SessionArgs, ctx: &AppContext, output: &mut OutputWriter) -> Result<()> {
    let token_key = ctx.config.adapter.token_key.as_str();
    let client_id_key = ctx.config.adapter.client_identifier_key.as_str();
    let store: &dyn KeyValueStore = ctx.store.as_ref();

    match args.action {
        SessionAction::Login(login) => login_with(store, token_key, client_id_key, &login, output),
        SessionAction::Logout => {
            remove_storage_items(store, &[token_key, client_id_key])?;
            tracing::info!("Session credentials removed");
            output.success("✓ Logged out")
        }
        SessionAction::Show => {
            let view = session_view(store, token_key, client_id_key, ctx.store.path().display().to_string())?;
            if output.is_human() {
                output.section("Session")?;
                output.info(&format!("Logged in: {}", if view.logged_in { "yes" } else { "no" }))?;
                if let Some(token) = &view.token {
                    output.info(&format!("Token: {}", token))?;
                }
                if let Some(client_id) = &view.client_identifier {
                    output.info(&format!("Client identifier: {}", client_id))?;
                }
                output.info(&format!("Storage: {}", view.storage))
            } else {
                output.data(&view)
            }
        }
    }
}

fn login_with(
    store: &dyn KeyValueStore,
    token_key: &str,
    client_id_key: &str,
    login: &LoginArgs,
    output: &mut OutputWriter,
) -> Result<()> {
    set_storage_item(store, token_key, &login.token)?;
    if let Some(client_id) = &login.client_id {
        set_storage_item(store, client_id_key, client_id)?;
    }

    tracing::info!(token = %redaction::mask(&login.token), "Session credentials stored");
    output.success("✓ Logged in")
}

fn session_view(
    store: &dyn KeyValueStore,
    token_key: &str,
    client_id_key: &str,
    storage: String,
) -> Result<SessionView> {
    let token = get_storage_item(store, token_key)?;
    let client_identifier = get_storage_item(store, client_id_key)?;

    Ok(SessionView {
        logged_in: token.is_some(),
        token: token.as_deref().map(redaction::mask),
        client_identifier,
        storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use userdesk_core::{FileStore, MemoryStore};

    fn quiet_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    #[test]
    fn test_login_then_show_masks_token() {
        let store = MemoryStore::new();
        let login = LoginArgs {
            token: "abcdef123456".to_string(),
            client_id: Some("desk-7".to_string()),
        };

        login_with(&store, "token", "xClientIdentifier", &login, &mut quiet_output()).unwrap();

        let view = session_view(&store, "token", "xClientIdentifier", "mem".to_string()).unwrap();
        assert!(view.logged_in);
        assert_eq!(view.token.as_deref(), Some("abcd***"));
        assert_eq!(view.client_identifier.as_deref(), Some("desk-7"));
    }

    #[test]
    fn test_session_survives_across_file_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let login = LoginArgs {
            token: "abcdef123456".to_string(),
            client_id: None,
        };

        login_with(&FileStore::new(&path), "token", "xClientIdentifier", &login, &mut quiet_output())
            .unwrap();

        // A later invocation opens the file afresh
        let reopened = FileStore::new(&path);
        assert_eq!(
            get_storage_item(&reopened, "token").unwrap().as_deref(),
            Some("abcdef123456")
        );

        remove_storage_items(&reopened, &["token", "xClientIdentifier"]).unwrap();
        let view = session_view(&reopened, "token", "xClientIdentifier", String::new()).unwrap();
        assert!(!view.logged_in);
    }
}
