//! Conversation state machine for the multi-step flows.
//!
//! Each chat owns at most one conversation, tracked as an explicit
//! [`DialogState`] value keyed by chat id in the bot's shared state.
//! The transition functions here are transport-free: they take the
//! store/executor seams and return a [`Turn`] for the Telegram layer
//! to render.

use crate::db::ContactStore;
use crate::extract;
use crate::password::{self, Strength};
use crate::report;
use crate::ssh::CommandRunner;

/// Active conversation for one chat. No map entry = no conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    /// `/find_phone_number` issued, waiting for text to scan.
    AwaitPhoneText,
    /// Extraction shown, waiting for the save/cancel button.
    ConfirmPhones { pending: Vec<String> },
    /// `/find_email` issued, waiting for text to scan.
    AwaitEmailText,
    /// Extraction shown, waiting for the save/cancel button.
    ConfirmEmails { pending: Vec<String> },
    /// `/get_apt_list` issued, waiting for `all` or a package name.
    AwaitPackage,
    /// `/verify_password` issued; stays active until /cancel.
    AwaitPassword,
}

/// Result of feeding one text message into an active conversation.
#[derive(Debug)]
pub enum Turn {
    /// Reply and drop the conversation.
    End(String),
    /// Reply and keep the current state.
    Continue(String),
    /// Reply with a save/cancel keyboard and move to `next`.
    AwaitConfirm { message: String, next: DialogState },
}

/// Phone extraction step: scan, canonicalize, dedup against the store,
/// and either terminate or ask for confirmation.
pub async fn phone_text(store: &dyn ContactStore, text: &str) -> Turn {
    let found = extract::find_phone_numbers(text);
    if found.is_empty() {
        return Turn::End("No phone numbers found.".to_string());
    }

    let canonical: Vec<String> = found
        .iter()
        .map(|number| extract::format_phone_number(number))
        .collect();
    // Dedup is best-effort: an unreachable store must not block the
    // reply, so a failed lookup counts as "nothing stored yet".
    let existing = match store.existing_phones(&canonical).await {
        Ok(existing) => existing,
        Err(e) => {
            tracing::warn!("phone dedup lookup failed: {:#}", e);
            Vec::new()
        }
    };

    let pending: Vec<String> = found
        .into_iter()
        .filter(|number| !existing.contains(&extract::format_phone_number(number)))
        .collect();
    if pending.is_empty() {
        return Turn::End("All found phone numbers are already stored.".to_string());
    }

    let message = format!(
        "New phone numbers not yet in the database:\n{}",
        report::numbered_list(&pending)
    );
    Turn::AwaitConfirm {
        message,
        next: DialogState::ConfirmPhones { pending },
    }
}

/// Save step of the phone dialog. Inserts canonical forms one at a
/// time; the first failure aborts the rest of the batch.
pub async fn confirm_phones(store: &dyn ContactStore, pending: &[String]) -> String {
    for number in pending {
        let canonical = extract::format_phone_number(number);
        if let Err(e) = store.insert_phone(&canonical).await {
            tracing::error!("phone insert failed: {:#}", e);
            return "Failed to save phone numbers.".to_string();
        }
    }
    "Phone numbers saved.".to_string()
}

/// Email extraction step; raw matches are the dedup key.
pub async fn email_text(store: &dyn ContactStore, text: &str) -> Turn {
    let found = extract::find_emails(text);
    if found.is_empty() {
        return Turn::End("No email addresses found.".to_string());
    }

    let existing = match store.existing_emails(&found).await {
        Ok(existing) => existing,
        Err(e) => {
            tracing::warn!("email dedup lookup failed: {:#}", e);
            Vec::new()
        }
    };

    let pending: Vec<String> = found
        .into_iter()
        .filter(|email| !existing.contains(email))
        .collect();
    if pending.is_empty() {
        return Turn::End("All found email addresses are already stored.".to_string());
    }

    let message = format!(
        "New email addresses not yet in the database:\n{}",
        report::numbered_list(&pending)
    );
    Turn::AwaitConfirm {
        message,
        next: DialogState::ConfirmEmails { pending },
    }
}

/// Save step of the email dialog. Existence is re-checked immediately
/// before each insert so an address stored in the meantime is skipped,
/// never double-inserted; a failed insert still aborts the remainder.
pub async fn confirm_emails(store: &dyn ContactStore, pending: &[String]) -> String {
    for email in pending {
        let existing = match store.existing_emails(std::slice::from_ref(email)).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!("email recheck failed: {:#}", e);
                Vec::new()
            }
        };
        if !existing.is_empty() {
            continue;
        }
        if let Err(e) = store.insert_email(email).await {
            tracing::error!("email insert failed: {:#}", e);
            return "Failed to save email addresses.".to_string();
        }
    }
    "Email addresses saved.".to_string()
}

/// Package lookup step: `all` lists every installed package, anything
/// else queries one package with its version.
pub async fn package_text(runner: &dyn CommandRunner, input: &str) -> Turn {
    let package = input.trim().to_lowercase();
    // The package name is interpolated into the remote command verbatim;
    // shell metacharacters are not escaped on this path.
    let command = if package == "all" {
        "dpkg-query -W -f='${binary:Package}\n'".to_string()
    } else {
        format!(
            "dpkg-query -W -f='${{binary:Package}} ${{Version}}\n' {}",
            package
        )
    };

    let reply = match runner.run(&command).await {
        Ok(output) if output.is_empty() => "No package information found.".to_string(),
        Ok(output) => output,
        Err(e) => format!("Error: {}", e),
    };
    Turn::End(reply)
}

/// Password check step: classify and stay in the dialog.
pub fn password_text(text: &str) -> Turn {
    let verdict = match password::classify(text) {
        Strength::Complex => "Password is complex.",
        Strength::Simple => "Password is simple.",
    };
    Turn::Continue(verdict.to_string())
}
