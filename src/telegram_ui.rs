//! Inline keyboard components for the confirmation prompts.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Button tokens carried in callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    SavePhones,
    SaveEmails,
    Cancel,
}

impl ButtonAction {
    /// Encode action as callback data string
    pub fn encode(&self) -> &'static str {
        match self {
            Self::SavePhones => "save_phone",
            Self::SaveEmails => "save_emails",
            Self::Cancel => "cancel",
        }
    }

    /// Decode callback data string to action
    pub fn decode(data: &str) -> Option<Self> {
        match data {
            "save_phone" => Some(Self::SavePhones),
            "save_emails" => Some(Self::SaveEmails),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Save/Cancel prompt attached to an extraction preview.
pub fn confirmation_keyboard(save: ButtonAction) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Save", save.encode()),
        InlineKeyboardButton::callback("Cancel", ButtonAction::Cancel.encode()),
    ]])
}
