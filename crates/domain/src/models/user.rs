//! User directory view.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a user profile the core needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    /// Pro accounts may publish paid events.
    pub is_pro: bool,
}

impl User {
    pub fn new(id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            is_pro: false,
        }
    }

    pub fn pro(mut self) -> Self {
        self.is_pro = true;
        self
    }
}
