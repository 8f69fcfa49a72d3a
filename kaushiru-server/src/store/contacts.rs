//! Contact form messages

use kaushiru_common::db::ColumnSet;
use kaushiru_common::time::{now, to_db_timestamp};
use kaushiru_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use super::{new_id, non_blank, InsertRow};

const TABLE: &str = "contacts";

pub const MAX_MESSAGE_CHARS: usize = 5000;

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub message: String,
}

/// Validated contact with blank optional fields removed
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: String,
}

pub async fn save_contact(pool: &SqlitePool, input: &NewContact) -> Result<ContactMessage> {
    let message = input.message.trim();
    if message.is_empty() {
        return Err(Error::InvalidInput("message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(Error::InvalidInput(format!(
            "message exceeds {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let columns = ColumnSet::load(pool, TABLE).await?;
    if !columns.table_exists() {
        return Err(Error::Internal("contacts table is missing".to_string()));
    }

    let contact = ContactMessage {
        id: new_id(),
        name: non_blank(input.name.as_deref()),
        email: non_blank(input.email.as_deref()),
        message: message.to_string(),
    };

    InsertRow::new()
        .set("id", contact.id.clone())
        .set("name", contact.name.clone())
        .set("email", contact.email.clone())
        .set("message", contact.message.clone())
        .set("created_at", to_db_timestamp(now()))
        .insert(pool, TABLE, &columns)
        .await?;

    info!("Saved contact message {}", contact.id);
    Ok(contact)
}
