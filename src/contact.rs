//! Contact form submissions

use chrono::{DateTime, Utc};

use crate::error::WellnessError;
use crate::store::Database;
use crate::types::{new_id, ContactMessage};

pub fn submit(
    db: &mut Database,
    name: &str,
    email: &str,
    message: &str,
    now: DateTime<Utc>,
) -> Result<ContactMessage, WellnessError> {
    let (name, email, message) = (name.trim(), email.trim(), message.trim());
    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(WellnessError::invalid("all fields are required"));
    }
    let msg = ContactMessage {
        contact_id: new_id("contact"),
        name: name.to_string(),
        email: email.to_string(),
        message: message.to_string(),
        received_at: now,
    };
    db.contact_messages.push(msg.clone());
    tracing::info!(contact_id = %msg.contact_id, "contact message received");
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_submit_requires_all_fields() {
        let mut db = Database::new();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(submit(&mut db, "Ada", "", "hi", now).is_err());
        let saved = submit(&mut db, " Ada ", "ada@example.com", "Love the app", now).unwrap();
        assert_eq!(saved.name, "Ada");
        assert_eq!(db.contact_messages.len(), 1);
    }
}
