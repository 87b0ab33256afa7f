//! Contact form validation and storage
//!
//! Accepted submissions are appended as JSON lines to
//! `<root>/contact/messages.jsonl`; an operator reads them from there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::Result;

/// Contact form payload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Validation failure for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// `local@domain.tld` shape check; deliverability is not verified
pub fn is_plausible_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty())
        && labels.last().map(|tld| tld.len() >= 2).unwrap_or(false)
}

impl ContactSubmission {
    /// Trim every field and drop empty optionals
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.message = self.message.trim().to_string();
        self.phone = self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        self.subject = self.subject.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self
    }

    /// Check every field, reporting all problems at once
    pub fn validate(&self) -> std::result::Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let name_len = char_len(self.name.trim());
        if name_len < 2 {
            errors.push(FieldError::new("name", "Name must be at least 2 characters"));
        } else if name_len > 100 {
            errors.push(FieldError::new("name", "Name must be at most 100 characters"));
        }

        if !is_plausible_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Enter a valid email address"));
        }

        if let Some(phone) = self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            let allowed = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
            if !allowed || !(7..=20).contains(&char_len(phone)) {
                errors.push(FieldError::new("phone", "Enter a valid phone number"));
            }
        }

        if let Some(subject) = &self.subject {
            if char_len(subject.trim()) > 200 {
                errors.push(FieldError::new("subject", "Subject must be at most 200 characters"));
            }
        }

        let message_len = char_len(self.message.trim());
        if message_len < 10 {
            errors.push(FieldError::new("message", "Message must be at least 10 characters"));
        } else if message_len > 5000 {
            errors.push(FieldError::new("message", "Message must be at most 5000 characters"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Stored contact message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub submission: ContactSubmission,
}

/// Append-only store for contact messages
#[derive(Debug)]
pub struct ContactInbox {
    path: PathBuf,
    // Serialises appends so concurrent lines never interleave
    write_lock: Mutex<()>,
}

impl ContactInbox {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join("messages.jsonl"),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store an already-validated submission
    pub async fn store(&self, submission: ContactSubmission) -> Result<ContactMessage> {
        let message = ContactMessage {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            submission,
        };

        let mut line = serde_json::to_string(&message)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(id = %message.id, "Stored contact message");
        Ok(message)
    }
}
