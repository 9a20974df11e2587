//! Greeting text derived from the sender's profile.

use crate::telegram::User;

/// Used when the sender is unknown or has no usable name fields.
pub const DEFAULT_GREETING: &str = "Hello there";

/// Build the reply text for a sender.
///
/// Joins `@username`, first name and last name with single spaces, in that
/// order. Absent or empty fields are dropped; the rest are used as given.
pub fn build_greeting(from: Option<&User>) -> String {
    let Some(user) = from else {
        return DEFAULT_GREETING.to_string();
    };

    let username = user
        .username
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| format!("@{}", u));

    let parts: Vec<String> = [username, user.first_name.clone(), user.last_name.clone()]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        DEFAULT_GREETING.to_string()
    } else {
        format!("Hello {}", parts.join(" "))
    }
}
