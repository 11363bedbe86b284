//! Contact lookups used when drawing assignee avatars.
//!
//! Contacts themselves are managed elsewhere; the board only needs a
//! name-to-color lookup through [`ContactDirectory`].

use std::collections::HashMap;

/// Looks up the avatar color of a contact by full name.
pub trait ContactDirectory: Send + Sync {
    /// Returns the CSS color of the named contact, if known.
    fn color_of(&self, name: &str) -> Option<String>;
}

/// A directory that knows no contacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContacts;

impl ContactDirectory for NoContacts {
    fn color_of(&self, _name: &str) -> Option<String> {
        None
    }
}

impl ContactDirectory for HashMap<String, String> {
    fn color_of(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// An assigned contact as drawn on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignee {
    /// Full name as stored on the task.
    pub name: String,
    /// Uppercase first letter of each name part.
    pub initials: String,
    /// Avatar color, if the directory knows the contact.
    pub color: Option<String>,
}

impl Assignee {
    /// Resolves a stored name against the directory.
    #[must_use]
    pub fn new(name: &str, contacts: &dyn ContactDirectory) -> Self {
        Self {
            name: name.to_string(),
            initials: initials(name),
            color: contacts.color_of(name),
        }
    }
}

/// Returns the uppercase first letter of each whitespace-separated part.
///
/// # Examples
///
/// ```
/// use join_protocol::contacts::initials;
///
/// assert_eq!(initials("Anton Mayer"), "AM");
/// assert_eq!(initials("maria  von der Heide"), "MVDH");
/// assert_eq!(initials(""), "");
/// ```
#[must_use]
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
