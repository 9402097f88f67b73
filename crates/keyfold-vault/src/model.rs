// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The decrypted vault document: folders ("people") and their entries.
//!
//! Field names serialize in camelCase so the encrypted payload stays
//! compatible with documents written by earlier clients.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use keyfold_core::KeyfoldError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Fixed folder color palette. Cosmetic only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FolderColor {
    #[default]
    Blue,
    Green,
    Red,
    Orange,
    Purple,
    Pink,
    Teal,
    Gray,
}

/// A folder grouping entries. Named "person" because folders usually hold
/// one person's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: FolderColor,
}

/// A stored credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub person_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("person_id", &self.person_id)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// An entry as submitted by an edit form.
///
/// `id == None` creates a new entry; `Some(id)` replaces the entry with that
/// id wholesale. `person_id` may be unset while the form is being filled in,
/// but saving requires it.
#[derive(Clone, Default)]
pub struct EntryDraft {
    pub id: Option<String>,
    pub person_id: Option<String>,
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
}

impl std::fmt::Debug for EntryDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryDraft")
            .field("id", &self.id)
            .field("person_id", &self.person_id)
            .field("title", &self.title)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl From<&Entry> for EntryDraft {
    fn from(entry: &Entry) -> Self {
        Self {
            id: Some(entry.id.clone()),
            person_id: Some(entry.person_id.clone()),
            title: entry.title.clone(),
            username: entry.username.clone(),
            password: entry.password.clone(),
            url: entry.url.clone(),
            notes: entry.notes.clone(),
        }
    }
}

/// The full decrypted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainVault {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub items: Vec<Entry>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn folder_name(name: &str) -> Result<String, KeyfoldError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KeyfoldError::Validation(
            "folder name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

impl PlainVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.items.iter().find(|e| e.id == id)
    }

    /// Entries belonging to one folder, in stored order.
    pub fn entries_for<'a>(&'a self, person_id: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.items.iter().filter(move |e| e.person_id == person_id)
    }

    /// Create a folder. The name is trimmed and must not be empty.
    pub fn add_person(&mut self, name: &str, color: FolderColor) -> Result<Person, KeyfoldError> {
        let person = Person {
            id: new_id(),
            name: folder_name(name)?,
            color,
        };
        self.people.push(person.clone());
        Ok(person)
    }

    /// Rename or recolor a folder.
    pub fn update_person(
        &mut self,
        id: &str,
        name: &str,
        color: FolderColor,
    ) -> Result<Person, KeyfoldError> {
        let name = folder_name(name)?;
        let person = self
            .people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| KeyfoldError::Validation(format!("folder `{id}` does not exist")))?;
        person.name = name;
        person.color = color;
        Ok(person.clone())
    }

    /// Delete a folder and every entry in it. Deleting an unknown folder is a
    /// no-op. Returns the number of entries removed.
    pub fn delete_person(&mut self, id: &str) -> usize {
        self.people.retain(|p| p.id != id);
        let before = self.items.len();
        self.items.retain(|e| e.person_id != id);
        before - self.items.len()
    }

    /// Create or replace an entry.
    ///
    /// Replacement keeps the entry's position and `created_at`; `updated_at`
    /// is refreshed on every save.
    pub fn save_entry(&mut self, draft: EntryDraft) -> Result<Entry, KeyfoldError> {
        let person_id = draft
            .person_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                KeyfoldError::Validation("an entry must belong to a folder".to_string())
            })?;
        if self.person(&person_id).is_none() {
            return Err(KeyfoldError::Validation(format!(
                "folder `{person_id}` does not exist"
            )));
        }

        let now = Utc::now();
        let mut entry = Entry {
            id: String::new(),
            person_id,
            title: draft.title,
            username: draft.username,
            password: draft.password,
            url: draft.url,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        match draft.id {
            Some(id) => {
                let slot = self
                    .items
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(|| KeyfoldError::Validation(format!("entry `{id}` does not exist")))?;
                entry.id = id;
                entry.created_at = slot.created_at;
                *slot = entry.clone();
            }
            None => {
                entry.id = new_id();
                self.items.push(entry.clone());
            }
        }
        Ok(entry)
    }

    /// Delete an entry. Returns whether anything was removed.
    pub fn delete_entry(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|e| e.id != id);
        before != self.items.len()
    }

    /// Case-insensitive match on title, username, and url. An empty query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|e| {
                needle.is_empty()
                    || [&e.title, &e.username, &e.url]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Check referential integrity: unique ids and no orphaned entries.
    pub fn validate(&self) -> Result<(), KeyfoldError> {
        let mut person_ids = HashSet::new();
        for person in &self.people {
            if !person_ids.insert(person.id.as_str()) {
                return Err(KeyfoldError::Validation(format!(
                    "duplicate folder id `{}`",
                    person.id
                )));
            }
        }

        let mut entry_ids = HashSet::new();
        for entry in &self.items {
            if !entry_ids.insert(entry.id.as_str()) {
                return Err(KeyfoldError::Validation(format!(
                    "duplicate entry id `{}`",
                    entry.id
                )));
            }
            if !person_ids.contains(entry.person_id.as_str()) {
                return Err(KeyfoldError::Validation(format!(
                    "entry `{}` references missing folder `{}`",
                    entry.id, entry.person_id
                )));
            }
        }
        Ok(())
    }
}
