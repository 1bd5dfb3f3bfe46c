//! Session metadata attached to crash reports
//!
//! User identity, tags, custom data and breadcrumb history. The bridge keeps
//! one authoritative copy and mirrors every change to the crash SDK.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::breadcrumb::Breadcrumb;

/// Identity of the current end user
///
/// The default value is the anonymous user with every field empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub identifier: String,
    pub is_anonymous: bool,
    pub first_name: String,
    pub full_name: String,
    pub email: String,
}

impl User {
    /// Creates a named (non-anonymous) user
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            is_anonymous: false,
            ..Self::anonymous()
        }
    }

    pub fn anonymous() -> Self {
        Self {
            identifier: String::new(),
            is_anonymous: true,
            first_name: String::new(),
            full_name: String::new(),
            email: String::new(),
        }
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

impl Default for User {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Everything that describes the current session to the crash SDK
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub user: User,
    pub tags: BTreeSet<String>,
    pub custom_data: Map<String, Value>,
    pub breadcrumbs: Vec<Breadcrumb>,
}

impl SessionMetadata {
    /// Shallow merge: keys in `data` overwrite existing keys
    pub fn merge_custom_data(&mut self, data: Map<String, Value>) {
        for (key, value) in data {
            self.custom_data.insert(key, value);
        }
    }

    /// Union `tags` into the current tag set
    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    /// True if every field holds its empty default
    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_user_is_anonymous() {
        let user = User::default();
        assert!(user.is_anonymous);
        assert!(user.identifier.is_empty());
    }

    #[test]
    fn test_named_user() {
        let user = User::new("u-1").with_email("a@b.c").with_full_name("Ada Lovelace");
        assert!(!user.is_anonymous);
        assert_eq!(user.identifier, "u-1");
        assert_eq!(user.email, "a@b.c");
        assert!(user.first_name.is_empty());
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let value = serde_json::to_value(User::new("u-1").with_first_name("Ada")).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["isAnonymous"], false);
    }

    #[test]
    fn test_merge_custom_data_overwrites_keys() {
        let mut meta = SessionMetadata::default();
        let first = json!({"a": 1, "b": 2});
        let second = json!({"b": 3, "c": 4});
        meta.merge_custom_data(first.as_object().cloned().unwrap());
        meta.merge_custom_data(second.as_object().cloned().unwrap());
        assert_eq!(Value::Object(meta.custom_data), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_add_tags_unions() {
        let mut meta = SessionMetadata::default();
        meta.add_tags(["beta", "ios"]);
        meta.add_tags(vec!["beta".to_string(), "tablet".to_string()]);
        assert_eq!(meta.tags.len(), 3);
    }

    #[test]
    fn test_is_cleared() {
        let mut meta = SessionMetadata::default();
        assert!(meta.is_cleared());
        meta.add_tags(["x"]);
        assert!(!meta.is_cleared());
    }
}
