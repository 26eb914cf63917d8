use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::UserProfile;

/// Name of a shared item.
///
/// The name doubles as the storage key of the item, so two adds with the same
/// name address the same record. The only rule is that it is non-empty; the
/// string is otherwise kept exactly as the user typed it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::EmptyItemName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ItemName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemName> for String {
    fn from(name: ItemName) -> Self {
        name.0
    }
}

impl FromStr for ItemName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemName({:?})", self.0)
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The stored document for one item.
///
/// Field names on the wire follow the hosted collection layout
/// (`count`, `imageUrl`, `userId`, `username`). `image_url` is the empty
/// string when the item was added without an image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Shared like tally. Not floored: a remove on a zero count goes negative.
    pub count: i64,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub uploader_id: Option<String>,
    #[serde(rename = "username", default, skip_serializing_if = "Option::is_none")]
    pub uploader_name: Option<String>,
}

impl ItemRecord {
    /// A freshly created item: count of one, credited to `uploader`.
    pub fn created_by(uploader: &UserProfile, image_url: impl Into<String>) -> Self {
        Self {
            count: 1,
            image_url: image_url.into(),
            uploader_id: Some(uploader.id.clone()),
            uploader_name: Some(uploader.display_name.clone()),
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }

    /// Apply a partial update in place. Fields left `None` are untouched.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(count) = patch.count {
            self.count = count;
        }
    }
}

/// Partial update for an existing [`ItemRecord`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

impl ItemPatch {
    pub fn count(count: i64) -> Self {
        Self { count: Some(count) }
    }
}

/// One row of the board: the record flattened next to its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: ItemName,
    #[serde(flatten)]
    pub record: ItemRecord,
}

impl InventoryItem {
    pub fn new(name: ItemName, record: ItemRecord) -> Self {
        Self { name, record }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(ItemName::new(""), Err(TypeError::EmptyItemName));
        assert_eq!("".parse::<ItemName>(), Err(TypeError::EmptyItemName));
    }

    #[test]
    fn name_is_kept_verbatim() {
        let name = ItemName::new("  Apple pie ").unwrap();
        assert_eq!(name.as_str(), "  Apple pie ");
        assert_eq!(name.to_string(), "  Apple pie ");
    }

    #[test]
    fn deserializing_empty_name_fails() {
        let result: Result<ItemName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn record_uses_collection_field_names() {
        let uploader = UserProfile::new("u-1", "alice");
        let record = ItemRecord::created_by(&uploader, "");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["imageUrl"], "");
        assert_eq!(json["userId"], "u-1");
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn record_without_uploader_parses() {
        let record: ItemRecord = serde_json::from_str(r#"{"count": -2}"#).unwrap();
        assert_eq!(record.count, -2);
        assert!(!record.has_image());
        assert!(record.uploader_id.is_none());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let uploader = UserProfile::new("u-1", "alice");
        let mut record = ItemRecord::created_by(&uploader, "https://img/a.png");
        record.apply(&ItemPatch::count(7));
        assert_eq!(record.count, 7);
        assert_eq!(record.image_url, "https://img/a.png");
        assert_eq!(record.uploader_name.as_deref(), Some("alice"));

        record.apply(&ItemPatch::default());
        assert_eq!(record.count, 7);
    }

    #[test]
    fn inventory_item_is_flattened() {
        let item = InventoryItem::new(
            ItemName::new("Apple").unwrap(),
            ItemRecord {
                count: 3,
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"], "Apple");
        assert_eq!(json["count"], 3);
        assert!(json.get("record").is_none());
    }

    proptest! {
        #[test]
        fn any_non_empty_name_is_accepted(s in ".{1,40}") {
            let name = ItemName::new(s.clone()).unwrap();
            prop_assert_eq!(name.as_str(), s.as_str());
        }
    }
}
