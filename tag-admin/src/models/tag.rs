use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::pagination::Pagination;
use crate::normalize::{
    pick, pick_array, pick_bool, pick_datetime, pick_object, pick_str, ref_id, unwrap_data,
    Object,
};

/// Lifecycle of a QR tag: `generated -> assigned -> activated`, with
/// `archived` reachable from any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    Generated,
    Assigned,
    Activated,
    Archived,
    #[serde(other)]
    Unknown,
}

impl TagStatus {
    pub const ALL: [TagStatus; 4] = [
        TagStatus::Generated,
        TagStatus::Assigned,
        TagStatus::Activated,
        TagStatus::Archived,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "generated" => TagStatus::Generated,
            "assigned" => TagStatus::Assigned,
            "activated" | "active" => TagStatus::Activated,
            "archived" => TagStatus::Archived,
            _ => TagStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TagStatus::Generated => "generated",
            TagStatus::Assigned => "assigned",
            TagStatus::Activated => "activated",
            TagStatus::Archived => "archived",
            TagStatus::Unknown => "unknown",
        }
    }

    pub fn can_transition_to(&self, next: TagStatus) -> bool {
        use TagStatus::*;
        match (self, next) {
            (_, Unknown) | (Archived, _) => false,
            (_, Archived) => true,
            (Generated, Assigned) | (Assigned, Activated) => true,
            _ => false,
        }
    }

    /// States an operator may move a tag to from here.
    pub fn next_states(&self) -> Vec<TagStatus> {
        Self::ALL
            .into_iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub sms: bool,
    pub whatsapp: bool,
    pub call: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            sms: true,
            whatsapp: true,
            call: true,
        }
    }
}

impl NotificationPreferences {
    fn from_object(obj: &Object) -> Self {
        let defaults = Self::default();
        Self {
            sms: pick_bool(obj, &["sms"]).unwrap_or(defaults.sms),
            whatsapp: pick_bool(obj, &["whatsapp", "whatsApp"]).unwrap_or(defaults.whatsapp),
            call: pick_bool(obj, &["call"]).unwrap_or(defaults.call),
        }
    }
}

/// Vehicle owner a tag is registered to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerAssignment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub vehicle_number: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub notification_preferences: NotificationPreferences,
}

impl OwnerAssignment {
    pub fn from_object(obj: &Object) -> Self {
        Self {
            id: pick_str(obj, &["_id", "id", "userId"]),
            name: pick_str(obj, &["name", "fullName"]),
            phone: pick_str(obj, &["phone", "mobile"]),
            email: pick_str(obj, &["email"]),
            vehicle_number: pick_str(obj, &["vehicleNumber", "vehicleNo"]),
            vehicle_type: pick_str(obj, &["vehicleType"]),
            city: pick_str(obj, &["city"]),
            notification_preferences: pick_object(obj, &["notificationPreferences", "preferences"])
                .map(NotificationPreferences::from_object)
                .unwrap_or_default(),
        }
    }
}

/// Affiliate partner a tag is assigned to, as embedded in tag payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateRef {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl AffiliateRef {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(Self {
                id: pick_str(obj, &["_id", "id"]),
                name: pick_str(obj, &["name", "fullName"]),
                email: pick_str(obj, &["email"]),
            }),
            other => ref_id(other).map(|id| Self {
                id: Some(id),
                ..Self::default()
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagItem {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tag_id: Option<String>,
    #[serde(default)]
    pub short_code: Option<String>,
    pub status: TagStatus,
    #[serde(default)]
    pub batch_name: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub assigned_to: Option<AffiliateRef>,
    /// Present (possibly `null`) on every normalized item.
    pub owner: Option<OwnerAssignment>,
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Maps a raw tag payload onto [`TagItem`]. Never fails.
///
/// The serialized form of a [`TagItem`] uses the first key of every lookup
/// below, so applying this to its own output is a no-op.
pub fn normalize_tag_item(raw: &Value) -> TagItem {
    let Some(obj) = raw.as_object() else {
        return TagItem::empty();
    };

    let status = pick_str(obj, &["status"])
        .map(|s| TagStatus::parse(&s))
        .unwrap_or(TagStatus::Unknown);

    let owner = pick_object(obj, &["ownerAssignedTo", "owner"])
        .map(OwnerAssignment::from_object)
        .filter(|o| o.name.is_some() || o.phone.is_some() || o.id.is_some());

    let activated_at = if status == TagStatus::Activated {
        pick_datetime(obj, &["activatedAt", "activationDate"])
    } else {
        None
    };

    TagItem {
        id: pick_str(obj, &["_id", "id"]),
        tag_id: pick_str(obj, &["tagId"]),
        short_code: pick_str(obj, &["shortCode", "short_code", "code"]),
        status,
        batch_name: pick_str(obj, &["batchName", "batch"]),
        metadata: pick_object(obj, &["metadata"]).cloned().unwrap_or_default(),
        assigned_to: pick(obj, &["assignedTo", "affiliate"]).and_then(AffiliateRef::from_value),
        owner,
        activated_at,
        created_at: pick_datetime(obj, &["createdAt"]),
    }
}

impl TagItem {
    fn empty() -> Self {
        Self {
            id: None,
            tag_id: None,
            short_code: None,
            status: TagStatus::Unknown,
            batch_name: None,
            metadata: Map::new(),
            assigned_to: None,
            owner: None,
            activated_at: None,
            created_at: None,
        }
    }

    /// Id used in mutating calls: database id, then `tagId`.
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.tag_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagListResponse {
    pub tags: Vec<TagItem>,
    pub pagination: Pagination,
}

impl TagListResponse {
    /// Accepts `{tags|items|data: [..], pagination}`, a bare array, or
    /// anything else (which yields an empty page).
    pub fn from_value(value: Value) -> Self {
        let value = unwrap_data(value);
        match &value {
            Value::Array(items) => Self {
                tags: items.iter().map(normalize_tag_item).collect(),
                pagination: Pagination {
                    total: items.len() as u64,
                    total_pages: u64::from(!items.is_empty()),
                    ..Pagination::default()
                },
            },
            Value::Object(obj) => {
                let tags: Vec<TagItem> = pick_array(obj, &["tags", "items", "data", "results"])
                    .map(|items| items.iter().map(normalize_tag_item).collect())
                    .unwrap_or_default();
                let pagination = Pagination::from_response(obj, tags.len());
                Self { tags, pagination }
            }
            _ => Self {
                tags: Vec::new(),
                pagination: Pagination::default(),
            },
        }
    }
}

/// Result of looking a tag up by its short code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagVerifyResult {
    #[serde(rename = "_id")]
    pub id: String,
    pub short_code: String,
    pub status: TagStatus,
    pub batch_name: Option<String>,
    /// Affiliate the tag is assigned to; autofills the sales person.
    pub assigned_to: Option<String>,
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub owner_email: Option<String>,
}

impl TagVerifyResult {
    /// `None` when the payload has no `_id`, meaning the tag does not exist.
    pub fn from_value(value: Value, short_code: &str) -> Option<Self> {
        let value = unwrap_data(value);
        let root = value.as_object()?;
        let obj = pick_object(root, &["tag"]).unwrap_or(root);

        let id = pick_str(obj, &["_id"])?;
        let owner = pick_object(obj, &["ownerAssignedTo", "owner"]);

        Some(Self {
            id,
            short_code: short_code.trim().to_string(),
            status: pick_str(obj, &["status"])
                .map(|s| TagStatus::parse(&s))
                .unwrap_or(TagStatus::Unknown),
            batch_name: pick_str(obj, &["batchName"]),
            assigned_to: pick(obj, &["assignedTo"]).and_then(ref_id),
            owner_id: owner.and_then(|o| pick_str(o, &["_id", "id", "userId"])),
            owner_name: owner.and_then(|o| pick_str(o, &["name", "fullName"])),
            owner_phone: owner.and_then(|o| pick_str(o, &["phone", "mobile"])),
            owner_email: owner.and_then(|o| pick_str(o, &["email"])),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_tag() -> Value {
        json!({
            "_id": "65f0c1",
            "shortCode": "QX7K2",
            "status": "activated",
            "batchName": "March",
            "metadata": { "printRun": 3 },
            "assignedTo": { "_id": "aff1", "name": "Ravi" },
            "ownerAssignedTo": {
                "name": "Asha",
                "phone": "9876543210",
                "vehicleNumber": "KA01AB1234",
                "notificationPreferences": { "sms": true, "whatsapp": false, "call": true }
            },
            "activatedAt": "2024-03-01T10:00:00Z",
            "createdAt": "2024-02-01T10:00:00Z"
        })
    }

    #[test]
    fn normalizes_raw_payload() {
        let tag = normalize_tag_item(&raw_tag());
        assert_eq!(tag.key(), Some("65f0c1"));
        assert_eq!(tag.status, TagStatus::Activated);
        assert_eq!(tag.assigned_to.as_ref().and_then(|a| a.name.as_deref()), Some("Ravi"));
        let owner = tag.owner.expect("owner");
        assert_eq!(owner.vehicle_number.as_deref(), Some("KA01AB1234"));
        assert!(!owner.notification_preferences.whatsapp);
        assert!(tag.activated_at.is_some());
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let once = normalize_tag_item(&raw_tag());
        let twice = normalize_tag_item(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);

        let bare = normalize_tag_item(&json!({ "shortCode": "AB1" }));
        let again = normalize_tag_item(&serde_json::to_value(&bare).unwrap());
        assert_eq!(bare, again);
    }

    #[test]
    fn activation_time_dropped_unless_activated() {
        let mut raw = raw_tag();
        raw["status"] = json!("assigned");
        assert!(normalize_tag_item(&raw).activated_at.is_none());
    }

    #[test]
    fn raw_owner_key_is_still_normalized() {
        let raw = json!({
            "_id": "65f0c2",
            "shortCode": "QX7K3",
            "status": "active",
            "owner": { "fullName": "Asha", "mobile": "9876543210" },
            "activatedAt": "2024-03-01T10:00:00Z"
        });
        let tag = normalize_tag_item(&raw);
        assert_eq!(tag.status, TagStatus::Activated);
        assert!(tag.activated_at.is_some());
        let owner = tag.owner.as_ref().expect("owner");
        assert_eq!(owner.name.as_deref(), Some("Asha"));
        assert_eq!(owner.phone.as_deref(), Some("9876543210"));

        let mut assigned = raw.clone();
        assigned["status"] = json!("assigned");
        assert!(normalize_tag_item(&assigned).activated_at.is_none());
    }

    #[test]
    fn malformed_items_do_not_panic() {
        let tag = normalize_tag_item(&json!("not an object"));
        assert_eq!(tag.status, TagStatus::Unknown);
        assert!(tag.owner.is_none());

        let tag = normalize_tag_item(&json!({ "status": 7, "assignedTo": 12 }));
        assert_eq!(tag.status, TagStatus::Unknown);
        assert_eq!(tag.assigned_to.and_then(|a| a.id).as_deref(), Some("12"));
    }

    #[test]
    fn status_transitions() {
        assert!(TagStatus::Generated.can_transition_to(TagStatus::Assigned));
        assert!(TagStatus::Assigned.can_transition_to(TagStatus::Activated));
        assert!(TagStatus::Activated.can_transition_to(TagStatus::Archived));
        assert!(!TagStatus::Generated.can_transition_to(TagStatus::Activated));
        assert!(!TagStatus::Archived.can_transition_to(TagStatus::Generated));
        assert!(!TagStatus::Assigned.can_transition_to(TagStatus::Assigned));
        assert_eq!(
            TagStatus::Generated.next_states(),
            vec![TagStatus::Assigned, TagStatus::Archived]
        );
    }

    #[test]
    fn list_response_tolerates_missing_pieces() {
        let list = TagListResponse::from_value(json!({ "success": true }));
        assert!(list.tags.is_empty());
        assert_eq!(list.pagination, Pagination::default());

        let list = TagListResponse::from_value(json!({ "tags": [raw_tag()] }));
        assert_eq!(list.tags.len(), 1);
        assert_eq!(list.pagination.total, 1);
    }

    #[test]
    fn verify_result_requires_id() {
        assert!(TagVerifyResult::from_value(json!({ "shortCode": "QX7K2" }), "QX7K2").is_none());

        let result = TagVerifyResult::from_value(json!({ "data": raw_tag() }), " QX7K2 ").unwrap();
        assert_eq!(result.short_code, "QX7K2");
        assert_eq!(result.assigned_to.as_deref(), Some("aff1"));
        assert_eq!(result.owner_name.as_deref(), Some("Asha"));
    }
}
