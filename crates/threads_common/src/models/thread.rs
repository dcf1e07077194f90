use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Thread {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub oid: Option<ObjectId>,
    pub text: String,
    pub author: ObjectId,
    #[serde(default)]
    pub community: Option<ObjectId>,
    pub created_at: DateTime,
    // hex string of the parent thread's _id, None for top level threads
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<ObjectId>,
}

impl Thread {
    pub fn new(text: String, author: ObjectId) -> Self {
        Self {
            oid: None,
            text,
            author,
            community: None,
            created_at: DateTime::now(),
            parent_id: None,
            children: vec![],
        }
    }

    /// Build a reply to `parent`
    pub fn reply(text: String, author: ObjectId, parent: &ObjectId) -> Self {
        Self {
            parent_id: Some(parent.to_hex()),
            ..Self::new(text, author)
        }
    }
}
