use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Author / member card embedded in threads and communities
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommunitySummary {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A reply as shown under its parent, and as an activity entry
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReplyView {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub text: String,
    pub author: UserSummary,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime,
    #[serde(default)]
    pub children: Vec<ObjectId>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ThreadView {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub text: String,
    pub author: UserSummary,
    #[serde(default)]
    pub community: Option<CommunitySummary>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime,
    #[serde(default)]
    pub children: Vec<ReplyView>,
}

/// A thread page: the thread plus its replies, each with their own replies
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ThreadDetail {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub text: String,
    pub author: UserSummary,
    #[serde(default)]
    pub community: Option<CommunitySummary>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime,
    #[serde(default)]
    pub children: Vec<ThreadView>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub threads: Vec<ObjectId>,
    #[serde(default)]
    pub communities: Vec<CommunitySummary>,
    #[serde(default)]
    pub onboarded: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserThreads {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub threads: Vec<ThreadView>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommunityDetails {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub created_by: UserSummary,
    #[serde(default)]
    pub members: Vec<UserSummary>,
    #[serde(default)]
    pub threads: Vec<ObjectId>,
    pub created_at: DateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommunityCard {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub members: Vec<UserSummary>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommunityThreads {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub threads: Vec<ThreadView>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FeedPage {
    pub threads: Vec<ThreadView>,
    pub is_next: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UsersPage {
    pub users: Vec<UserSummary>,
    pub is_next: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommunitiesPage {
    pub communities: Vec<CommunityCard>,
    pub is_next: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProfilePage {
    pub profile: UserProfile,
    pub threads: Vec<ThreadView>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommunityPage {
    pub details: CommunityDetails,
    pub threads: Vec<ThreadView>,
}

/// Prefill for the onboarding form
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OnboardingPage {
    pub id: String,
    pub username: String,
    pub name: String,
    pub bio: String,
    pub image: String,
    pub onboarded: bool,
}

impl From<UserProfile> for OnboardingPage {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            name: profile.name,
            bio: profile.bio.unwrap_or_default(),
            image: profile.image.unwrap_or_default(),
            onboarded: profile.onboarded,
        }
    }
}
