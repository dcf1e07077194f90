use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OnboardRequest {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    // page the form was submitted from
    #[serde(default)]
    pub path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateThreadRequest {
    pub text: String,
    #[serde(default)]
    pub community_id: Option<String>,
    #[serde(default)]
    pub path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommentRequest {
    pub text: String,
    #[serde(default)]
    pub path: String,
}
