use crate::mongo::ThreadsDB;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use threads_common::errors::ThreadsServerError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age (and clock skew) accepted for a webhook timestamp, in seconds
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";

fn signature_error(msg: &str) -> ThreadsServerError {
    ThreadsServerError::WebhookSignature(msg.to_string())
}

/**
 * Check a webhook body against its svix signature headers
 *
 * @param secret - endpoint secret, `whsec_` followed by base64
 * @param id - svix-id header
 * @param timestamp - svix-timestamp header, unix seconds
 * @param signatures - svix-signature header, space separated `v1,<base64>` entries
 * @param body - raw request body
 * @param now - current unix time in seconds
 */
pub fn verify_signature(
    secret: &str,
    id: &str,
    timestamp: &str,
    signatures: &str,
    body: &str,
    now: i64,
) -> Result<(), ThreadsServerError> {
    let sent_at: i64 = timestamp
        .parse()
        .map_err(|_| signature_error("Malformed timestamp"))?;
    if (now - sent_at).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(signature_error("Timestamp outside of tolerance"));
    }

    let key = STANDARD
        .decode(secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret))
        .map_err(|_| signature_error("Malformed webhook secret"))?;
    let mut mac =
        HmacSha256::new_from_slice(&key).map_err(|_| signature_error("Malformed webhook secret"))?;
    mac.update(format!("{}.{}.{}", id, timestamp, body).as_bytes());

    let matched = signatures
        .split_whitespace()
        .filter_map(|entry| entry.strip_prefix("v1,"))
        .filter_map(|signature| STANDARD.decode(signature).ok())
        .any(|signature| mac.clone().verify_slice(&signature).is_ok());
    match matched {
        true => Ok(()),
        false => Err(signature_error("No matching signature")),
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub public_metadata: Value,
}

impl OrganizationData {
    fn username(&self) -> String {
        self.slug.clone().unwrap_or_else(|| self.id.clone())
    }

    fn image(&self) -> Option<String> {
        self.image_url.clone().or_else(|| self.logo_url.clone())
    }

    /// `public_metadata.bio` when the organization set a non-blank one
    fn bio(&self) -> Option<String> {
        self.public_metadata
            .get("bio")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|bio| !bio.is_empty())
            .map(String::from)
    }
}

#[derive(Debug, Deserialize)]
pub struct DeletedObject {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct PublicUserData {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MembershipData {
    pub organization: OrganizationRef,
    pub public_user_data: PublicUserData,
}

/// Organization events the server reacts to
#[derive(Debug)]
pub enum WebhookEvent {
    OrganizationCreated(OrganizationData),
    OrganizationUpdated(OrganizationData),
    OrganizationDeleted(DeletedObject),
    MembershipCreated(MembershipData),
    MembershipDeleted(MembershipData),
    InvitationCreated(Value),
    Unsupported(String),
}

fn parse_data<T: serde::de::DeserializeOwned>(kind: &str, data: Value) -> Result<T, ThreadsServerError> {
    serde_json::from_value(data).map_err(|e| ThreadsServerError::SerdeError(format!("{}: {}", kind, e)))
}

impl WebhookEvent {
    pub fn parse(body: &str) -> Result<Self, ThreadsServerError> {
        let envelope: WebhookEnvelope = serde_json::from_str(body)
            .map_err(|e| ThreadsServerError::SerdeError(format!("webhook body: {}", e)))?;
        let kind = envelope.kind.as_str();
        let event = match kind {
            "organization.created" => WebhookEvent::OrganizationCreated(parse_data(kind, envelope.data)?),
            "organization.updated" => WebhookEvent::OrganizationUpdated(parse_data(kind, envelope.data)?),
            "organization.deleted" => WebhookEvent::OrganizationDeleted(parse_data(kind, envelope.data)?),
            "organizationMembership.created" => {
                WebhookEvent::MembershipCreated(parse_data(kind, envelope.data)?)
            }
            "organizationMembership.deleted" => {
                WebhookEvent::MembershipDeleted(parse_data(kind, envelope.data)?)
            }
            "organizationInvitation.created" => WebhookEvent::InvitationCreated(envelope.data),
            _ => WebhookEvent::Unsupported(envelope.kind),
        };
        Ok(event)
    }

    /**
     * Apply the event to the database
     *
     * @returns - a short description of what was done
     */
    pub async fn apply(self, db: &ThreadsDB) -> Result<String, ThreadsServerError> {
        match self {
            WebhookEvent::OrganizationCreated(org) => {
                let created_by = match &org.created_by {
                    Some(created_by) => created_by.clone(),
                    None => {
                        return Err(ThreadsServerError::SerdeError(String::from(
                            "organization.created: missing created_by",
                        )))
                    }
                };
                db.create_community(
                    &org.id,
                    &org.name,
                    &org.username(),
                    org.image(),
                    org.bio(),
                    &created_by,
                )
                .await?;
                Ok(format!("Community {} created", org.id))
            }
            WebhookEvent::OrganizationUpdated(org) => {
                db.update_community_info(&org.id, &org.name, &org.username(), org.image())
                    .await?;
                Ok(format!("Community {} updated", org.id))
            }
            WebhookEvent::OrganizationDeleted(org) => {
                db.delete_community(&org.id).await?;
                Ok(format!("Community {} deleted", org.id))
            }
            WebhookEvent::MembershipCreated(membership) => {
                db.add_member_to_community(
                    &membership.organization.id,
                    &membership.public_user_data.user_id,
                )
                .await?;
                Ok(format!(
                    "{} joined {}",
                    membership.public_user_data.user_id, membership.organization.id
                ))
            }
            WebhookEvent::MembershipDeleted(membership) => {
                db.remove_user_from_community(
                    &membership.public_user_data.user_id,
                    &membership.organization.id,
                )
                .await?;
                Ok(format!(
                    "{} left {}",
                    membership.public_user_data.user_id, membership.organization.id
                ))
            }
            WebhookEvent::InvitationCreated(data) => {
                tracing::info!("Organization invitation created: {}", data);
                Ok(String::from("Invitation logged"))
            }
            WebhookEvent::Unsupported(kind) => {
                tracing::debug!("Ignoring webhook event {}", kind);
                Ok(format!("Ignored {}", kind))
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, id: &str, timestamp: &str, body: &str) -> String {
    let key = STANDARD
        .decode(secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret))
        .unwrap();
    let mut mac = HmacSha256::new_from_slice(&key).unwrap();
    mac.update(format!("{}.{}.{}", id, timestamp, body).as_bytes());
    format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
    const BODY: &str = r#"{"type":"organization.deleted","data":{"id":"org_1"}}"#;

    #[test]
    fn accepts_a_valid_signature_among_others() {
        let signature = sign(SECRET, "msg_1", "1700000000", BODY);
        let header = format!("v1,bm90IGl0 {}", signature);
        assert!(verify_signature(SECRET, "msg_1", "1700000000", &header, BODY, 1700000010).is_ok());
    }

    #[test]
    fn rejects_tampered_bodies() {
        let signature = sign(SECRET, "msg_1", "1700000000", BODY);
        let tampered = BODY.replace("org_1", "org_2");
        assert_eq!(
            verify_signature(SECRET, "msg_1", "1700000000", &signature, &tampered, 1700000000),
            Err(signature_error("No matching signature"))
        );
    }

    #[test]
    fn rejects_stale_timestamps() {
        let signature = sign(SECRET, "msg_1", "1700000000", BODY);
        let late = 1700000000 + TIMESTAMP_TOLERANCE_SECS + 1;
        assert_eq!(
            verify_signature(SECRET, "msg_1", "1700000000", &signature, BODY, late),
            Err(signature_error("Timestamp outside of tolerance"))
        );
    }

    #[test]
    fn parses_membership_events() {
        let body = r#"{
            "type": "organizationMembership.created",
            "data": {
                "organization": { "id": "org_1", "name": "Rustaceans" },
                "public_user_data": { "user_id": "user_1", "first_name": "Jane" },
                "role": "basic_member"
            }
        }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::MembershipCreated(membership) => {
                assert_eq!(membership.organization.id, "org_1");
                assert_eq!(membership.public_user_data.user_id, "user_1");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn organization_falls_back_to_logo_and_id() {
        let body = r#"{
            "type": "organization.updated",
            "data": { "id": "org_1", "name": "Rustaceans", "logo_url": "https://img/logo.png" }
        }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::OrganizationUpdated(org) => {
                assert_eq!(org.username(), "org_1");
                assert_eq!(org.image().as_deref(), Some("https://img/logo.png"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn organization_bio_comes_from_public_metadata() {
        let body = r#"{
            "type": "organization.created",
            "data": {
                "id": "org_1",
                "name": "Rustaceans",
                "created_by": "user_1",
                "public_metadata": { "bio": "We write Rust" }
            }
        }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::OrganizationCreated(org) => {
                assert_eq!(org.bio().as_deref(), Some("We write Rust"));
            }
            other => panic!("unexpected event {:?}", other),
        }

        let body = r#"{
            "type": "organization.created",
            "data": { "id": "org_2", "name": "Gophers", "created_by": "user_1", "public_metadata": {} }
        }"#;
        match WebhookEvent::parse(body).unwrap() {
            WebhookEvent::OrganizationCreated(org) => assert_eq!(org.bio(), None),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn unknown_events_are_not_errors() {
        let body = r#"{ "type": "user.created", "data": { "id": "user_1" } }"#;
        assert!(matches!(
            WebhookEvent::parse(body).unwrap(),
            WebhookEvent::Unsupported(kind) if kind == "user.created"
        ));
    }
}
