//! Usage events

use crate::provisioning::ProvisionedCredential;

pub const PROVISIONING_CATEGORY: &str = "provisioning";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEvent {
    pub category: String,
    pub action: String,
    pub label: Option<String>,
    /// Anonymous per-account identifier (never the external user ID)
    pub client_id: String,
}

impl UsageEvent {
    pub fn new(
        category: impl Into<String>,
        action: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: None,
            client_id: client_id.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Event describing a completed provisioning call, labelled with the realm.
    pub fn token_issued(credential: &ProvisionedCredential) -> Self {
        let action = if credential.created_account {
            "account_created"
        } else {
            "token_rotated"
        };
        Self::new(PROVISIONING_CATEGORY, action, &credential.client_id)
            .with_label(&credential.realm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(created_account: bool) -> ProvisionedCredential {
        ProvisionedCredential {
            realm: "acme".to_string(),
            user_id: "u1".to_string(),
            client_id: "0HZXEQ5Y8JY5Z".to_string(),
            token: "kp_x".to_string(),
            expires: 0,
            created_account,
            created_authorization: created_account,
        }
    }

    #[test]
    fn test_first_provisioning_event() {
        let event = UsageEvent::token_issued(&credential(true));
        assert_eq!(event.category, "provisioning");
        assert_eq!(event.action, "account_created");
        assert_eq!(event.label.as_deref(), Some("acme"));
        assert_eq!(event.client_id, "0HZXEQ5Y8JY5Z");
    }

    #[test]
    fn test_rotation_event() {
        let event = UsageEvent::token_issued(&credential(false));
        assert_eq!(event.action, "token_rotated");
    }
}
