/*
 * Responsibility
 * - セッションに入る identity (UserProfile) の DTO
 * - auth core は generic なので、この型を知るのは glue 層だけ
 */
use serde::{Deserialize, Serialize};

/// Identity stored in the session by the SSO strategy. Deserialized from the
/// provider's profile document; unknown providers that lack a role default to
/// plain "user".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_defaults_to_user_when_the_provider_omits_it() {
        let profile: UserProfile =
            serde_json::from_value(json!({"id": 7, "username": "kurab"})).unwrap();
        assert_eq!(profile.role, "user");
        assert_eq!(profile.email, None);
    }
}
