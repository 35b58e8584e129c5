use crate::Token;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Profile of the signed-in user as returned by `/api/auth/me`.
///
/// Fields the console does not know about are kept in `extra` so a partial
/// update never drops data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl User {
    /// "First Last", or the email when no name is known
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => self.email.clone().unwrap_or_default(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Apply the non-empty fields of a profile update
    pub fn apply_profile(&mut self, update: &ProfileUpdateRequest) {
        if let Some(value) = &update.first_name {
            self.first_name = Some(value.clone());
        }
        if let Some(value) = &update.last_name {
            self.last_name = Some(value.clone());
        }
        if let Some(value) = &update.phone {
            self.phone = Some(value.clone());
        }
        if let Some(value) = &update.address {
            self.address = Some(value.clone());
        }
        if let Some(value) = &update.marital_status {
            self.marital_status = Some(value.clone());
        }
        if let Some(value) = &update.description {
            self.extra
                .insert("description".to_string(), JsonValue::String(value.clone()));
        }
    }
}

/// Body returned by `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: Token,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Row of the users list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub registration_pending: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "default_true")]
    pub account_non_locked: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Pending,
    Active,
    Disabled,
    Locked,
}

impl UserSummary {
    /// Status badge derived from the account flags
    pub fn status(&self) -> UserStatus {
        if self.registration_pending {
            UserStatus::Pending
        } else if !self.account_non_locked {
            UserStatus::Locked
        } else if !self.enabled || !self.active {
            UserStatus::Disabled
        } else {
            UserStatus::Active
        }
    }
}

/// Full user record from `GET /api/users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(flatten)]
    pub summary: UserSummary,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_login: Option<NaiveDateTime>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub contract_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

/// Spring-style page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub pending: u64,
    pub active: u64,
    pub disabled: u64,
    pub locked: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractType {
    Cdi,
    Cdd,
    Internship,
    Ctp,
    Ctt,
    Stage,
    Alternance,
    Sivp,
    Mission,
    Freelance,
    Essai,
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub national_id: String,
    pub nationality: String,
    pub marital_status: MaritalStatus,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub hire_date: NaiveDate,
    pub contract_type: ContractType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_end_date: Option<NaiveDate>,
    pub base_salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housing_allowance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_security_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_project_manager_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_manager_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    pub enabled: bool,
    pub message: String,
    pub activation_email_sent: bool,
}

/// Body of `POST /api/auth/activate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRequest {
    pub token: String,
    pub username: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ActivationRequest {
    /// The backend wants the password twice
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            token: token.into(),
            username: username.into(),
            confirm_password: password.clone(),
            new_password: password,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationTokenStatus {
    pub valid: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `PATCH /api/users/{id}/profile`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProfileUpdateRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Generic `{ "message": ... }` acknowledgement; other fields are kept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Navigation entry from `/api/auth/me/menu`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub route: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub children: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuResponse {
    #[serde(default)]
    pub menu: Vec<MenuItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_keeps_unknown_fields() {
        let user: User = serde_json::from_value(json!({
            "id": 7,
            "firstName": "Amira",
            "lastName": "Ben Salah",
            "roles": ["ADMIN"],
            "badgeNumber": "B-19"
        }))
        .unwrap();

        assert_eq!(user.display_name(), "Amira Ben Salah");
        assert!(user.has_role("admin"));
        assert_eq!(user.extra["badgeNumber"], "B-19");
    }

    #[test]
    fn profile_update_merges_into_user() {
        let mut user = User {
            first_name: Some("Old".into()),
            phone: Some("111".into()),
            ..User::default()
        };
        let update = ProfileUpdateRequest {
            first_name: Some("New".into()),
            description: Some("HR lead".into()),
            ..ProfileUpdateRequest::default()
        };

        user.apply_profile(&update);
        assert_eq!(user.first_name.as_deref(), Some("New"));
        assert_eq!(user.phone.as_deref(), Some("111"));
        assert_eq!(user.extra["description"], "HR lead");
    }

    #[test]
    fn login_response_splits_token_and_user() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "abc",
            "tokenType": "Bearer",
            "expiresIn": 3600,
            "user": { "id": 1, "email": "a@b.c" }
        }))
        .unwrap();

        assert_eq!(response.token.access_token, "abc");
        assert_eq!(response.user.unwrap().email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn summary_status_prefers_pending_then_locked() {
        let mut summary: UserSummary = serde_json::from_value(json!({
            "id": 3,
            "firstName": "A",
            "lastName": "B",
            "email": "a@b.c",
            "enabled": true,
            "active": true,
            "accountNonLocked": true
        }))
        .unwrap();
        assert_eq!(summary.status(), UserStatus::Active);

        summary.account_non_locked = false;
        assert_eq!(summary.status(), UserStatus::Locked);

        summary.registration_pending = true;
        assert_eq!(summary.status(), UserStatus::Pending);
    }

    #[test]
    fn activation_request_repeats_password() {
        let request = ActivationRequest::new("tok", "amira", "s3cret!");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["newPassword"], "s3cret!");
        assert_eq!(body["confirmPassword"], "s3cret!");
    }

    #[test]
    fn register_request_uses_backend_enum_names() {
        let body = serde_json::to_value(ContractType::Cdi).unwrap();
        assert_eq!(body, "CDI");
        let body = serde_json::to_value(MaritalStatus::Married).unwrap();
        assert_eq!(body, "MARRIED");
    }
}
