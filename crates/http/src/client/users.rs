//! Users administration client methods

use super::{ClientError, HrClient};
use hrdesk_core::{Page, UserDetails, UserStats, UserSummary};
use reqwest::Method;
use serde_json::Value;

/// Query for the paginated users list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub page: u32,
    pub size: u32,
    pub search: Option<String>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            search: None,
        }
    }
}

impl UserQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        params
    }
}

impl HrClient {
    /// List users with pagination and optional search
    pub async fn list_users(&self, query: &UserQuery) -> Result<Page<UserSummary>, ClientError> {
        let req = self.request(Method::GET, "/api/users").query(&query.params());
        self.execute(req).await
    }

    /// Get a user's full record
    pub async fn get_user(&self, id: i64) -> Result<UserDetails, ClientError> {
        let req = self.request(Method::GET, &format!("/api/users/{id}"));
        self.execute(req).await
    }

    /// Replace the editable fields of a user; `changes` is a partial record
    pub async fn update_user(&self, id: i64, changes: &Value) -> Result<UserDetails, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/api/users/{id}"))
            .json(changes);
        self.execute(req).await
    }

    /// Account counts by status
    pub async fn user_stats(&self) -> Result<UserStats, ClientError> {
        let req = self.request(Method::GET, "/api/users/stats");
        self.execute(req).await
    }

    pub async fn disable_user(&self, id: i64) -> Result<(), ClientError> {
        self.user_action(&format!("/api/users/{id}/disable")).await
    }

    pub async fn enable_user(&self, id: i64) -> Result<(), ClientError> {
        self.user_action(&format!("/api/users/{id}/enable")).await
    }

    /// Trigger a password reset email for the user
    pub async fn reset_password(&self, id: i64) -> Result<(), ClientError> {
        self.user_action(&format!("/api/users/{id}/reset-password"))
            .await
    }

    /// Approve a pending registration
    pub async fn approve_registration(&self, id: i64) -> Result<(), ClientError> {
        self.user_action(&format!("/api/auth/approve-registration/{id}"))
            .await
    }

    /// Reject a pending registration
    pub async fn reject_registration(&self, id: i64) -> Result<(), ClientError> {
        self.user_action(&format!("/api/auth/reject-registration/{id}"))
            .await
    }

    async fn user_action(&self, path: &str) -> Result<(), ClientError> {
        let req = self
            .request(Method::POST, path)
            .json(&serde_json::json!({}));
        self.execute_empty(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_is_not_sent() {
        let query = UserQuery {
            search: Some(String::new()),
            ..UserQuery::default()
        };
        assert_eq!(
            query.params(),
            vec![("page", "0".to_string()), ("size", "10".to_string())]
        );
    }
}
