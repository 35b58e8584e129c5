//! Profile client methods

use super::{ClientError, HrClient};
use hrdesk_core::ProfileUpdateRequest;
use reqwest::Method;

impl HrClient {
    /// Update the self-service part of a user's profile
    pub async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdateRequest,
    ) -> Result<(), ClientError> {
        let req = self
            .request(Method::PATCH, &format!("/api/users/{user_id}/profile"))
            .json(update);
        self.execute_empty(req).await
    }
}
