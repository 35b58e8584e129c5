//! Authentication API client methods

use super::{ClientError, HrClient};
use hrdesk_core::{
    ActivationRequest, ActivationTokenStatus, LoginRequest, LoginResponse, MenuItem, MenuResponse,
    MessageResponse, RefreshRequest, RegisterRequest, RegistrationResponse, Token, User,
};
use reqwest::Method;

impl HrClient {
    /// Exchange credentials for a token pair
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let req = self.request(Method::POST, "/api/auth/login").json(request);
        self.execute(req).await
    }

    /// Submit a registration for admin approval
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegistrationResponse, ClientError> {
        let req = self.request(Method::POST, "/api/auth/register").json(request);
        self.execute(req).await
    }

    /// Ask the backend to send the activation email again
    pub async fn resend_activation_email(
        &self,
        email: &str,
    ) -> Result<MessageResponse, ClientError> {
        let req = self
            .request(Method::POST, "/api/auth/resend-activation")
            .query(&[("email", email)]);
        self.execute(req).await
    }

    /// Check an activation link token before showing the activation form
    pub async fn validate_activation_token(
        &self,
        token: &str,
    ) -> Result<ActivationTokenStatus, ClientError> {
        let req = self.request(
            Method::GET,
            &format!("/api/auth/validate-activation-token/{token}"),
        );
        self.execute(req).await
    }

    /// Choose a username and password for an approved account
    pub async fn activate_account(
        &self,
        request: &ActivationRequest,
    ) -> Result<MessageResponse, ClientError> {
        let req = self.request(Method::POST, "/api/auth/activate").json(request);
        self.execute(req).await
    }

    /// Mint a new token pair
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<Token, ClientError> {
        let req = self.request(Method::POST, "/api/auth/refresh").json(request);
        self.execute(req).await
    }

    /// Invalidate the session server-side
    pub async fn logout(&self) -> Result<(), ClientError> {
        let req = self
            .request(Method::POST, "/api/auth/logout")
            .json(&serde_json::json!({}));
        self.execute_empty(req).await
    }

    /// Profile of the signed-in user
    pub async fn me(&self) -> Result<User, ClientError> {
        let req = self.request(Method::GET, "/api/auth/me");
        self.execute(req).await
    }

    /// Navigation menu for the signed-in user
    pub async fn menu(&self) -> Result<Vec<MenuItem>, ClientError> {
        let req = self.request(Method::GET, "/api/auth/me/menu");
        let response: MenuResponse = self.execute(req).await?;
        Ok(response.menu)
    }
}
