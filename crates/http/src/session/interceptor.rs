//! Bearer token attachment and rejection recovery

use super::token_service::TokenService;
use crate::client::interceptor::{Interceptor, is_auth_endpoint};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, StatusCode, Url};
use std::sync::Arc;
use tracing::{debug, warn};

/// Route of the login screen
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Moves the front end to another route
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Attaches the session token and drops it when the backend rejects it
pub struct TokenInterceptor {
    tokens: Arc<TokenService>,
    navigator: Arc<dyn Navigator>,
    base_url: Option<Url>,
}

impl TokenInterceptor {
    /// `base_url` limits where the token is sent; `None` sends it everywhere
    pub fn new(
        tokens: Arc<TokenService>,
        navigator: Arc<dyn Navigator>,
        base_url: Option<Url>,
    ) -> Self {
        Self {
            tokens,
            navigator,
            base_url,
        }
    }

    fn is_trusted(&self, url: &Url) -> bool {
        let Some(base) = &self.base_url else {
            return true;
        };
        if url.origin() != base.origin() {
            return false;
        }
        // Whole segments only: `/apix` is not under `/api`
        let base_path = base.path().trim_end_matches('/');
        let path = url.path();
        base_path.is_empty()
            || path == base_path
            || path
                .strip_prefix(base_path)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl Interceptor for TokenInterceptor {
    fn on_request(&self, request: &mut Request) {
        let url = request.url();
        if is_auth_endpoint(url.path()) {
            return;
        }
        if !self.is_trusted(url) {
            debug!(url = %url, "foreign host, token withheld");
            return;
        }

        let Some(bearer) = self.tokens.bearer_token() else {
            return;
        };
        match HeaderValue::from_str(&bearer) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(err) => warn!(error = %err, "token is not a valid header value"),
        }
    }

    fn on_error_status(&self, url: &Url, status: StatusCode) {
        if is_auth_endpoint(url.path()) {
            return;
        }
        if !matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return;
        }

        warn!(url = %url, status = status.as_u16(), "token rejected, signing out");
        if let Err(err) = self.tokens.clear() {
            warn!(error = %err, "failed to clear rejected token");
        }
        self.navigator.navigate(LOGIN_ROUTE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrdesk_core::{MemoryStorage, Token};

    fn tokens_with(access: &str) -> Arc<TokenService> {
        let tokens = Arc::new(TokenService::new(Arc::new(MemoryStorage::new()), 5));
        tokens.set(Token::new(access)).unwrap();
        tokens
    }

    fn interceptor(tokens: Arc<TokenService>, navigator: MockNavigator) -> TokenInterceptor {
        TokenInterceptor::new(
            tokens,
            Arc::new(navigator),
            Some(Url::parse("http://hr.local:8080").unwrap()),
        )
    }

    fn get(url: &str) -> Request {
        Request::new(reqwest::Method::GET, Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn attaches_bearer_to_api_calls() {
        let interceptor = interceptor(tokens_with("abc"), MockNavigator::new());
        let mut request = get("http://hr.local:8080/api/users");
        interceptor.on_request(&mut request);

        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer abc"
        );
    }

    #[tokio::test]
    async fn skips_auth_endpoints_and_foreign_hosts() {
        let interceptor = interceptor(tokens_with("abc"), MockNavigator::new());

        for url in [
            "http://hr.local:8080/api/auth/login",
            "http://hr.local:8080/api/auth/register",
            "http://hr.local:8080/api/auth/activate",
            "http://hr.local:8080/api/auth/validate-activation-token/t",
            "http://evil.example.com/api/users",
        ] {
            let mut request = get(url);
            interceptor.on_request(&mut request);
            assert!(request.headers().get(AUTHORIZATION).is_none(), "{url}");
        }
    }

    #[tokio::test]
    async fn rejection_clears_token_and_navigates() {
        let tokens = tokens_with("abc");
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|route| route == LOGIN_ROUTE)
            .times(2)
            .return_const(());

        let interceptor = interceptor(tokens.clone(), navigator);
        let url = Url::parse("http://hr.local:8080/api/users").unwrap();

        interceptor.on_error_status(&url, StatusCode::UNAUTHORIZED);
        assert!(tokens.token().is_none());

        tokens.set(Token::new("def")).unwrap();
        interceptor.on_error_status(&url, StatusCode::FORBIDDEN);
        assert!(tokens.token().is_none());
    }

    #[tokio::test]
    async fn other_failures_leave_token_alone() {
        let tokens = tokens_with("abc");
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().never();

        let interceptor = interceptor(tokens.clone(), navigator);
        let users = Url::parse("http://hr.local:8080/api/users").unwrap();
        interceptor.on_error_status(&users, StatusCode::INTERNAL_SERVER_ERROR);
        interceptor.on_error_status(&users, StatusCode::NOT_FOUND);

        let login = Url::parse("http://hr.local:8080/api/auth/login").unwrap();
        interceptor.on_error_status(&login, StatusCode::UNAUTHORIZED);

        assert!(tokens.token().is_some());
    }

    #[tokio::test]
    async fn base_path_matches_whole_segments() {
        let interceptor = TokenInterceptor::new(
            tokens_with("abc"),
            Arc::new(MockNavigator::new()),
            Some(Url::parse("http://hr.local:8080/api/").unwrap()),
        );

        for (url, trusted) in [
            ("http://hr.local:8080/api", true),
            ("http://hr.local:8080/api/users", true),
            ("http://hr.local:8080/apix/users", false),
            ("http://hr.local:8080/ap", false),
            ("http://hr.local:8080/", false),
        ] {
            let mut request = get(url);
            interceptor.on_request(&mut request);
            assert_eq!(request.headers().contains_key(AUTHORIZATION), trusted, "{url}");
        }
    }
}
