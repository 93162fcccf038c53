//! The admin session gate.
//!
//! Two states exist per browser: anonymous and authenticated. `login` moves a
//! browser to authenticated after the caller has verified credentials;
//! expiry, a failed hijack check, or `logout` move it back.
//!
//! A session counts as authenticated when it is non-empty, flagged logged in,
//! has a username, and its `login_time` is within the session lifetime. When
//! the session recorded an auth token and user-agent at login, the request
//! must also present the matching auth-check cookie from the same
//! user-agent. Failing that, the session is destroyed.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::cookie::SetCookie;
use crate::credentials;
use crate::error::Result;
use crate::hijack::{derive_auth_check_value, generate_token, verify_auth_check};
use crate::session::{SessionData, SessionId};
use crate::store::SessionStore;

/// What the gate needs to know about the current request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Id from the session cookie, if it was well formed
    pub session_id: Option<SessionId>,
    /// Value of the auth-check cookie
    pub auth_check: Option<String>,
    /// `User-Agent` header, empty when absent
    pub user_agent: String,
    pub ip_address: Option<String>,
    /// Path and query of the request, used to build return URLs
    pub request_uri: String,
    pub is_https: bool,
}

impl RequestContext {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            request_uri: "/".to_string(),
            ..Self::default()
        }
    }

    /// Picks the gate's cookies out of a parsed `Cookie` header.
    pub fn with_cookies(mut self, cookies: &HashMap<String, String>, config: &AuthConfig) -> Self {
        self.session_id = cookies
            .get(&config.session_cookie_name)
            .and_then(|raw| SessionId::parse(raw));
        self.auth_check = cookies
            .get(&config.auth_check_cookie_name)
            .filter(|v| !v.is_empty())
            .cloned();
        self
    }

    pub fn with_session_id(mut self, id: SessionId) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn with_auth_check(mut self, value: impl Into<String>) -> Self {
        self.auth_check = Some(value.into());
        self
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn with_request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = uri.into();
        self
    }

    pub fn with_https(mut self, is_https: bool) -> Self {
        self.is_https = is_https;
        self
    }
}

/// Why a request is anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousReason {
    /// No session cookie, or the id is unknown/empty
    NoSession,
    /// Session exists but holds no login
    NotLoggedIn,
    /// `login_time` older than the session lifetime
    Expired,
    /// Auth-check cookie or user-agent mismatch
    Hijacked,
    /// The session store failed; treated as anonymous
    StoreUnavailable,
}

impl AnonymousReason {
    /// Whether the gate destroyed the server-side session.
    pub fn destroyed_session(&self) -> bool {
        matches!(self, Self::Expired | Self::Hijacked)
    }
}

/// Result of checking a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated(SessionData),
    Anonymous(AnonymousReason),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn session(&self) -> Option<&SessionData> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Anonymous(_) => None,
        }
    }
}

/// A freshly established admin session.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub session_id: SessionId,
    pub cookies: Vec<SetCookie>,
}

/// Outcome of guarding an admin route.
#[derive(Debug, Clone)]
pub enum GateDecision {
    Granted(SessionData),
    Denied(Denial),
}

/// An unauthenticated admin request, and how to turn it away.
#[derive(Debug, Clone)]
pub struct Denial {
    pub reason: AnonymousReason,
    pub response: DenialResponse,
    pub cookies: Vec<SetCookie>,
}

/// The response shape for a denied admin request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialResponse {
    /// XHR callers get `{success:false, logged_in:false, redirect}`.
    Json { redirect: String },
    /// Browsers are sent home with the login prompt flagged.
    Redirect { location: String },
}

/// Gates admin access behind the configured credentials and a server-side
/// session.
#[derive(Clone)]
pub struct SessionAuthGate {
    config: Arc<AuthConfig>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SessionAuthGate {
    pub fn new(config: AuthConfig, store: Arc<dyn SessionStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: AuthConfig,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            clock,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Checks a username/password pair against the configured admin.
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        credentials::verify_admin(
            username,
            password,
            &self.config.admin_username,
            &self.config.admin_password_hash,
        )
    }

    /// Establishes an authenticated session for `username`.
    ///
    /// The caller must have verified the credentials. Any existing session is
    /// discarded and a new id is issued before the login is recorded.
    pub async fn login(&self, ctx: &RequestContext, username: &str) -> Result<LoginGrant> {
        let now = self.clock.now();
        let auth_token = generate_token();
        let check_value = derive_auth_check_value(&auth_token, &ctx.user_agent);

        let data = SessionData::authenticated(
            username,
            now,
            ctx.ip_address.clone(),
            ctx.user_agent.clone(),
            auth_token,
        );

        let session_id = self.store.regenerate_id(ctx.session_id.as_ref()).await?;
        self.store.set(&session_id, data).await?;

        let secure = self.config.secure_cookies(ctx.is_https);
        let cookies = vec![
            self.live_cookie(&self.config.session_cookie_name, session_id.as_str(), secure),
            self.live_cookie(&self.config.auth_check_cookie_name, &check_value, secure),
        ];

        info!(username = %username, ip = ?ctx.ip_address, "Admin logged in");

        Ok(LoginGrant {
            session_id,
            cookies,
        })
    }

    /// Checks whether the request carries a valid admin session.
    ///
    /// Expired or hijacked sessions are destroyed. A valid session whose
    /// `login_time` is older than the update interval is slid forward.
    pub async fn is_authenticated(&self, ctx: &RequestContext) -> AuthState {
        let Some(id) = &ctx.session_id else {
            return AuthState::Anonymous(AnonymousReason::NoSession);
        };

        let mut data = match self.store.get(id).await {
            Ok(Some(data)) if !data.is_empty() => data,
            Ok(_) => return AuthState::Anonymous(AnonymousReason::NoSession),
            Err(e) => {
                error!(error = %e, "Session store unavailable during auth check");
                return AuthState::Anonymous(AnonymousReason::StoreUnavailable);
            }
        };

        let Some(login_time) = data.login_time else {
            return AuthState::Anonymous(AnonymousReason::NotLoggedIn);
        };

        let now = self.clock.now();
        if now - login_time > self.config.session_lifetime() {
            info!(username = %data.username, "Admin session expired");
            self.destroy_quietly(id).await;
            return AuthState::Anonymous(AnonymousReason::Expired);
        }

        if !data.user_logged_in || data.username.is_empty() {
            return AuthState::Anonymous(AnonymousReason::NotLoggedIn);
        }

        if data.has_binding() && !self.binding_matches(&data, ctx) {
            warn!(
                username = %data.username,
                ip = ?ctx.ip_address,
                "Session failed hijack check, destroying"
            );
            self.destroy_quietly(id).await;
            return AuthState::Anonymous(AnonymousReason::Hijacked);
        }

        if now - login_time > self.config.session_update_interval() {
            data.login_time = Some(now);
            if let Err(e) = self.store.set(id, data.clone()).await {
                warn!(error = %e, "Failed to persist session renewal");
            } else {
                debug!(username = %data.username, "Renewed admin session");
            }
        }

        AuthState::Authenticated(data)
    }

    /// Guards an admin route.
    ///
    /// On success the session's `last_activity` is refreshed. Otherwise any
    /// remaining session is destroyed and the caller is told how to respond.
    pub async fn require_authenticated(&self, ctx: &RequestContext, is_ajax: bool) -> GateDecision {
        match self.is_authenticated(ctx).await {
            AuthState::Authenticated(mut session) => {
                session.last_activity = Some(self.clock.now());
                if let Some(id) = &ctx.session_id {
                    if let Err(e) = self.store.set(id, session.clone()).await {
                        warn!(error = %e, "Failed to record admin activity");
                    }
                }
                GateDecision::Granted(session)
            }
            AuthState::Anonymous(reason) => {
                debug!(?reason, is_ajax, uri = %ctx.request_uri, "Admin route denied");

                if let Some(id) = &ctx.session_id {
                    if !reason.destroyed_session() {
                        self.destroy_quietly(id).await;
                    }
                }

                let secure = self.config.secure_cookies(ctx.is_https);

                if is_ajax {
                    return GateDecision::Denied(Denial {
                        reason,
                        response: DenialResponse::Json {
                            redirect: self.login_url(None),
                        },
                        cookies: self.expired_cookies(secure),
                    });
                }

                let cookies = match self.start_login_prompt().await {
                    Ok(prompt_id) => vec![
                        self.live_cookie(&self.config.session_cookie_name, prompt_id.as_str(), secure),
                        self.expired_cookie(&self.config.auth_check_cookie_name, secure),
                    ],
                    Err(e) => {
                        warn!(error = %e, "Could not flag login prompt");
                        self.expired_cookies(secure)
                    }
                };

                GateDecision::Denied(Denial {
                    reason,
                    response: DenialResponse::Redirect {
                        location: self.login_url(Some(&ctx.request_uri)),
                    },
                    cookies,
                })
            }
        }
    }

    /// Ends the session and returns the cookies that clear it client-side.
    ///
    /// Safe to call repeatedly or without a session.
    pub async fn logout(&self, ctx: &RequestContext) -> Vec<SetCookie> {
        if let Some(id) = &ctx.session_id {
            if let Ok(Some(data)) = self.store.get(id).await {
                if data.user_logged_in {
                    info!(username = %data.username, "Admin logged out");
                }
            }
            self.destroy_quietly(id).await;
        }

        let secure = self.config.secure_cookies(ctx.is_https);
        let mut cookies = self.expired_cookies(secure);

        // Also clear copies that may have been set with default attributes.
        if self.config.cookie_path != "/" || self.config.cookie_domain.is_some() {
            for name in [
                &self.config.session_cookie_name,
                &self.config.auth_check_cookie_name,
            ] {
                let mut cookie = self.expired_cookie(name, secure);
                cookie.path = "/".to_string();
                cookie.domain = None;
                cookies.push(cookie);
            }
        }

        cookies
    }

    /// Reads and clears the login-prompt flash flag.
    pub async fn take_login_prompt(&self, ctx: &RequestContext) -> bool {
        let Some(id) = &ctx.session_id else {
            return false;
        };

        let mut data = match self.store.get(id).await {
            Ok(Some(data)) if data.show_login_modal => data,
            Ok(_) => return false,
            Err(e) => {
                warn!(error = %e, "Session store unavailable reading login prompt");
                return false;
            }
        };

        data.show_login_modal = false;
        let cleared = if data.is_empty() {
            self.store.destroy(id).await
        } else {
            self.store.set(id, data).await
        };
        if let Err(e) = cleared {
            warn!(error = %e, "Failed to clear login prompt flag");
        }
        true
    }

    /// Cookies that drop the session and auth-check cookies for this request.
    pub fn clear_cookies(&self, ctx: &RequestContext) -> Vec<SetCookie> {
        self.expired_cookies(self.config.secure_cookies(ctx.is_https))
    }

    /// Home URL that opens the login prompt, optionally returning to `uri`.
    pub fn login_url(&self, return_to: Option<&str>) -> String {
        let mut url = format!("{}?login=required", self.config.home_path);
        if let Some(uri) = return_to {
            let encoded: String = url::form_urlencoded::byte_serialize(uri.as_bytes()).collect();
            url.push_str("&return=");
            url.push_str(&encoded);
        }
        url
    }

    async fn start_login_prompt(&self) -> Result<SessionId> {
        let id = self.store.regenerate_id(None).await?;
        self.store.set(&id, SessionData::login_prompt()).await?;
        Ok(id)
    }

    fn binding_matches(&self, data: &SessionData, ctx: &RequestContext) -> bool {
        let (Some(token), Some(agent)) = (&data.auth_token, &data.user_agent) else {
            return false;
        };

        let cookie_ok = ctx
            .auth_check
            .as_deref()
            .is_some_and(|presented| verify_auth_check(presented, token, &ctx.user_agent));

        cookie_ok && *agent == ctx.user_agent
    }

    async fn destroy_quietly(&self, id: &SessionId) {
        if let Err(e) = self.store.destroy(id).await {
            error!(error = %e, "Failed to destroy session");
        }
    }

    fn live_cookie(&self, name: &str, value: &str, secure: bool) -> SetCookie {
        SetCookie {
            name: name.to_string(),
            value: value.to_string(),
            max_age: Some(self.config.cookie_lifetime()),
            path: self.config.cookie_path.clone(),
            domain: self.config.cookie_domain.clone(),
            secure,
            http_only: true,
            same_site: self.config.cookie_same_site,
        }
    }

    fn expired_cookie(&self, name: &str, secure: bool) -> SetCookie {
        SetCookie {
            max_age: None,
            ..self.live_cookie(name, "", secure)
        }
    }

    fn expired_cookies(&self, secure: bool) -> Vec<SetCookie> {
        vec![
            self.expired_cookie(&self.config.session_cookie_name, secure),
            self.expired_cookie(&self.config.auth_check_cookie_name, secure),
        ]
    }
}
