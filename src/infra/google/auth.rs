// =============================================================================
// GOOGLE API CREDENTIALS
// =============================================================================
//
// Every Google client receives an `AccessTokenProvider` instead of reaching
// for ambient credentials, so tests and deployments can swap the source.
//
// **Credential sources, in lookup order:**
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to a service account JSON key
// - `GOOGLE_SERVICE_ACCOUNT_JSON` - The JSON key content directly
// - `GOOGLE_ACCESS_TOKEN` - A pre-issued bearer token
//   (e.g. `gcloud auth print-access-token`)
//
// `GOOGLE_IMPERSONATE_SUBJECT` optionally sets the user a service account acts
// for (domain-wide delegation). The template, the output folder and the roster
// must be shared with whichever identity ends up calling the APIs.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::bibs::BibError;

/// Scopes needed to read the roster, edit the template copy and manage Drive files.
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/presentations",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
];

/// Source of bearer tokens for Google API calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, BibError>;
}

/// A token obtained out of band. Never refreshed.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, BibError> {
        Ok(self.token.clone())
    }
}

// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// The token URI (where to exchange JWT for access token).
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
    /// User to impersonate, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Cached access token with expiration.
struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    subject: Option<String>,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Creates a new authenticator from a JSON key file path.
    pub async fn from_file(path: &str) -> Result<Self, BibError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BibError::Auth(format!("Cannot read key file {}: {}", path, e)))?;
        Self::from_json(&content)
    }

    /// Creates a new authenticator from JSON content.
    pub fn from_json(json: &str) -> Result<Self, BibError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| BibError::Auth(format!("Invalid service account key: {}", e)))?;
        Ok(Self {
            credentials,
            subject: None,
            client: Client::new(),
            cached_token: RwLock::new(None),
        })
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    fn build_claims(&self, now: u64) -> JwtClaims {
        JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: GOOGLE_SCOPES.join(" "),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
            sub: self.subject.clone(),
        }
    }

    /// Fetches a new access token from Google.
    async fn fetch_new_token(&self) -> Result<TokenResponse, BibError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| BibError::Auth(e.to_string()))?
            .as_secs();

        let claims = self.build_claims(now);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| BibError::Auth(format!("Invalid private key: {}", e)))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| BibError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| BibError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BibError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BibError::Auth(e.to_string()))
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountAuth {
    /// Gets a valid access token, refreshing if necessary.
    async fn access_token(&self) -> Result<String, BibError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + Duration::from_secs(60) {
                    return Ok(token.token.clone());
                }
            }
        }

        let fresh = self.fetch_new_token().await?;
        tracing::debug!(
            account = %self.credentials.client_email,
            expires_in = fresh.expires_in,
            "Fetched Google access token"
        );

        let mut cached = self.cached_token.write().await;
        *cached = Some(CachedToken {
            token: fresh.access_token.clone(),
            expires_at: SystemTime::now() + Duration::from_secs(fresh.expires_in),
        });

        Ok(fresh.access_token)
    }
}

/// Picks a credential source from the process environment.
pub async fn token_provider_from_env() -> Result<Arc<dyn AccessTokenProvider>, BibError> {
    token_provider_from_lookup(|key| std::env::var(key).ok()).await
}

pub async fn token_provider_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn AccessTokenProvider>, BibError> {
    let subject = lookup("GOOGLE_IMPERSONATE_SUBJECT").filter(|s| !s.is_empty());

    if let Some(path) = lookup("GOOGLE_SERVICE_ACCOUNT_KEY").filter(|v| !v.is_empty()) {
        let auth = ServiceAccountAuth::from_file(&path).await?.with_subject(subject);
        tracing::info!("Using service account {}", auth.client_email());
        return Ok(Arc::new(auth));
    }

    if let Some(json) = lookup("GOOGLE_SERVICE_ACCOUNT_JSON").filter(|v| !v.is_empty()) {
        let auth = ServiceAccountAuth::from_json(&json)?.with_subject(subject);
        tracing::info!("Using service account {}", auth.client_email());
        return Ok(Arc::new(auth));
    }

    if let Some(token) = lookup("GOOGLE_ACCESS_TOKEN").filter(|t| !t.is_empty()) {
        tracing::info!("Using pre-issued Google access token");
        return Ok(Arc::new(StaticTokenProvider::new(token)));
    }

    Err(BibError::Auth(
        "Set GOOGLE_SERVICE_ACCOUNT_KEY, GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_ACCESS_TOKEN"
            .to_string(),
    ))
}
