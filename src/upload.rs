//! YouTube upload client: OAuth2 (installed-app flow) plus the resumable
//! videos.insert endpoint and thumbnails.set.
//!
//! The one-time interactive authorization exchanges an authorization code for
//! a refresh token and persists it to a credentials file; every later run
//! refreshes an access token from it non-interactively.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::contract::{UploadError, UploadRequest, VideoUploader};

pub const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const VIDEOS_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";
const THUMBNAILS_SET_URL: &str = "https://www.googleapis.com/upload/youtube/v3/thumbnails/set";
// Manual flow: the user pastes the code Google shows after consent.
const REDIRECT_URI: &str = "http://localhost";

/// Where credential files live and how uploads are classified.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub client_secrets_file: PathBuf,
    pub credentials_file: PathBuf,
    /// "public", "private" or "unlisted".
    pub privacy: String,
    /// YouTube category id; "28" is Science & Technology.
    pub category_id: String,
}

/// client_secrets.json as downloaded from the Google Cloud console.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: ClientSecrets,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
}

/// Persisted credentials, shaped after the authorized-user file the Google
/// client libraries write, so an existing credentials.json keeps working.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct InsertResponse {
    id: String,
}

pub struct YouTubeClient {
    client: reqwest::Client,
    settings: UploadSettings,
}

/// Consent URL for the installed-app authorization flow.
fn consent_url(client_id: &str) -> String {
    format!(
        "{AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        urlencoding::encode(client_id),
        urlencoding::encode(REDIRECT_URI),
        urlencoding::encode(UPLOAD_SCOPE),
    )
}

/// Request body for videos.insert: snippet metadata plus privacy status.
fn insert_body(req: &UploadRequest<'_>, privacy: &str, category_id: &str) -> serde_json::Value {
    let tags: Vec<String> = req
        .tags
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    serde_json::json!({
        "snippet": {
            "title": req.title,
            "description": req.description,
            "tags": tags,
            "categoryId": category_id,
        },
        "status": {
            "privacyStatus": privacy,
            "selfDeclaredMadeForKids": false,
        },
    })
}

impl YouTubeClient {
    pub fn new(settings: UploadSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn load_client_secrets(&self) -> Result<ClientSecrets, UploadError> {
        let path = &self.settings.client_secrets_file;
        if !path.exists() {
            return Err(format!(
                "{:?} not found. Download it from the Google Cloud console.",
                path
            )
            .into());
        }
        let raw = std::fs::read_to_string(path)?;
        let parsed: ClientSecretsFile = serde_json::from_str(&raw)
            .map_err(|e| format!("invalid client secrets file {:?}: {e}", path))?;
        Ok(parsed.installed)
    }

    fn load_credentials(&self) -> Result<StoredCredentials, UploadError> {
        let path = &self.settings.credentials_file;
        if !path.exists() {
            return Err(format!(
                "{:?} not found. Run the `authorize` subcommand once to create it.",
                path
            )
            .into());
        }
        let raw = std::fs::read_to_string(path)?;
        let creds: StoredCredentials = serde_json::from_str(&raw)
            .map_err(|e| format!("invalid credentials file {:?}: {e}", path))?;
        Ok(creds)
    }

    /// One-time interactive flow: print the consent URL, read the pasted
    /// authorization code from stdin, exchange it and persist the refresh
    /// token for all future runs.
    pub async fn authorize(&self) -> Result<(), UploadError> {
        let secrets = self.load_client_secrets()?;
        println!("Open this URL in your browser and grant access:\n");
        println!("{}\n", consent_url(&secrets.client_id));
        println!("Paste the authorization code here and press enter:");

        let mut code = String::new();
        std::io::stdin().read_line(&mut code)?;
        let code = code.trim();
        if code.is_empty() {
            return Err("no authorization code entered".into());
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", REDIRECT_URI),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("code exchange failed (status {status}): {text}").into());
        }
        let token: TokenResponse = response.json().await?;
        let refresh_token = token
            .refresh_token
            .ok_or("authorization response carried no refresh token")?;

        let creds = StoredCredentials {
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            refresh_token,
            scopes: vec![UPLOAD_SCOPE.to_string()],
        };
        std::fs::write(
            &self.settings.credentials_file,
            serde_json::to_string_pretty(&creds)?,
        )?;
        info!(path = ?self.settings.credentials_file, "Credentials saved");
        Ok(())
    }

    /// Mint a fresh access token from the stored refresh token.
    async fn access_token(&self) -> Result<String, UploadError> {
        let creds = self.load_credentials()?;
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("refresh_token", creds.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, "Token refresh failed: {text}");
            return Err(format!("token refresh failed (status {status}): {text}").into());
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn set_thumbnail(
        &self,
        access_token: &str,
        video_id: &str,
        thumbnail: &Path,
    ) -> Result<(), UploadError> {
        let bytes = std::fs::read(thumbnail)?;
        let response = self
            .client
            .post(THUMBNAILS_SET_URL)
            .query(&[("videoId", video_id), ("uploadType", "media")])
            .bearer_auth(access_token)
            .header("Content-Type", "image/png")
            .body(bytes)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("thumbnails.set failed (status {status}): {text}").into());
        }
        Ok(())
    }
}

#[async_trait]
impl VideoUploader for YouTubeClient {
    async fn upload<'a>(&self, req: UploadRequest<'a>) -> Result<String, UploadError> {
        info!(video = ?req.video_path, title = req.title, "Uploading video");
        let access_token = self.access_token().await?;

        let body = insert_body(&req, &self.settings.privacy, &self.settings.category_id);
        let video_bytes = std::fs::read(req.video_path)?;

        // Start a resumable session; the Location header names the session URI.
        let start = self
            .client
            .post(VIDEOS_UPLOAD_URL)
            .bearer_auth(&access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", video_bytes.len())
            .json(&body)
            .send()
            .await?;
        let status = start.status();
        if !status.is_success() {
            let text = start.text().await.unwrap_or_default();
            error!(status = %status, "Resumable session init failed: {text}");
            return Err(format!("upload session init failed (status {status}): {text}").into());
        }
        let session_uri = start
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .ok_or("upload session response carried no Location header")?
            .to_string();

        let upload = self
            .client
            .put(&session_uri)
            .bearer_auth(&access_token)
            .header("Content-Type", "video/mp4")
            .body(video_bytes)
            .send()
            .await?;
        let status = upload.status();
        if !status.is_success() {
            let text = upload.text().await.unwrap_or_default();
            error!(status = %status, "Video byte upload failed: {text}");
            return Err(format!("video upload failed (status {status}): {text}").into());
        }
        let inserted: InsertResponse = upload.json().await?;
        info!(video_id = %inserted.id, "Video uploaded");

        // A failed thumbnail never fails the upload itself.
        match req.thumbnail_path {
            Some(thumb) if thumb.exists() => {
                if let Err(e) = self.set_thumbnail(&access_token, &inserted.id, thumb).await {
                    error!(error = %e, video_id = %inserted.id, "Failed to upload thumbnail");
                } else {
                    info!(video_id = %inserted.id, "Thumbnail uploaded");
                }
            }
            _ => warn!("No thumbnail provided or file missing, skipping thumbnail upload"),
        }

        Ok(inserted.id)
    }
}
