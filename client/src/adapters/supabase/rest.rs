//! Supabase REST and auth client
//!
//! Posts and profiles are read through PostgREST (`/rest/v1`), sign-out goes
//! to GoTrue (`/auth/v1/logout`).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;

use crate::domain::entities::{Post, Profile, UserId};
use crate::domain::ports::{AuthGateway, PostRepository, ProfileRepository};
use crate::error::BackendError;

/// Accept header asking PostgREST for a single object instead of an array
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Implementation of the backend ports on top of Supabase
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    posts_table: String,
    users_table: String,
}

impl SupabaseClient {
    pub fn new(
        base_url: &str,
        anon_key: &str,
        access_token: &str,
        posts_table: &str,
        users_table: &str,
    ) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(anon_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", access_token))?,
        );

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            posts_table: posts_table.to_string(),
            users_table: users_table.to_string(),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    /// PostgREST `select` for posts with their author embedded as `user`
    fn posts_select(&self) -> String {
        format!("*,user:{}(id,name,image)", self.users_table)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| BackendError::Deserialization(e.to_string()))
        } else {
            Err(error_for_status(status.as_u16(), response.text().await.unwrap_or_default()))
        }
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), BackendError> {
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(error_for_status(status.as_u16(), response.text().await.unwrap_or_default()))
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue, BackendError> {
    HeaderValue::from_str(value).map_err(|_| BackendError::Api {
        status: 0,
        message: "credential contains characters not allowed in a header".to_string(),
    })
}

fn error_for_status(status: u16, message: String) -> BackendError {
    match status {
        401 | 403 => BackendError::Unauthorized,
        // PostgREST answers 406 when a single-object request matched no row
        404 | 406 => BackendError::NotFound(message),
        429 => BackendError::RateLimited,
        _ => BackendError::Api { status, message },
    }
}

#[async_trait]
impl PostRepository for SupabaseClient {
    async fn fetch_posts(&self, limit: usize) -> Result<Vec<Post>, BackendError> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(self.rest_url(&self.posts_table))
            .query(&[
                ("select", self.posts_select().as_str()),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl ProfileRepository for SupabaseClient {
    async fn get_user_data(&self, user_id: &UserId) -> Result<Profile, BackendError> {
        let filter = format!("eq.{}", user_id);
        let response = self
            .http
            .get(self.rest_url(&self.users_table))
            .query(&[("select", "*"), ("id", filter.as_str())])
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl AuthGateway for SupabaseClient {
    async fn sign_out(&self) -> Result<(), BackendError> {
        let response = self.http.post(self.auth_url("/logout")).send().await?;
        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response and hand back the request head
    async fn serve_once(status_line: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn client(base_url: &str) -> SupabaseClient {
        SupabaseClient::new(base_url, "anon-key", "access-token", "posts", "users").unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client("https://project.supabase.co/");
        assert_eq!(
            client.rest_url("posts"),
            "https://project.supabase.co/rest/v1/posts"
        );
        assert_eq!(
            client.auth_url("/logout"),
            "https://project.supabase.co/auth/v1/logout"
        );
        assert_eq!(client.posts_select(), "*,user:users(id,name,image)");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(error_for_status(401, String::new()), BackendError::Unauthorized));
        assert!(matches!(error_for_status(406, String::new()), BackendError::NotFound(_)));
        assert!(matches!(error_for_status(429, String::new()), BackendError::RateLimited));
        assert!(matches!(
            error_for_status(500, "boom".to_string()),
            BackendError::Api { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn fetch_posts_sends_limit_and_decodes_rows() {
        let body = r#"[{"id":2,"userId":"6f1c2b1e-8d7e-4d2a-9a51-3c4e9f0b7a10","body":"hi","user":{"id":"6f1c2b1e-8d7e-4d2a-9a51-3c4e9f0b7a10","name":"Ana","image":null}}]"#;
        let (base_url, server) = serve_once("200 OK", body).await;

        let posts = client(&base_url).fetch_posts(20).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].author_name(), "Ana");
        assert!(request.starts_with("GET /rest/v1/posts?"));
        assert!(request.contains("limit=20"));
        assert!(request.contains("order=created_at.desc"));
        assert!(request.to_lowercase().contains("apikey: anon-key"));
    }

    #[tokio::test]
    async fn get_user_data_requests_single_object() {
        let body = r#"{"id":"6f1c2b1e-8d7e-4d2a-9a51-3c4e9f0b7a10","name":"Luis"}"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let user_id: UserId = uuid::Uuid::parse_str("6f1c2b1e-8d7e-4d2a-9a51-3c4e9f0b7a10")
            .unwrap()
            .into();

        let profile = client(&base_url).get_user_data(&user_id).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(profile.display_name(), "Luis");
        assert!(request.contains("id=eq.6f1c2b1e-8d7e-4d2a-9a51-3c4e9f0b7a10"));
        assert!(request.contains(SINGLE_OBJECT));
    }

    #[tokio::test]
    async fn sign_out_maps_unauthorized() {
        let (base_url, server) = serve_once("401 Unauthorized", "{}").await;

        let result = client(&base_url).sign_out().await;
        let request = server.await.unwrap();

        assert!(matches!(result, Err(BackendError::Unauthorized)));
        assert!(request.starts_with("POST /auth/v1/logout"));
        assert!(request.contains("Bearer access-token"));
    }
}
