//! Mutuelle REST client implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::REFERER;
use reqwest::{Client, Request, Url, multipart};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::*;
use crate::config::{EndpointsConfig, ServerConfig};
use crate::error::{AppError, Result};

/// Header carrying the anti-forgery token on JSON posts.
pub const CSRF_HEADER: &str = "X-CSRFToken";
/// Cookie the server uses to hand out the anti-forgery token.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Form field carrying the anti-forgery token on multipart posts.
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

/// Mutuelle server HTTP client.
///
/// Uses session-based authentication with cookies. The session itself is
/// established by the server; the client only replays it.
pub struct ApiClient {
    client: Client,
    base_url: String,
    endpoints: EndpointsConfig,
    jar: Arc<Jar>,
    csrf_token: Option<String>,
}

impl ApiClient {
    /// Create a new client instance.
    pub fn new(server: &ServerConfig, endpoints: &EndpointsConfig) -> Result<Self> {
        let base_url = server.base_url.trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url).map_err(|e| AppError::config(format!("Invalid server URL: {e}")))?;

        let jar = Arc::new(Jar::default());
        if let Some(session) = &server.session_cookie {
            jar.add_cookie_str(&format!("sessionid={session}"), &origin);
        }

        let client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(server.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            endpoints: endpoints.clone(),
            jar,
            csrf_token: server.csrf_token.clone(),
        })
    }

    /// Base URL of the server, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{base}{path}", base = self.base_url))
            .map_err(|e| AppError::config(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Absolute download URL for a message attachment.
    pub fn attachment_url(&self, attachment_id: i64) -> Result<Url> {
        self.url(&EndpointsConfig::with_id(&self.endpoints.attachment_download, attachment_id))
    }

    /// Current anti-forgery token.
    ///
    /// A token fixed in the config wins over the `csrftoken` cookie.
    pub fn csrf_token(&self) -> Option<String> {
        if let Some(token) = &self.csrf_token {
            return Some(token.clone());
        }

        let origin = Url::parse(&self.base_url).ok()?;
        let cookies = self.jar.cookies(&origin)?;
        let cookies = cookies.to_str().ok()?;

        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == CSRF_COOKIE)
            .map(|(_, value)| value.to_string())
    }

    fn require_csrf_token(&self) -> Result<String> {
        self.csrf_token().ok_or(AppError::MissingCsrfToken)
    }

    // ---------------------------------------------------------------------
    // Request builders
    // ---------------------------------------------------------------------

    pub(crate) fn member_search_request(&self, query: &str) -> Result<Request> {
        let url = self.url(&self.endpoints.member_search)?;
        Ok(self.client.get(url).query(&[("q", query)]).build()?)
    }

    pub(crate) fn member_list_request(&self, page: u32, filters: &BTreeMap<String, String>) -> Result<Request> {
        let url = self.url(&self.endpoints.member_list)?;
        let mut query: Vec<(&str, String)> = vec![("page", page.to_string())];
        for (key, value) in filters {
            query.push((key.as_str(), value.clone()));
        }
        Ok(self.client.get(url).query(&query).build()?)
    }

    pub(crate) fn dues_request(&self, member_id: i64) -> Result<Request> {
        let url = self.url(&EndpointsConfig::with_id(&self.endpoints.dues_verification, member_id))?;
        Ok(self.client.get(url).build()?)
    }

    pub(crate) fn create_voucher_request(&self, voucher: &NewVoucher) -> Result<Request> {
        let token = self.require_csrf_token()?;
        let url = self.url(&self.endpoints.voucher_creation)?;
        Ok(self
            .client
            .post(url)
            .header(CSRF_HEADER, token)
            .header(REFERER, &self.base_url)
            .json(voucher)
            .build()?)
    }

    fn get_request(&self, path: &str) -> Result<Request> {
        Ok(self.client.get(self.url(path)?).build()?)
    }

    // ---------------------------------------------------------------------
    // Response handling
    // ---------------------------------------------------------------------

    /// Execute a request and decode a JSON body, rejecting non-2xx statuses.
    async fn fetch_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        debug!("{} {}", request.method(), request.url());
        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Execute a request whose body carries a `success` envelope.
    ///
    /// The body is decoded even on error statuses because the server reports
    /// application failures with 4xx codes and a JSON message.
    async fn fetch_envelope<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        debug!("{} {}", request.method(), request.url());
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(decoded) => Ok(decoded),
            Err(_) if !status.is_success() => Err(AppError::Status(status.as_u16())),
            Err(e) => Err(e.into()),
        }
    }

    // ---------------------------------------------------------------------
    // Endpoints
    // ---------------------------------------------------------------------

    /// Search members by name or number.
    pub async fn search_members(&self, query: &str) -> Result<Vec<MemberSummary>> {
        let response: MemberSearchResponse = self.fetch_json(self.member_search_request(query)?).await?;
        Ok(response.membres)
    }

    /// Load one page of the member listing.
    pub async fn list_members(&self, page: u32, filters: &BTreeMap<String, String>) -> Result<MemberPage> {
        self.fetch_json(self.member_list_request(page, filters)?).await
    }

    /// Check whether a member's dues are up to date.
    pub async fn verify_dues(&self, member_id: i64) -> Result<DuesStatus> {
        self.fetch_json(self.dues_request(member_id)?).await
    }

    /// List doctors a voucher can be issued for.
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>> {
        let response: DoctorListResponse = self.fetch_json(self.get_request(&self.endpoints.doctor_list)?).await?;
        Ok(response.medecins)
    }

    /// Today's voucher counters for the current agent.
    pub async fn daily_stats(&self) -> Result<DailyStats> {
        self.fetch_json(self.get_request(&self.endpoints.daily_stats)?).await
    }

    /// Create a care voucher.
    ///
    /// `success: false` answers become [`AppError::Server`] with the server's
    /// message.
    pub async fn create_voucher(&self, voucher: &NewVoucher) -> Result<IssuedVoucher> {
        let response: VoucherCreationResponse = self.fetch_envelope(self.create_voucher_request(voucher)?).await?;

        match (response.success, response.bon_soin) {
            (true, Some(issued)) => Ok(issued),
            (true, None) => Err(AppError::parse("Voucher created but missing from response")),
            (false, _) => Err(AppError::server(
                response
                    .message
                    .or(response.error)
                    .unwrap_or_else(|| "Erreur inconnue".to_string()),
            )),
        }
    }

    /// Unread notification count.
    pub async fn notification_count(&self) -> Result<u32> {
        let response: NotificationCountResponse = self
            .fetch_json(self.get_request(&self.endpoints.notification_count)?)
            .await?;
        Ok(response.count)
    }

    /// Unread private message count.
    pub async fn unread_message_count(&self) -> Result<u32> {
        let response: UnreadCountResponse = self
            .fetch_json(self.get_request(&self.endpoints.message_unread_count)?)
            .await?;
        Ok(response.unread_count)
    }

    /// Conversations of the current user, most recent first.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let response: ConversationListResponse = self
            .fetch_json(self.get_request(&self.endpoints.conversation_list)?)
            .await?;
        Ok(response.conversations)
    }

    /// Message history of a conversation, oldest first.
    pub async fn conversation_messages(&self, conversation_id: i64) -> Result<Vec<Message>> {
        let path = EndpointsConfig::with_id(&self.endpoints.conversation_messages, conversation_id);
        let response: MessageListResponse = self.fetch_json(self.get_request(&path)?).await?;
        response.into_messages()
    }

    /// Multipart post for a private message. `files` are `(name, bytes)`
    /// pairs, each sent as a `pieces_jointes` part.
    pub(crate) fn send_message_request(
        &self,
        message: &OutgoingMessage,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<Request> {
        let token = self.require_csrf_token()?;

        let mut form = multipart::Form::new()
            .text("destinataire_id", message.recipient_id.to_string())
            .text("titre", message.title.clone())
            .text("contenu", message.body.clone())
            .text(CSRF_FIELD, token.clone());
        for (name, bytes) in files {
            form = form.part("pieces_jointes", multipart::Part::bytes(bytes).file_name(name));
        }

        Ok(self
            .client
            .post(self.url(&self.endpoints.send_message)?)
            .header(CSRF_HEADER, token)
            .header(REFERER, &self.base_url)
            .multipart(form)
            .build()?)
    }

    /// Send a private message with optional file attachments.
    ///
    /// Fails with [`AppError::MissingCsrfToken`] before reading any file.
    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        self.require_csrf_token()?;

        let mut files = Vec::with_capacity(message.attachments.len());
        for path in &message.attachments {
            let bytes = tokio::fs::read(path).await?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "piece_jointe".to_string());
            files.push((name, bytes));
        }

        let request = self.send_message_request(message, files)?;
        let response: SendMessageResponse = self.fetch_envelope(request).await?;
        if response.success {
            Ok(())
        } else {
            Err(AppError::server(
                response.error.unwrap_or_else(|| "Erreur lors de l'envoi du message".to_string()),
            ))
        }
    }

    /// Download an attachment into `dest`.
    pub async fn download_attachment(&self, attachment_id: i64, dest: &Path) -> Result<PathBuf> {
        let request = self.client.get(self.attachment_url(attachment_id)?).build()?;
        let response = self.client.execute(request).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        let server = ServerConfig {
            base_url: "http://mutuelle.test/".to_string(),
            ..Default::default()
        };
        ApiClient::new(&server, &EndpointsConfig::default()).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(client().base_url(), "http://mutuelle.test");
    }

    #[test]
    fn test_member_search_query_encoded() {
        let request = client().member_search_request("Jean Dupont").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/membres/api/search/");
        assert_eq!(request.url().query(), Some("q=Jean+Dupont"));
    }

    #[test]
    fn test_member_list_carries_page_and_filters() {
        let mut filters = BTreeMap::new();
        filters.insert("statut".to_string(), "actif".to_string());
        let request = client().member_list_request(2, &filters).unwrap();

        assert_eq!(request.url().path(), "/membres/api/liste/");
        assert_eq!(request.url().query(), Some("page=2&statut=actif"));
    }

    #[test]
    fn test_dues_request_fills_member_id() {
        let request = client().dues_request(42).unwrap();
        assert_eq!(request.url().as_str(), "http://mutuelle.test/agents/verifier-cotisation/42/");
    }

    #[test]
    fn test_attachment_url() {
        let url = client().attachment_url(9).unwrap();
        assert_eq!(url.as_str(), "http://mutuelle.test/communication/fichier/9/telecharger/");
    }

    #[test]
    fn test_create_voucher_requires_token() {
        let voucher = NewVoucher {
            member_id: 1,
            max_amount: "5000".to_string(),
            reason: "Consultation".to_string(),
            doctor_id: 2,
        };
        let err = client().create_voucher_request(&voucher).unwrap_err();
        assert!(matches!(err, AppError::MissingCsrfToken));
    }

    #[test]
    fn test_csrf_token_read_from_cookie() {
        let api = client();
        assert_eq!(api.csrf_token(), None);

        let origin = Url::parse("http://mutuelle.test").unwrap();
        api.jar.add_cookie_str("csrftoken=abc123; Path=/", &origin);
        api.jar.add_cookie_str("sessionid=s3ss10n; Path=/", &origin);

        assert_eq!(api.csrf_token().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_create_voucher_request_headers_and_body() {
        let server = ServerConfig {
            base_url: "http://mutuelle.test".to_string(),
            csrf_token: Some("tok".to_string()),
            ..Default::default()
        };
        let api = ApiClient::new(&server, &EndpointsConfig::default()).unwrap();
        let voucher = NewVoucher {
            member_id: 7,
            max_amount: "15000".to_string(),
            reason: "Fièvre".to_string(),
            doctor_id: 3,
        };

        let request = api.create_voucher_request(&voucher).unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/agents/creer-bon-soin/");
        assert_eq!(request.headers().get(CSRF_HEADER).unwrap(), "tok");
        assert_eq!(
            request.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json["membre_id"], 7);
        assert_eq!(json["motif"], "Fièvre");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let server = ServerConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ApiClient::new(&server, &EndpointsConfig::default()),
            Err(AppError::Config(_))
        ));
    }

    fn outgoing(attachments: Vec<PathBuf>) -> OutgoingMessage {
        OutgoingMessage {
            recipient_id: 12,
            title: "Message privé".to_string(),
            body: "Bonjour".to_string(),
            attachments,
        }
    }

    fn client_with_token(base_url: &str) -> ApiClient {
        let server = ServerConfig {
            base_url: base_url.to_string(),
            csrf_token: Some("tok".to_string()),
            ..Default::default()
        };
        ApiClient::new(&server, &EndpointsConfig::default()).unwrap()
    }

    #[test]
    fn test_send_message_requires_token() {
        let err = client().send_message_request(&outgoing(vec![]), vec![]).unwrap_err();
        assert!(matches!(err, AppError::MissingCsrfToken));
    }

    #[tokio::test]
    async fn test_send_message_without_token_reads_no_file() {
        let missing = PathBuf::from("/nonexistent/ordonnance.pdf");
        let err = client().send_message(&outgoing(vec![missing])).await.unwrap_err();
        assert!(matches!(err, AppError::MissingCsrfToken));
    }

    #[test]
    fn test_send_message_request_headers() {
        let api = client_with_token("http://mutuelle.test");
        let request = api
            .send_message_request(&outgoing(vec![]), vec![("a.pdf".to_string(), b"%PDF".to_vec())])
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/communication/envoyer-message/");
        assert_eq!(request.headers().get(CSRF_HEADER).unwrap(), "tok");
        let content_type = request.headers().get(reqwest::header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("multipart/form-data; boundary="));
    }

    #[tokio::test]
    async fn test_send_message_multipart_fields_on_the_wire() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("ordonnance.pdf");
        let second = dir.path().join("analyse.png");
        std::fs::write(&first, b"%PDF-1.4").unwrap();
        std::fs::write(&second, b"\x89PNG").unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&chunk[..n]);
                if received.ends_with(b"--\r\n") {
                    break;
                }
            }
            let body = r#"{"success": true}"#;
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&received).to_string()
        });

        let api = client_with_token(&format!("http://{addr}"));
        api.send_message(&outgoing(vec![first, second])).await.unwrap();

        let raw = server.await.unwrap();
        let lower = raw.to_lowercase();
        assert!(lower.contains("x-csrftoken: tok"));
        assert!(raw.contains("name=\"destinataire_id\"\r\n\r\n12"));
        assert!(raw.contains("name=\"titre\"\r\n\r\nMessage privé"));
        assert!(raw.contains("name=\"contenu\"\r\n\r\nBonjour"));
        assert!(raw.contains("name=\"csrfmiddlewaretoken\"\r\n\r\ntok"));
        assert_eq!(raw.matches("name=\"pieces_jointes\"").count(), 2);
        assert!(raw.contains("filename=\"ordonnance.pdf\""));
        assert!(raw.contains("filename=\"analyse.png\""));
    }
}
