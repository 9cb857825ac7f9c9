//! Machine translation of catalog text.
//!
//! Translation never blocks a write: whenever the remote service fails, the
//! authoring text is stored in place of the missing translation.

use crate::catalog::{TourDraft, TourTranslations};
use crate::i18n::{Locale, LocalizedText};
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Free Google Translate endpoint used when none is configured.
pub const DEFAULT_TRANSLATE_API_URL: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("translation service returned {0}")]
    Status(StatusCode),

    #[error("unexpected translation response format")]
    UnexpectedFormat,
}

impl TranslateError {
    /// Transport errors, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Transport(_) => true,
            TranslateError::Status(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            TranslateError::UnexpectedFormat => false,
        }
    }
}

/// A remote machine-translation service.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: Locale,
        target: Locale,
    ) -> Result<String, TranslateError>;
}

/// Client for the keyless `client=gtx` Google Translate endpoint.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryConfig,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            retry: RetryConfig::translation(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, text: &str, source: Locale, target: Locale) -> Result<String, TranslateError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source.code()),
                ("tl", target.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status));
        }

        let body: Value = response.json().await?;
        extract_translation(&body).ok_or(TranslateError::UnexpectedFormat)
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Locale,
        target: Locale,
    ) -> Result<String, TranslateError> {
        with_retry_if(
            &self.retry,
            &format!("Translation {} -> {}", source, target),
            || self.request(text, source, target),
            TranslateError::is_retryable,
        )
        .await
    }
}

/// Pull the translated text out of a gtx response.
///
/// The body looks like `[[["Hola. ", "Hello. ", ...], ["Adiós", "Bye", ...]], ...]`;
/// the first element of every segment is concatenated.
fn extract_translation(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}

/// Translate `text` from `source` to `target`, falling back to `text` itself.
///
/// Empty text and same-locale requests never reach the service.
pub async fn translate_text(
    translator: &dyn MachineTranslator,
    text: &str,
    target: Locale,
    source: Locale,
) -> String {
    if text.is_empty() || source == target {
        return text.to_string();
    }

    match translator.translate(text, source, target).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!(
                "Translation to {} failed ({}), keeping original text",
                target, e
            );
            text.to_string()
        }
    }
}

/// `text` (authored in the default locale) in every supported locale.
pub async fn translate_everywhere(translator: &dyn MachineTranslator, text: &str) -> LocalizedText {
    let source = Locale::default_locale();
    let targets: Vec<Locale> = Locale::all().collect();
    let translated = join_all(
        targets
            .iter()
            .map(|target| translate_text(translator, text, *target, source)),
    )
    .await;

    let mut result = LocalizedText::default();
    for (target, value) in targets.into_iter().zip(translated) {
        result.set(target, value);
    }
    debug!("Translated {} characters into {} locales", text.len(), Locale::all().count());
    result
}

/// Variants for a tour's title, description and location.
pub async fn translate_tour_fields(
    translator: &dyn MachineTranslator,
    draft: &TourDraft,
) -> TourTranslations {
    let (title, description, location) = futures::join!(
        translate_everywhere(translator, &draft.title),
        translate_everywhere(translator, &draft.description),
        translate_everywhere(translator, &draft.location)
    );

    TourTranslations {
        title,
        description,
        location,
    }
}

pub async fn translate_announcement_message(
    translator: &dyn MachineTranslator,
    message: &str,
) -> LocalizedText {
    translate_everywhere(translator, message).await
}

pub async fn translate_review_comment(
    translator: &dyn MachineTranslator,
    comment: &str,
) -> LocalizedText {
    translate_everywhere(translator, comment).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn locale(code: &str) -> Locale {
        Locale::from_code(code).unwrap()
    }

    fn gtx_response(text: &str) -> Value {
        json!([[[text, "source", null, null, 10]], null, "en"])
    }

    fn translator_for(server: &MockServer) -> GoogleTranslator {
        GoogleTranslator::new(reqwest::Client::new(), format!("{}/translate_a/single", server.uri()))
            .with_retry(RetryConfig::new(3, Duration::from_millis(1)))
    }

    /// Deterministic translator: `[th] text`.
    struct Bracketing;

    #[async_trait]
    impl MachineTranslator for Bracketing {
        async fn translate(
            &self,
            text: &str,
            _source: Locale,
            target: Locale,
        ) -> Result<String, TranslateError> {
            Ok(format!("[{}] {}", target, text))
        }
    }

    struct Failing;

    #[async_trait]
    impl MachineTranslator for Failing {
        async fn translate(
            &self,
            _text: &str,
            _source: Locale,
            _target: Locale,
        ) -> Result<String, TranslateError> {
            Err(TranslateError::UnexpectedFormat)
        }
    }

    // ==================== Response Parsing Tests ====================

    #[test]
    fn test_extract_single_segment() {
        assert_eq!(extract_translation(&gtx_response("สวัสดี")), Some("สวัสดี".to_string()));
    }

    #[test]
    fn test_extract_concatenates_segments() {
        let body = json!([[["你好。", "Hello.", null], ["再见", "Bye", null]], null, "en"]);
        assert_eq!(extract_translation(&body), Some("你好。再见".to_string()));
    }

    #[test]
    fn test_extract_rejects_unexpected_shapes() {
        assert_eq!(extract_translation(&json!({})), None);
        assert_eq!(extract_translation(&json!([])), None);
        assert_eq!(extract_translation(&json!([[]])), None);
        assert_eq!(extract_translation(&json!([[[null]]])), None);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(TranslateError::Status(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(TranslateError::Status(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!TranslateError::Status(StatusCode::BAD_REQUEST).is_retryable());
        assert!(!TranslateError::UnexpectedFormat.is_retryable());
    }

    // ==================== GoogleTranslator Tests ====================

    #[tokio::test]
    async fn test_google_translator_sends_gtx_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .and(query_param("client", "gtx"))
            .and(query_param("sl", "en"))
            .and(query_param("tl", "th"))
            .and(query_param("dt", "t"))
            .and(query_param("q", "Hello & welcome"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gtx_response("สวัสดี")))
            .expect(1)
            .mount(&server)
            .await;

        let result = translator_for(&server)
            .translate("Hello & welcome", locale("en"), locale("th"))
            .await
            .unwrap();
        assert_eq!(result, "สวัสดี");
    }

    #[tokio::test]
    async fn test_google_translator_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let result = translator_for(&server)
            .translate("Hello", locale("en"), locale("zh"))
            .await;
        assert!(matches!(result, Err(TranslateError::Status(StatusCode::SERVICE_UNAVAILABLE))));
    }

    #[tokio::test]
    async fn test_google_translator_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let result = translator_for(&server)
            .translate("Hello", locale("en"), locale("zh"))
            .await;
        assert!(result.is_err());
    }

    // ==================== translate_text Tests ====================

    #[tokio::test]
    async fn test_translate_text_falls_back_to_original() {
        let result = translate_text(&Failing, "Hello", locale("th"), locale("en")).await;
        assert_eq!(result, "Hello");
    }

    #[tokio::test]
    async fn test_translate_text_skips_service_when_not_needed() {
        assert_eq!(translate_text(&Bracketing, "", locale("th"), locale("en")).await, "");
        assert_eq!(translate_text(&Bracketing, "Hi", locale("en"), locale("en")).await, "Hi");
        assert_eq!(translate_text(&Bracketing, "Hi", locale("th"), locale("en")).await, "[th] Hi");
    }

    #[tokio::test]
    async fn test_translate_text_against_failing_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let translator = translator_for(&server);
        let result = translate_text(&translator, "Beach day", locale("zh"), locale("en")).await;
        assert_eq!(result, "Beach day");
    }

    // ==================== Record Translation Tests ====================

    #[tokio::test]
    async fn test_translate_tour_fields() {
        let draft = TourDraft {
            title: "Old City Walk".to_string(),
            description: "Temples".to_string(),
            price: 500.0,
            duration: "1 day".to_string(),
            dates: "Daily".to_string(),
            location: "Chiang Mai".to_string(),
            banner_image: None,
            image_urls: Vec::new(),
        };

        let translations = translate_tour_fields(&Bracketing, &draft).await;
        assert_eq!(translations.title.en.as_deref(), Some("Old City Walk"));
        assert_eq!(translations.title.th.as_deref(), Some("[th] Old City Walk"));
        assert_eq!(translations.description.zh.as_deref(), Some("[zh] Temples"));
        assert_eq!(translations.location.th.as_deref(), Some("[th] Chiang Mai"));
    }

    #[tokio::test]
    async fn test_failed_translation_stores_original_everywhere() {
        let comment = translate_review_comment(&Failing, "Great guide").await;
        assert_eq!(comment, LocalizedText::uniform("Great guide"));

        let message = translate_announcement_message(&Bracketing, "Sale").await;
        assert_eq!(message.en.as_deref(), Some("Sale"));
        assert_eq!(message.zh.as_deref(), Some("[zh] Sale"));
    }
}
