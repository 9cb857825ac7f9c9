//! Integration tests for the tour storefront
//!
//! These tests run the real router on an ephemeral port and drive it over
//! HTTP, with the machine-translation service mocked by wiremock. The catalog
//! is the in-memory one, so no database is required.

use reqwest::{redirect::Policy, StatusCode};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use tour_storefront::{
    catalog::{MemoryCatalog, ReviewDraft, TourCatalog},
    i18n::{
        Dictionary, DictionaryLoader, DictionarySource, DictionaryValidator, DirectorySource,
        Locale, LocalizedText,
    },
    middleware::LocaleRouting,
    retry::RetryConfig,
    server::{build_router, AppState},
    translation::GoogleTranslator,
};

const API_KEY: &str = "test-api-key";

// ==================== Test Helpers ====================

struct TestApp {
    base_url: String,
    client: reqwest::Client,
    catalog: Arc<MemoryCatalog>,
    _translate: MockServer,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Value {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
        response.json().await.unwrap()
    }

    async fn admin_post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("x-api-key", API_KEY)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

fn locales_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("locales")
}

fn gtx_response(text: &str) -> Value {
    json!([[[text, "source", null, null, 10]], null, "en"])
}

/// Translation service answering every Thai request with "แปล" and every
/// Chinese request with "翻译".
async fn mock_translate_service() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("tl", "th"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gtx_response("แปล")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("tl", "zh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gtx_response("翻译")))
        .mount(&server)
        .await;
    server
}

async fn failing_translate_service() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

async fn spawn_app_with(translate: MockServer) -> TestApp {
    let catalog = Arc::new(MemoryCatalog::new());
    let translator = GoogleTranslator::new(
        reqwest::Client::new(),
        format!("{}/translate_a/single", translate.uri()),
    )
    .with_retry(RetryConfig::none());

    let state = AppState {
        catalog: catalog.clone(),
        dictionaries: Arc::new(DictionaryLoader::new(DirectorySource::new(locales_dir()))),
        translator: Arc::new(translator),
        routing: Arc::new(LocaleRouting::new()),
        api_key: Some(API_KEY.to_string()),
    };
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap(),
        catalog,
        _translate: translate,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(mock_translate_service().await).await
}

fn tour_body(title: &str, location: &str, price: f64) -> Value {
    json!({
        "title": title,
        "description": "Temples, markets and river views",
        "price": price,
        "duration": "3 days",
        "dates": "Every Saturday",
        "location": location,
        "image_urls": ["https://img.example.com/a.jpg"]
    })
}

fn location_of(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn set_cookie_of(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
}

// ==================== Locale Routing Tests ====================

#[tokio::test]
async fn test_header_negotiation_then_cookie_wins() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/tours?location=Nepal"))
        .header("Accept-Language", "th-TH,en;q=0.8")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/th/tours?location=Nepal");
    let cookie = set_cookie_of(&response).unwrap();
    assert!(cookie.starts_with("NEXT_LOCALE=th"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=31536000"));
    assert!(cookie.contains("SameSite=Lax"));

    // The cookie now decides, whatever the header says.
    let response = app
        .client
        .get(app.url("/tours"))
        .header("Cookie", "NEXT_LOCALE=th")
        .header("Accept-Language", "zh-CN,zh;q=0.9")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/th/tours");
}

#[tokio::test]
async fn test_root_redirects_to_default_home() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/en/");

    let home = app.get_json("/en/").await;
    assert_eq!(home["locale"]["code"], "en");
    assert_eq!(home["hero"]["title"], "Discover Thailand and Beyond");
}

#[tokio::test]
async fn test_unsupported_cookie_is_ignored() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/tours"))
        .header("Cookie", "NEXT_LOCALE=fr")
        .header("Accept-Language", "zh")
        .send()
        .await
        .unwrap();

    assert_eq!(location_of(&response), "/zh/tours");
}

#[tokio::test]
async fn test_prefixed_path_is_a_fixed_point() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/th/tours"))
        .header("Accept-Language", "zh")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie_of(&response).is_none());
}

#[tokio::test]
async fn test_api_paths_are_not_redirected() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["locales"], json!(["en", "th", "zh"]));
}

#[tokio::test]
async fn test_unknown_first_segment_is_prefixed_then_not_found() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/fr")).send().await.unwrap();
    assert_eq!(location_of(&response), "/en/fr");

    let response = app.client.get(app.url("/en/fr")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ==================== Dictionary Tests ====================

#[tokio::test]
async fn test_dictionary_endpoint_serves_locale_bundle() {
    let app = spawn_app().await;

    let zh = app.get_json("/zh/dictionary").await;
    assert_eq!(zh["nav"]["home"], "首页");

    let th = app.get_json("/th/dictionary").await;
    assert_eq!(th["tours"]["pageTitle"], "ทัวร์ทั้งหมด");
}

#[tokio::test]
async fn test_bundled_dictionaries_are_complete() {
    let source = DirectorySource::new(locales_dir());
    let mut bundles: Vec<(Locale, Dictionary)> = Vec::new();
    for locale in Locale::all() {
        let dictionary = source
            .load(locale)
            .await
            .unwrap_or_else(|e| panic!("{} bundle failed to load: {}", locale, e));
        bundles.push((locale, dictionary));
    }

    let reports = DictionaryValidator::validate_all(bundles.iter().map(|(l, d)| (*l, d)));
    assert_eq!(reports.len(), 2);
    for report in reports {
        assert!(report.is_clean(), "{:?}", report);
    }
}

#[tokio::test]
async fn test_locale_switcher_links() {
    let app = spawn_app().await;

    let links = app.get_json("/th/locales?path=/th/tours/5").await;
    let links = links.as_array().unwrap();
    assert_eq!(links.len(), 3);

    let zh = links.iter().find(|l| l["code"] == "zh").unwrap();
    assert_eq!(zh["href"], "/zh/tours/5");
    assert_eq!(zh["active"], false);
    let th = links.iter().find(|l| l["code"] == "th").unwrap();
    assert_eq!(th["active"], true);
    assert_eq!(th["native_name"], "ไทย");

    // Off-site paths are replaced by the root.
    let links = app.get_json("/en/locales?path=//evil.example.com").await;
    assert_eq!(links[0]["href"], "/en/");

    // A query on the current page survives the switch.
    let links = app.get_json("/en/locales?path=%2Fth%3Fx%3D1").await;
    let zh = links
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["code"] == "zh")
        .unwrap();
    assert_eq!(zh["href"], "/zh?x=1");
}

#[tokio::test]
async fn test_switching_locale_persists_choice() {
    let app = spawn_app().await;

    let links = app.get_json("/th/locales?path=/th/tours").await;
    let zh = links
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["code"] == "zh")
        .unwrap();
    let switch_href = zh["switch_href"].as_str().unwrap();
    assert_eq!(switch_href, "/zh/switch?path=%2Fth%2Ftours");

    let response = app
        .client
        .get(app.url(switch_href))
        .header("Cookie", "NEXT_LOCALE=th")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/zh/tours");
    let cookie = set_cookie_of(&response).unwrap();
    assert!(cookie.starts_with("NEXT_LOCALE=zh;"));

    // The browser now sends the new cookie; unprefixed visits follow it.
    let response = app
        .client
        .get(app.url("/"))
        .header("Cookie", "NEXT_LOCALE=zh")
        .header("Accept-Language", "th")
        .send()
        .await
        .unwrap();
    assert_eq!(location_of(&response), "/zh/");
}

#[tokio::test]
async fn test_switch_rejects_off_site_targets() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/th/switch?path=//evil.example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/th/");
}

// ==================== Admin API Tests ====================

#[tokio::test]
async fn test_admin_requires_api_key() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/tours"))
        .json(&tour_body("Old City Walk", "Chiang Mai", 450.0))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let response = app
        .client
        .delete(app.url("/api/tours/1"))
        .header("x-api-key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_created_tour_is_translated_and_localized() {
    let app = spawn_app().await;

    let response = app
        .admin_post("/api/tours", tour_body("Old City Walk", "Chiang Mai", 450.0))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tour: Value = response.json().await.unwrap();
    let id = tour["id"].as_i64().unwrap();
    assert_eq!(tour["title"], "Old City Walk");
    assert_eq!(tour["title_i18n"]["en"], "Old City Walk");
    assert_eq!(tour["title_i18n"]["th"], "แปล");

    let th = app.get_json(&format!("/th/tours/{}", id)).await;
    assert_eq!(th["tour"]["title"], "แปล");
    assert_eq!(th["tour"]["href"], format!("/th/tours/{}", id));
    assert_eq!(th["back_href"], "/th/tours");

    let en = app.get_json(&format!("/en/tours/{}", id)).await;
    assert_eq!(en["tour"]["title"], "Old City Walk");

    let listing = app.get_json("/zh/tours").await;
    assert_eq!(listing["tours"][0]["title"], "翻译");
    assert_eq!(listing["results_label"], "找到 1 条线路");
}

#[tokio::test]
async fn test_translation_failure_stores_original_text() {
    let app = spawn_app_with(failing_translate_service().await).await;

    let response = app
        .admin_post("/api/tours", tour_body("Island Hopping", "Phuket", 1200.0))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tour: Value = response.json().await.unwrap();
    assert_eq!(tour["title_i18n"]["th"], "Island Hopping");
    assert_eq!(tour["location_i18n"]["zh"], "Phuket");
}

#[tokio::test]
async fn test_invalid_tour_is_rejected() {
    let app = spawn_app().await;

    let response = app.admin_post("/api/tours", tour_body("", "Phuket", 1200.0)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "All fields are required" }));
}

#[tokio::test]
async fn test_update_and_delete_tour() {
    let app = spawn_app().await;
    let created: Value = app
        .admin_post("/api/tours", tour_body("Old", "Bangkok", 900.0))
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/tours/{}", id)))
        .header("x-api-key", API_KEY)
        .json(&tour_body("Grand Palace", "Bangkok", 2100.0))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Grand Palace");
    assert_eq!(updated["price"], 2100.0);

    let response = app
        .client
        .put(app.url("/api/tours/9999"))
        .header("x-api-key", API_KEY)
        .json(&tour_body("Nowhere", "Bangkok", 100.0))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .client
        .delete(app.url(&format!("/api/tours/{}", id)))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .get(app.url(&format!("/en/tours/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_single_active_announcement_on_home() {
    let app = spawn_app().await;

    let first: Value = app
        .admin_post("/api/announcements", json!({ "message": "Rainy season sale", "is_active": true }))
        .await
        .json()
        .await
        .unwrap();
    let second: Value = app
        .admin_post("/api/announcements", json!({ "message": "Songkran tours", "is_active": true }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(second["is_active"], true);

    let home = app.get_json("/en").await;
    assert_eq!(home["announcement"]["message"], "Songkran tours");
    assert_eq!(home["announcement"]["type"], "banner");
    let home = app.get_json("/th").await;
    assert_eq!(home["announcement"]["message"], "แปล");

    let first_id = first["id"].as_i64().unwrap();
    let response = app
        .admin_post(
            &format!("/api/announcements/{}/toggle", first_id),
            json!({ "is_active": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let home = app.get_json("/en").await;
    assert_eq!(home["announcement"]["message"], "Rainy season sale");

    let response = app
        .admin_post("/api/announcements/9999/toggle", json!({ "is_active": true }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_popup_announcement_on_home() {
    let app = spawn_app().await;

    let response = app
        .admin_post(
            "/api/announcements",
            json!({
                "message": "Festival deals",
                "type": "popup",
                "image_url": "https://img.example.com/festival.jpg",
                "is_active": true
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["type"], "popup");

    let home = app.get_json("/zh").await;
    assert_eq!(home["announcement"]["message"], "翻译");
    assert_eq!(home["announcement"]["type"], "popup");
    assert_eq!(
        home["announcement"]["image_url"],
        "https://img.example.com/festival.jpg"
    );
}

// ==================== Currency Tests ====================

#[tokio::test]
async fn test_prices_follow_selected_currency() {
    let app = spawn_app().await;
    let created: Value = app
        .admin_post("/api/tours", tour_body("Old City Walk", "Chiang Mai", 450.0))
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["currency"], "USD");

    let home = app.get_json("/en").await;
    assert_eq!(home["currency"], "USD");
    assert_eq!(home["tours"][0]["display_price"], "$450");

    let listing = app.get_json("/th/tours?currency=INR").await;
    assert_eq!(listing["currency"], "INR");
    assert_eq!(listing["tours"][0]["display_price"], "₹37,404");
    assert_eq!(listing["tours"][0]["price"], 450.0);

    let detail = app.get_json(&format!("/zh/tours/{}?currency=gbp", id)).await;
    assert_eq!(detail["tour"]["display_price"], "£356");

    // Unknown codes fall back to dollars.
    let listing = app.get_json("/en/tours?currency=THB").await;
    assert_eq!(listing["tours"][0]["display_price"], "$450");
}

// ==================== Search Tests ====================

#[tokio::test]
async fn test_tour_listing_filters() {
    let app = spawn_app().await;
    for (title, location, price) in [
        ("Old City Walk", "Chiang Mai", 450.0),
        ("Night Market Food Tour", "Chiang Mai", 650.0),
        ("Island Hopping", "Phuket", 1200.0),
    ] {
        let response = app.admin_post("/api/tours", tour_body(title, location, price)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let listing = app.get_json("/en/tours?location=Chiang%20Mai&price=500-1000").await;
    let titles: Vec<&str> = listing["tours"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Night Market Food Tour"]);
    assert_eq!(listing["filters_active"], true);
    assert_eq!(listing["locations"], json!(["Chiang Mai", "Phuket"]));

    // English location links keep working on a translated page.
    let listing = app.get_json("/th/tours?location=Phuket").await;
    assert_eq!(listing["tours"].as_array().unwrap().len(), 1);

    let listing = app.get_json("/en/tours?q=island").await;
    assert_eq!(listing["tours"][0]["title"], "Island Hopping");
}

// ==================== Review Tests ====================

#[tokio::test]
async fn test_translate_review_comment() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/reviews/translate"))
        .json(&json!({ "comment": "Great guide" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "comment_en": "Great guide", "comment_th": "แปล", "comment_zh": "翻译" })
    );

    let response = app
        .client
        .post(app.url("/api/reviews/translate"))
        .json(&json!({ "comment": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Comment is required" }));
}

#[tokio::test]
async fn test_tour_detail_includes_localized_reviews() {
    let app = spawn_app().await;
    let created: Value = app
        .admin_post("/api/tours", tour_body("Old City Walk", "Chiang Mai", 450.0))
        .await
        .json()
        .await
        .unwrap();
    let tour_id = created["id"].as_i64().unwrap();

    for (user, rating, comment_th) in [("u1", 5, Some("ยอดเยี่ยม")), ("u2", 4, None)] {
        let draft = ReviewDraft {
            tour_id,
            user_id: user.to_string(),
            user_name: None,
            rating,
            comment: "Lovely".to_string(),
        };
        let translations = LocalizedText {
            en: Some("Lovely".to_string()),
            th: comment_th.map(str::to_string),
            zh: None,
        };
        app.catalog.upsert_review(&draft, &translations).await.unwrap();
    }

    let page = app.get_json(&format!("/th/tours/{}", tour_id)).await;
    let reviews = &page["reviews"];
    assert_eq!(reviews["count"], 2);
    assert_eq!(reviews["average_rating"], 4.5);
    assert_eq!(reviews["title"], "รีวิว");

    let comments: Vec<&str> = reviews["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["comment"].as_str())
        .collect();
    assert!(comments.contains(&"ยอดเยี่ยม"));
    assert!(comments.contains(&"Lovely"));
    assert_eq!(reviews["items"][0]["user_name"], "นักเดินทางนิรนาม");
}
