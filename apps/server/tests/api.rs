use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use skyvestments_market_data::{
    price_from_f64, CatalogEntry, CatalogSnapshot, EngineConfig, IdentifierResolver,
    ItemIdentifier, MarketDataError, PriceCandidate, PriceProvider, PriceResolutionEngine,
    PriceSource, PriceSourceChain, ProviderCapabilities, SharedCatalog,
};
use skyvestments_server::{api::app_router, config::Config, AppState};
use skyvestments_storage_json::{DataPaths, PersistentPriceCache};
use tempfile::tempdir;
use tower::ServiceExt;

/// Offline bazaar that prices every item at the same upstream float.
struct FixedBazaar {
    price: f64,
    calls: AtomicUsize,
}

#[async_trait]
impl PriceProvider for FixedBazaar {
    fn source(&self) -> PriceSource {
        PriceSource::Bazaar
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            requires_network: false,
            runes_only: false,
        }
    }

    async fn fetch_price(
        &self,
        _item: &ItemIdentifier,
    ) -> Result<Option<PriceCandidate>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(price_from_f64(self.price).map(PriceCandidate::new))
    }
}

fn catalog_snapshot() -> CatalogSnapshot {
    CatalogSnapshot::new(vec![CatalogEntry {
        name: "Hyperion".to_string(),
        internal_id: "HYPERION".to_string(),
        npc_sell_price: None,
    }])
}

struct TestApp {
    app: Router,
    bazaar: Arc<FixedBazaar>,
    prices: Arc<PersistentPriceCache>,
}

fn test_app(dir: &Path, snapshot: CatalogSnapshot) -> TestApp {
    let bazaar = Arc::new(FixedBazaar {
        price: 1234.56,
        calls: AtomicUsize::new(0),
    });
    let paths = DataPaths::new(dir);
    let catalog = Arc::new(SharedCatalog::new(snapshot));
    let prices = PersistentPriceCache::shared(&paths.prices);
    let sources: Vec<Arc<dyn PriceProvider>> = vec![bazaar.clone()];
    let engine = PriceResolutionEngine::new(
        Arc::new(IdentifierResolver::new(catalog.clone())),
        PriceSourceChain::new(sources),
        prices.clone(),
        EngineConfig::default(),
    );
    let state = Arc::new(AppState::new(
        Arc::new(engine),
        prices.clone(),
        catalog,
        &paths,
        dir.join("items"),
    ));
    TestApp {
        app: app_router(state, &Config::default()),
        bazaar,
        prices,
    }
}

fn read_prices_file(dir: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(dir.join("prices.json")).unwrap()).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_works() {
    let tmp = tempdir().unwrap();
    let TestApp { app, .. } = test_app(tmp.path(), catalog_snapshot());

    let response = send(&app, "GET", "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_api_route_is_json_404() {
    let tmp = tempdir().unwrap();
    let TestApp { app, .. } = test_app(tmp.path(), catalog_snapshot());

    let response = send(&app, "GET", "/api/nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "code": 404, "message": "Not Found" })
    );
}

#[tokio::test]
async fn price_is_resolved_once_then_cached() {
    let tmp = tempdir().unwrap();
    let TestApp {
        app,
        bazaar,
        prices,
    } = test_app(tmp.path(), catalog_snapshot());

    let first = body_json(send(&app, "GET", "/api/price/Hyperion", None).await).await;
    assert_eq!(first["price"]["amount"], json!(1234.6));
    assert_eq!(first["price"]["source"], json!("bazaar"));
    assert_eq!(first["price"]["displayName"], json!("Hyperion"));

    let second = body_json(send(&app, "GET", "/api/price/Hyperion", None).await).await;
    assert_eq!(second, first);
    assert_eq!(bazaar.calls.load(Ordering::SeqCst), 1);

    // Write-through reached prices.json
    prices.flush().await;
    let saved = read_prices_file(tmp.path());
    assert_eq!(saved["prices"]["hyperion"]["amount"], json!(1234.6));
}

#[tokio::test]
async fn concurrent_resolutions_all_reach_prices_file() {
    let tmp = tempdir().unwrap();
    let names = ["Hyperion", "Terminator", "Necron's Handle", "Wither Catalyst"];
    let snapshot = CatalogSnapshot::new(
        names
            .iter()
            .map(|name| CatalogEntry {
                name: name.to_string(),
                internal_id: name.to_uppercase().replace(&['\'', ' '][..], "_"),
                npc_sell_price: None,
            })
            .collect(),
    );
    let TestApp { app, prices, .. } = test_app(tmp.path(), snapshot);

    let requests = names.iter().map(|name| {
        let app = app.clone();
        let uri = format!("/api/price/{}", name.replace(' ', "%20").replace('\'', "%27"));
        tokio::spawn(async move { send(&app, "GET", &uri, None).await.status() })
    });
    for request in requests.collect::<Vec<_>>() {
        assert_eq!(request.await.unwrap(), StatusCode::OK);
    }

    prices.flush().await;
    let saved = read_prices_file(tmp.path());
    let saved = saved["prices"].as_object().unwrap();
    assert_eq!(saved.len(), names.len());
    assert!(saved.contains_key("necrons_handle"));
}

#[tokio::test]
async fn unknown_item_has_null_price() {
    let tmp = tempdir().unwrap();
    let TestApp { app, bazaar, .. } = test_app(tmp.path(), catalog_snapshot());

    let response = send(&app, "GET", "/api/price/Mystery%20Item", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "price": null }));
    assert_eq!(bazaar.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn refresh_all_covers_tracked_items() {
    let tmp = tempdir().unwrap();
    let TestApp { app, bazaar, .. } = test_app(tmp.path(), catalog_snapshot());

    let entries = json!({
        "entries": [
            { "id": 1, "itemName": "Hyperion", "buyPrice": 800000000, "quantity": 1, "timestamp": 1700000000000i64 },
            { "id": 2, "itemName": "Mystery Item", "buyPrice": 5, "quantity": 3, "timestamp": 1700000000001i64 },
            { "id": 3, "itemName": "Hyperion", "buyPrice": 900000000, "quantity": 1, "timestamp": 1700000000002i64 }
        ]
    });
    let response = send(&app, "PUT", "/api/entries", Some(entries)).await;
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let stored = body_json(send(&app, "GET", "/api/entries", None).await).await;
    assert_eq!(stored["entries"].as_array().unwrap().len(), 3);

    let results = body_json(send(&app, "POST", "/api/refresh-all", None).await).await;
    let results = results.as_object().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results["Hyperion"]["amount"], json!(1234.6));
    assert_eq!(results["Mystery Item"], Value::Null);
    assert_eq!(bazaar.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn prices_can_be_replaced_in_bulk() {
    let tmp = tempdir().unwrap();
    let TestApp {
        app,
        bazaar,
        prices,
    } = test_app(tmp.path(), catalog_snapshot());

    let captured_at = Utc::now().timestamp_millis();
    let document = json!({
        "prices": {
            "hyperion": {
                "amount": 750000000.0,
                "source": "auction",
                "capturedAt": captured_at,
                "displayName": "Hyperion"
            }
        }
    });
    let response = send(&app, "PUT", "/api/prices", Some(document)).await;
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let listed = body_json(send(&app, "GET", "/api/prices", None).await).await;
    assert_eq!(listed["prices"]["hyperion"]["source"], json!("auction"));

    prices.flush().await;
    assert_eq!(
        read_prices_file(tmp.path())["prices"]["hyperion"]["amount"],
        json!(750000000.0)
    );

    // The replaced record is fresh, so no source is consulted.
    let price = body_json(send(&app, "GET", "/api/price/Hyperion", None).await).await;
    assert_eq!(price["price"]["amount"], json!(750000000.0));
    assert_eq!(bazaar.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn replaced_prices_are_stored_under_canonical_keys() {
    let tmp = tempdir().unwrap();
    let TestApp { app, bazaar, .. } = test_app(tmp.path(), catalog_snapshot());

    let document = json!({
        "prices": {
            "Hyperion": {
                "amount": 750000000.0,
                "source": "auction",
                "capturedAt": Utc::now().timestamp_millis(),
                "displayName": "Hyperion"
            }
        }
    });
    let response = send(&app, "PUT", "/api/prices", Some(document)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let listed = body_json(send(&app, "GET", "/api/prices", None).await).await;
    assert!(listed["prices"].get("Hyperion").is_none());
    assert_eq!(listed["prices"]["hyperion"]["source"], json!("auction"));

    let price = body_json(send(&app, "GET", "/api/price/Hyperion", None).await).await;
    assert_eq!(price["price"]["amount"], json!(750000000.0));
    assert_eq!(bazaar.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn future_dated_price_is_refetched() {
    let tmp = tempdir().unwrap();
    let TestApp { app, bazaar, .. } = test_app(tmp.path(), catalog_snapshot());

    let document = json!({
        "prices": {
            "hyperion": {
                "amount": 1.0,
                "source": "bazaar",
                "capturedAt": (Utc::now() + Duration::days(365)).timestamp_millis(),
                "displayName": "Hyperion"
            }
        }
    });
    send(&app, "PUT", "/api/prices", Some(document)).await;

    let price = body_json(send(&app, "GET", "/api/price/Hyperion", None).await).await;
    assert_eq!(price["price"]["amount"], json!(1234.6));
    assert_eq!(bazaar.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_entries_are_rejected() {
    let tmp = tempdir().unwrap();
    let TestApp { app, .. } = test_app(tmp.path(), catalog_snapshot());

    let response = send(&app, "PUT", "/api/entries", Some(json!({ "entries": "nope" }))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], json!(422));

    let stored = body_json(send(&app, "GET", "/api/entries", None).await).await;
    assert_eq!(stored, json!({ "entries": [] }));
}

#[tokio::test]
async fn items_list_catalog_names() {
    let tmp = tempdir().unwrap();
    let loaded_at = Utc::now() - Duration::hours(1);
    let TestApp { app, .. } = test_app(tmp.path(), catalog_snapshot().with_loaded_at(loaded_at));

    let items = body_json(send(&app, "GET", "/api/items", None).await).await;
    assert_eq!(items["items"], json!(["Hyperion"]));
    assert_eq!(items["lastUpdated"], json!(loaded_at.timestamp_millis()));

    // Younger than a day, so the catalog is kept.
    let refresh = body_json(send(&app, "POST", "/api/refresh-items", None).await).await;
    assert_eq!(refresh, json!({ "items": ["Hyperion"], "cached": true }));
}

#[tokio::test]
async fn stale_catalog_is_reloaded_from_disk() {
    let tmp = tempdir().unwrap();
    let items_dir = tmp.path().join("items");
    std::fs::create_dir_all(&items_dir).unwrap();
    std::fs::write(
        items_dir.join("JERRY_RUNE;3.json"),
        r#"{"displayname":"§5◆ Jerry Rune III","internalname":"JERRY_RUNE;3","npc_sell_price":1500}"#,
    )
    .unwrap();

    let stale = catalog_snapshot().with_loaded_at(Utc::now() - Duration::hours(25));
    let TestApp { app, .. } = test_app(tmp.path(), stale);

    let refresh = body_json(send(&app, "POST", "/api/refresh-items", None).await).await;
    assert_eq!(refresh["cached"], json!(false));
    assert_eq!(refresh["items"], json!(["◆ Jerry Rune III"]));

    // The new catalog is persisted and served.
    assert!(tmp.path().join("items.json").exists());
    let items = body_json(send(&app, "GET", "/api/items", None).await).await;
    assert_eq!(items["items"], json!(["◆ Jerry Rune III"]));
}

#[tokio::test]
async fn failed_catalog_reload_keeps_current_items() {
    let tmp = tempdir().unwrap();
    // No items directory exists
    let TestApp { app, .. } = test_app(tmp.path(), catalog_snapshot());

    let refresh = body_json(send(&app, "POST", "/api/refresh-items", None).await).await;
    assert_eq!(refresh, json!({ "items": ["Hyperion"], "cached": true }));
}

#[tokio::test]
async fn health_status_reports_cache_and_catalog() {
    let tmp = tempdir().unwrap();
    let TestApp { app, .. } = test_app(tmp.path(), catalog_snapshot());

    send(&app, "GET", "/api/price/Hyperion", None).await;

    let status = body_json(send(&app, "GET", "/api/health/status", None).await).await;
    assert_eq!(status["cachedPrices"], json!(1));
    assert_eq!(status["catalogItems"], json!(1));
    assert_eq!(status["catalogFresh"], json!(false));
}
