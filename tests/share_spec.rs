use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use worry_tree::api;
use worry_tree::db::Database;
use worry_tree::lifecycle::AppMode;
use worry_tree::models::{MonsterColor, Position, Worry, WorryId, WorryState, MONSTER_COLORS};
use worry_tree::share::encoding;
use worry_tree::share::{BlobStoreClient, QrOptions, ShareCodec, ShareError, Strategy};
use worry_tree::store::WorryStore;

const ORIGIN: &str = "http://localhost:5173/";

// ============================================================
// Helpers
// ============================================================

/// Serve `app` on a free local port and return its base URL.
async fn spawn_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Serve a fresh in-memory blob store and return its blob URL.
async fn spawn_blob_store() -> String {
    let db = Database::open_memory().expect("Failed to open database");
    db.migrate().expect("Failed to migrate");
    let base = spawn_app(api::create_router(db)).await;
    format!("{}/api/jsonBlob", base)
}

/// A blob store that answers every write with `status` and no `Location`.
async fn spawn_broken_store(status: StatusCode) -> BlobStoreClient {
    let app = Router::new().route("/api/jsonBlob", post(move || async move { (status, "[]") }));
    let base = spawn_app(app).await;
    BlobStoreClient::new(format!("{}/api/jsonBlob", base), Duration::from_secs(5))
}

fn inline_codec(strategy: Strategy) -> ShareCodec {
    ShareCodec::new(ORIGIN, None).with_strategies(vec![strategy])
}

fn exam_worry() -> Worry {
    Worry {
        id: WorryId(1),
        text: "exam".to_string(),
        position: Position::new(20.04, 29.96, 5.0),
        color: MonsterColor::new("#ff7b7b"),
        state: WorryState::Pending,
    }
}

fn random_store(count: usize) -> WorryStore {
    let mut store = WorryStore::new();
    let mut rng = StdRng::seed_from_u64(42);
    for i in 0..count {
        store
            .add(&format!("걱정 {} & more = stuff?", i), &mut rng)
            .unwrap();
    }
    store
}

fn assert_same_tree(loaded: &[Worry], store: &WorryStore) {
    assert_eq!(loaded.len(), store.len());
    for (loaded, original) in loaded.iter().zip(store.iter()) {
        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.text, original.text);
        assert_eq!(loaded.color, original.color);
        assert_eq!(loaded.position, original.position.rounded());
        assert!(loaded.is_pending());
    }
}

// ============================================================
// Inline strategies
// ============================================================

#[tokio::test]
async fn inline_strategies_round_trip() {
    let store = random_store(12);

    for strategy in [Strategy::LzString, Strategy::Deflate, Strategy::Base64] {
        let codec = inline_codec(strategy);
        let link = codec.share(&store).await.expect("Failed to share");

        assert_eq!(link.strategy, strategy);
        assert!(link.is_self_contained());
        assert!(link.url.starts_with(ORIGIN));
        assert!(link.url.contains(&format!("{}=", strategy.param())));

        let loaded = codec.load(&link.url).await.expect("Failed to load");
        assert_same_tree(&loaded, &store);
    }
}

#[tokio::test]
async fn shared_exam_worry_comes_back_rounded() {
    let store: WorryStore = vec![exam_worry()].into_iter().collect();
    let codec = inline_codec(Strategy::LzString);

    let link = codec.share(&store).await.unwrap();
    let loaded = codec.load(&link.url).await.unwrap();

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, WorryId(1));
    assert_eq!(loaded[0].text, "exam");
    assert_eq!(loaded[0].color.as_str(), "#ff7b7b");
    assert_eq!(loaded[0].position, Position::new(20.0, 30.0, 5.0));
}

#[tokio::test]
async fn out_of_range_color_index_uses_first_palette_entry() {
    let value = encoding::base64_encode(r#"[[5,"exam",20,30,5,99],[6,"rent",20,30,5,-1]]"#);
    let codec = inline_codec(Strategy::Base64);

    let loaded = codec.load(&format!("?b64={}", value)).await.unwrap();

    assert_eq!(loaded[0].color.as_str(), MONSTER_COLORS[0]);
    assert_eq!(loaded[1].color.as_str(), MONSTER_COLORS[0]);
}

#[tokio::test]
async fn only_pending_worries_are_shared() {
    let mut store = random_store(3);
    let first = store.iter().next().unwrap().id;
    store.get_mut(first).unwrap().state = WorryState::Falling {
        comfort_text: "you prepared".to_string(),
    };

    let codec = inline_codec(Strategy::Deflate);
    let link = codec.share(&store).await.unwrap();
    let loaded = codec.load(&link.url).await.unwrap();

    assert_eq!(loaded.len(), 2);
    assert!(loaded.iter().all(|w| w.id != first));
}

#[tokio::test]
async fn empty_tree_cannot_be_shared() {
    let codec = inline_codec(Strategy::LzString);
    let result = codec.share(&WorryStore::new()).await;
    assert!(matches!(result, Err(ShareError::NothingToShare)));
}

#[tokio::test]
async fn truncated_link_yields_no_worries() {
    let store = random_store(4);
    let codec = inline_codec(Strategy::Base64);
    let link = codec.share(&store).await.unwrap();

    let cut = link.url.len() - 7;
    let result = codec.load(&link.url[..cut]).await;

    assert!(matches!(result, Err(ShareError::Malformed(_))));
}

#[tokio::test]
async fn payload_with_a_bad_tuple_is_rejected_whole() {
    let value = encoding::base64_encode(r#"[[1,"exam",20,30,5,0],[2,"rent",20,30]]"#);
    let result = inline_codec(Strategy::Base64)
        .load(&format!("?b64={}", value))
        .await;
    assert!(matches!(result, Err(ShareError::Malformed(_))));
}

#[tokio::test]
async fn oversized_id_is_rejected_instead_of_overflowing() {
    let value = encoding::base64_encode(
        r#"[[18446744073709551615,"exam",20,30,5,0],[1,"rent",20,30,5,0]]"#,
    );
    let result = inline_codec(Strategy::Base64)
        .open(&format!("?b64={}", value))
        .await;
    assert!(matches!(result, Err(ShareError::Malformed(_))));
}

#[tokio::test]
async fn link_without_payload_is_reported() {
    let result = inline_codec(Strategy::LzString)
        .load("http://localhost:5173/?foo=bar")
        .await;
    assert!(matches!(result, Err(ShareError::NoSharedPayload)));
}

#[tokio::test]
async fn opened_link_is_a_shared_view() {
    let store = random_store(2);
    let codec = inline_codec(Strategy::LzString);
    let link = codec.share(&store).await.unwrap();

    let tree = codec.open(&link.url).await.unwrap();

    assert_eq!(tree.mode(), AppMode::SharedView);
    assert_eq!(tree.store().len(), 2);
}

#[tokio::test]
async fn share_link_renders_a_qr_code() {
    let store = random_store(8);
    let link = inline_codec(Strategy::LzString).share(&store).await.unwrap();

    let png = link.qr_png(&QrOptions::default()).expect("Failed to render QR");
    let image = image::load_from_memory(&png).unwrap();

    assert_eq!(image.width(), 256);
    assert_eq!(image.height(), 256);
}

// ============================================================
// Remote store
// ============================================================

#[tokio::test]
async fn remote_store_link_carries_only_an_id() {
    let blob_url = spawn_blob_store().await;
    let client = BlobStoreClient::new(blob_url, Duration::from_secs(5));
    let codec = ShareCodec::new(ORIGIN, Some(client));
    let store = random_store(5);

    let link = codec.share(&store).await.expect("Failed to share");

    assert_eq!(link.strategy, Strategy::RemoteStore);
    assert!(!link.is_self_contained());
    assert!(link.url.contains("worryId="));
    assert!(!link.url.contains("data="));

    let loaded = codec.load(&link.url).await.expect("Failed to load");
    assert_same_tree(&loaded, &store);
}

#[tokio::test]
async fn unreachable_store_falls_back_to_lz_string() {
    let client = BlobStoreClient::new("http://127.0.0.1:9/api/jsonBlob", Duration::from_secs(2));
    let codec = ShareCodec::new(ORIGIN, Some(client));
    let store = random_store(3);

    let link = codec.share(&store).await.expect("Fallback should succeed");

    assert_eq!(link.strategy, Strategy::LzString);
    assert!(link.url.contains("data="));
    assert_same_tree(&codec.load(&link.url).await.unwrap(), &store);
}

#[tokio::test]
async fn rejecting_store_falls_back_to_lz_string() {
    let client = spawn_broken_store(StatusCode::INTERNAL_SERVER_ERROR).await;
    let codec = ShareCodec::new(ORIGIN, Some(client));
    let store = random_store(3);

    let link = codec.share(&store).await.expect("Fallback should succeed");

    assert_eq!(link.strategy, Strategy::LzString);
    assert_same_tree(&codec.load(&link.url).await.unwrap(), &store);
}

#[tokio::test]
async fn store_without_location_falls_back_to_lz_string() {
    let client = spawn_broken_store(StatusCode::CREATED).await;
    let codec = ShareCodec::new(ORIGIN, Some(client));
    let store = random_store(3);

    let link = codec.share(&store).await.expect("Fallback should succeed");

    assert_eq!(link.strategy, Strategy::LzString);
    assert!(link.url.contains("data="));
    assert_same_tree(&codec.load(&link.url).await.unwrap(), &store);
}

#[tokio::test]
async fn disabled_store_falls_back_to_lz_string() {
    let codec = ShareCodec::new(ORIGIN, None);
    let link = codec.share(&random_store(1)).await.unwrap();
    assert_eq!(link.strategy, Strategy::LzString);
}

#[tokio::test]
async fn unknown_remote_id_is_not_found() {
    let blob_url = spawn_blob_store().await;
    let codec = ShareCodec::new(
        ORIGIN,
        Some(BlobStoreClient::new(blob_url, Duration::from_secs(5))),
    );

    let result = codec
        .load("?worryId=6f1c2a4e-8d3b-4c2a-9e1f-0a1b2c3d4e5f")
        .await;

    assert!(matches!(result, Err(ShareError::NotFound(_))));
}

#[tokio::test]
async fn unreachable_store_fails_the_load() {
    let client = BlobStoreClient::new("http://127.0.0.1:9/api/jsonBlob", Duration::from_secs(2));
    let codec = ShareCodec::new(ORIGIN, Some(client));

    let result = codec.load("?worryId=abc123").await;

    assert!(matches!(result, Err(ShareError::Unreachable(_))));
}

#[tokio::test]
async fn remote_id_takes_precedence_over_inline_data() {
    let blob_url = spawn_blob_store().await;
    let client = BlobStoreClient::new(blob_url, Duration::from_secs(5));
    let id = client
        .create(r#"[[7,"remote",20,30,5,1]]"#.to_string())
        .await
        .unwrap();
    let inline = encoding::lz_compress(r#"[[8,"inline",20,30,5,1]]"#);
    let codec = ShareCodec::new(ORIGIN, Some(client));

    let loaded = codec
        .load(&format!("?data={}&worryId={}", inline, id))
        .await
        .unwrap();

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].text, "remote");
}
