use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use gedung_booking::{
    app,
    config::Config,
    services::credentials::StaticCredentials,
    store::{MemoryStore, Repository},
    AppState,
};

fn test_app(enable_auth: bool) -> Router {
    let mut config = Config::for_tests();
    config.features.enable_auth = enable_auth;
    let store: Arc<dyn Repository> = Arc::new(MemoryStore::new());
    let credentials = StaticCredentials::from_config(&config.accounts).unwrap();
    app(AppState::new(store, config, Arc::new(credentials)))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, extra: &[(&str, &str)]) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in extra {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply { status, headers, body }
}

async fn create_room(app: &Router, name: &str) -> String {
    let reply = send(
        app,
        Method::POST,
        "/api/rooms",
        Some(json!({ "nama": name, "lokasi": "Lantai 2", "kapasitas": "150", "fasilitas": "AC, Proyektor" })),
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["data"]["fasilitas"], json!(["AC", "Proyektor"]));
    reply.body["data"]["_id"].as_str().unwrap().to_string()
}

fn booking_body(room_id: &str, durasi: i64) -> Value {
    json!({
        "nama_pemesan": "Andi",
        "nama_acara": "Pernikahan",
        "tanggal_booking": "2099-12-20",
        "waktu_mulai": "09:00",
        "waktu_selesai": "12:00",
        "id_ruangan": room_id,
        "telp": "08123",
        "alamat": "Jl. Kenanga 1",
        "durasi": durasi
    })
}

async fn create_booking(app: &Router, room_id: &str, durasi: i64) -> Value {
    let reply = send(app, Method::POST, "/api/bookings", Some(booking_body(room_id, durasi)), &[]).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body["data"].clone()
}

async fn booking_by_id(app: &Router, id: &str) -> Value {
    let reply = send(app, Method::GET, "/api/bookings", None, &[]).await;
    reply.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["_id"] == id)
        .cloned()
        .unwrap_or(Value::Null)
}

#[tokio::test]
async fn booking_payment_and_verification_flow() {
    let app = test_app(false);
    let room_id = create_room(&app, "Aula Utama").await;

    let booking = create_booking(&app, &room_id, 3).await;
    assert_eq!(booking["total_harga"], 3_000_000);
    assert_eq!(booking["dp_minimal"], 900_000);
    assert_eq!(booking["status"], "Pending");
    assert_eq!(booking["statusBayar"], "Unpaid");
    let booking_id = booking["_id"].as_str().unwrap().to_string();

    let reply = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "id": booking_id, "jumlahBayar": "1000000" })),
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(booking_by_id(&app, &booking_id).await["statusBayar"], "Deposit");

    let reply = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "id": booking_id, "jumlahBayar": 3000000 })),
        &[],
    )
    .await;
    let payment_id = reply.body["data"]["_id"].as_str().unwrap().to_string();
    let current = booking_by_id(&app, &booking_id).await;
    assert_eq!(current["statusBayar"], "Paid");
    assert_eq!(current["pembayaran"], 3_000_000);
    assert_eq!(current["ruangan"]["nama"], "Aula Utama");

    let reply = send(&app, Method::PUT, "/api/payments", Some(json!({ "id": payment_id })), &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(booking_by_id(&app, &booking_id).await["statusPembayaran"], "Verified");

    let payments = send(&app, Method::GET, "/api/payments", None, &[]).await;
    assert_eq!(payments.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(payments.body["data"][0]["ruanganInfo"]["nama"], "Aula Utama");
}

#[tokio::test]
async fn deleting_a_payment_resets_the_booking() {
    let app = test_app(false);
    let room_id = create_room(&app, "Studio").await;
    let booking = create_booking(&app, &room_id, 2).await;
    let booking_id = booking["_id"].as_str().unwrap().to_string();

    let reply = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "id": booking_id, "jumlahBayar": 2000000, "sumber_pembayaran": "transfer" })),
        &[],
    )
    .await;
    let payment_id = reply.body["data"]["_id"].as_str().unwrap().to_string();
    assert_eq!(booking_by_id(&app, &booking_id).await["statusBayar"], "Paid");

    let reply = send(&app, Method::DELETE, &format!("/api/payments?id={payment_id}"), None, &[]).await;
    assert_eq!(reply.status, StatusCode::OK);

    let current = booking_by_id(&app, &booking_id).await;
    assert_eq!(current["pembayaran"], 0);
    assert_eq!(current["statusBayar"], "Unpaid");
    assert_eq!(current["tanggalBayar"], Value::Null);
    assert_eq!(current["sumber_pembayaran"], Value::Null);

    let reply = send(&app, Method::DELETE, &format!("/api/payments?id={payment_id}"), None, &[]).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completing_twice_archives_once() {
    let app = test_app(false);
    let room_id = create_room(&app, "Aula").await;
    let booking = create_booking(&app, &room_id, 3).await;
    let id = booking["_id"].as_str().unwrap().to_string();

    let reply = send(&app, Method::POST, &format!("/api/bookings/{id}/complete"), None, &[]).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = send(&app, Method::PATCH, &format!("/api/bookings/{id}/approve"), None, &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["status"], "Approved");

    let first = send(&app, Method::POST, &format!("/api/bookings/{id}/complete"), None, &[]).await;
    assert_eq!(first.status, StatusCode::CREATED);
    let second = send(&app, Method::POST, &format!("/api/bookings/{id}/complete"), None, &[]).await;
    assert_eq!(second.status, StatusCode::OK);

    let history = send(&app, Method::GET, "/api/history", None, &[]).await;
    let rows = history.body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["booking_id"], id.as_str());
    assert_eq!(rows[0]["ruangan"]["nama"], "Aula");
    assert_eq!(booking_by_id(&app, &id).await, Value::Null);
}

#[tokio::test]
async fn rejecting_keeps_the_reason() {
    let app = test_app(false);
    let room_id = create_room(&app, "Aula").await;
    let booking = create_booking(&app, &room_id, 1).await;
    let id = booking["_id"].as_str().unwrap().to_string();

    let reply = send(
        &app,
        Method::PATCH,
        &format!("/api/bookings/{id}/reject"),
        Some(json!({ "alasan": "Tanggal sudah penuh" })),
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["keterangan_penolakan"], "Tanggal sudah penuh");

    let reply = send(
        &app,
        Method::PUT,
        "/api/bookings",
        Some(json!({ "_id": id, "status": "Disetujui" })),
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_booking_reports_missing_fields() {
    let app = test_app(false);
    let reply = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(json!({ "nama_pemesan": "Budi", "nama_acara": " " })),
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    let message = reply.body["message"].as_str().unwrap();
    assert!(message.starts_with("Field wajib: nama_acara, tanggal_booking"), "{message}");
    assert!(message.ends_with("durasi"), "{message}");

    let room_id = create_room(&app, "Aula").await;
    let reply = send(&app, Method::POST, "/api/bookings", Some(booking_body(&room_id, 9)), &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["message"], "Durasi harus antara 1 sampai 8 jam");

    let reply = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(booking_body("1f0c8a52-0000-4000-8000-000000000000", 2)),
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_gets_the_error_envelope() {
    let app = test_app(false);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/rooms")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn calendar_marks_full_days() {
    let app = test_app(false);
    let room_id = create_room(&app, "Aula").await;
    let booking = create_booking(&app, &room_id, 3).await;
    let id = booking["_id"].as_str().unwrap().to_string();
    create_booking(&app, &room_id, 2).await;

    let reply = send(&app, Method::GET, "/api/calendar?ruangan=Aula", None, &[]).await;
    assert_eq!(reply.body["data"]["status"]["2099-12-20"], "pending");
    assert_eq!(reply.body["data"]["kalender"]["2099-12-20"]["Aula"]["pending"], 2);

    send(&app, Method::PATCH, &format!("/api/bookings/{id}/approve"), None, &[]).await;
    let reply = send(&app, Method::GET, "/api/calendar", None, &[]).await;
    assert_eq!(reply.body["data"]["status"]["2099-12-20"], "full");
    assert_eq!(reply.body["data"]["kalender"]["2099-12-20"]["Aula"]["terisi"], 1);
    assert_eq!(reply.body["data"]["ruangan"], json!(["Aula"]));
}

async fn csrf_pair(app: &Router) -> (String, String) {
    let reply = send(app, Method::GET, "/api/csrf-token", None, &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    let token = reply.body["data"]["csrfToken"].as_str().unwrap().to_string();
    let set_cookie = reply.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    (token, cookie)
}

#[tokio::test]
async fn login_requires_a_valid_csrf_pair() {
    let app = test_app(false);
    let (token, cookie) = csrf_pair(&app).await;

    let creds = |token: &str| json!({ "csrfToken": token, "username": "admin", "password": "admin123" });

    let reply = send(&app, Method::POST, "/api/login", Some(creds(token.as_str())), &[]).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["message"], "Token CSRF tidak ditemukan");

    let reply = send(&app, Method::POST, "/api/login", Some(creds("abc-forged")), &[("cookie", cookie.as_str())]).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["message"], "Token CSRF tidak valid");

    let wrong = json!({ "csrfToken": token, "username": "admin", "password": "salah" });
    let reply = send(&app, Method::POST, "/api/login", Some(wrong), &[("cookie", cookie.as_str())]).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["message"], "Username atau password salah");

    let reply = send(&app, Method::POST, "/api/login", Some(creds(token.as_str())), &[("cookie", cookie.as_str())]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["role"], "admin");
    assert_eq!(reply.body["data"]["redirect"], "/dashboardadmin");
    let session = reply.body["data"]["token"].as_str().unwrap().to_string();

    let bearer = format!("Bearer {session}");
    let reply = send(&app, Method::GET, "/api/session", None, &[("authorization", bearer.as_str())]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["username"], "admin");
}

#[tokio::test]
async fn auth_gate_protects_staff_routes() {
    let app = test_app(true);

    let reply = send(&app, Method::GET, "/api/rooms", None, &[]).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let (token, cookie) = csrf_pair(&app).await;
    let login = json!({ "csrfToken": token, "username": "keuangan", "password": "keuangan123" });
    let reply = send(&app, Method::POST, "/api/login", Some(login), &[("cookie", cookie.as_str())]).await;
    assert_eq!(reply.body["data"]["redirect"], "/dashboardkeuangan");
    let bearer = format!("Bearer {}", reply.body["data"]["token"].as_str().unwrap());

    let reply = send(&app, Method::GET, "/api/rooms", None, &[("authorization", bearer.as_str())]).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = send(&app, Method::GET, "/health", None, &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn report_and_dashboard_summarise() {
    let app = test_app(false);
    let room_id = create_room(&app, "Aula").await;

    let body = json!([
        { "nama_pemesan": "Ika", "nama_acara": "Seminar", "tanggal_booking": "2024-03-01",
          "waktu_mulai": "08:00", "waktu_selesai": "10:00", "durasi": 2,
          "id_ruangan": room_id, "pembayaran": 2000000, "status": "Disetujui" },
        { "nama_pemesan": "Joko", "nama_acara": "Rapat", "tanggal_booking": "2024-03-02",
          "waktu_mulai": "08:00", "waktu_selesai": "09:00", "durasi": 1,
          "id_ruangan": room_id, "pembayaran": 300000 }
    ]);
    let reply = send(&app, Method::POST, "/api/history", Some(body), &[]).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["data"]["disimpan"], 2);

    let reply = send(&app, Method::POST, "/api/history", Some(json!([])), &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&app, Method::GET, "/api/report", None, &[]).await;
    assert_eq!(reply.body["totalPendapatan"], 2_300_000);
    assert_eq!(reply.body["data"].as_array().unwrap().len(), 2);

    let reply = send(&app, Method::GET, "/api/report?dari=2024-03-02", None, &[]).await;
    assert_eq!(reply.body["totalPendapatan"], 300_000);

    let reply = send(&app, Method::GET, "/api/dashboard", None, &[]).await;
    assert_eq!(reply.body["data"]["totalRuangan"], 1);
}

#[tokio::test]
async fn out_of_range_date_is_rejected_and_schedule_stays_up() {
    let app = test_app(false);
    let room_id = create_room(&app, "Aula").await;

    let mut body = booking_body(&room_id, 2);
    body["tanggal_booking"] = json!("-262143-01-01");
    body["status"] = json!("Disetujui");
    let reply = send(&app, Method::POST, "/api/bookings", Some(body), &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&app, Method::GET, "/api/bookings/schedule", None, &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"], json!([]));
}

#[tokio::test]
async fn verifying_an_older_payment_keeps_the_latest_figures() {
    let app = test_app(false);
    let room_id = create_room(&app, "Aula").await;
    let booking = create_booking(&app, &room_id, 3).await;
    let booking_id = booking["_id"].as_str().unwrap().to_string();

    let first = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "id": booking_id, "jumlahBayar": 1000000 })),
        &[],
    )
    .await;
    let first_id = first.body["data"]["_id"].as_str().unwrap().to_string();
    send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({ "id": booking_id, "jumlahBayar": 3000000 })),
        &[],
    )
    .await;

    let reply = send(&app, Method::PUT, "/api/payments", Some(json!({ "id": first_id })), &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["statusPembayaran"], "Verified");

    let current = booking_by_id(&app, &booking_id).await;
    assert_eq!(current["pembayaran"], 3_000_000);
    assert_eq!(current["statusBayar"], "Paid");
    assert_eq!(current["statusPembayaran"], "Unverified");
}
