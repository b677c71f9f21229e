use chrono::{Duration as ChronoDuration, Utc};
use freightdesk_auth::{JwtClaims, Role};
use freightdesk_core::{OfficeId, UserId};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

const JWT_SECRET: &str = "black-box-test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port with the
        // in-memory backend (USE_PERSISTENT_STORES unset).
        let app = freightdesk_api::app::build_app(JWT_SECRET.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: UserId, office_id: Option<OfficeId>, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        username: "tester".to_string(),
        office_id,
        role,
        issued_at: now - ChronoDuration::minutes(1),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn operator_jwt(office_id: Option<OfficeId>) -> String {
    mint_jwt(UserId::new(), office_id, Role::Operator)
}

fn admin_jwt() -> String {
    mint_jwt(UserId::new(), None, Role::GeneralAdmin)
}

async fn create_office(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> Value {
    let res = client
        .post(format!("{}/offices", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "address": "Av. Principal, local 4" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

fn office_id_of(office: &Value) -> OfficeId {
    office["id"].as_str().unwrap().parse().unwrap()
}

fn invoice_payload(destination_office_id: &str, sender_doc: &str) -> Value {
    json!({
        "sender": {
            "id_type": "V",
            "id_number": sender_doc,
            "name": "María Pérez",
            "phone": "0414-5550101"
        },
        "recipient": {
            "id_type": "J",
            "id_number": "J-30123456-7",
            "name": "Comercial El Llano C.A."
        },
        "destination_office_id": destination_office_id,
        "payment_type": "freight_prepaid",
        "payment_currency": "VES",
        "subtotal": "100.00",
        "tax": "16.00",
        "ipostel": "2.00",
        "total": "118.00",
        "items": [
            { "quantity": 2, "description": "Caja de repuestos", "weight": "12.50" }
        ]
    })
}

async fn issue_invoice(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    destination_office_id: &str,
    sender_doc: &str,
) -> Value {
    let res = client
        .post(format!("{}/invoices", base_url))
        .bearer_auth(token)
        .json(&invoice_payload(destination_office_id, sender_doc))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn get_json(client: &reqwest::Client, url: &str, token: &str) -> Value {
    let res = client.get(url).bearer_auth(token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

fn decimal_field(value: &Value, field: &str) -> Decimal {
    serde_json::from_value(value[field].clone()).unwrap()
}

#[tokio::test]
async fn health_does_not_require_auth() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_or_garbage_tokens_are_rejected() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/offices", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/offices", server.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_echoes_the_claims() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let user_id = UserId::new();
    let office_id = OfficeId::new();
    let token = mint_jwt(user_id, Some(office_id), Role::OfficeAdmin);

    let body = get_json(&client, &format!("{}/whoami", server.base_url), &token).await;
    assert_eq!(body["user_id"], user_id.to_string().as_str());
    assert_eq!(body["username"], "tester");
    assert_eq!(body["office_id"], office_id.to_string().as_str());
    assert_eq!(body["role"], "office_admin");
}

#[tokio::test]
async fn office_crud_round_trip() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = admin_jwt();

    let office = create_office(&client, &server.base_url, &token, "Caracas").await;
    let id = office["id"].as_str().unwrap().to_string();
    assert_eq!(office["name"], "Caracas");
    assert_eq!(office["next_invoice_number"], 1);

    let listed = get_json(&client, &format!("{}/offices", server.base_url), &token).await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let res = client
        .put(format!("{}/offices/{}", server.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "name": "Caracas Centro", "address": "Torre Norte, piso 2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Caracas Centro");

    let res = client
        .delete(format!("{}/offices/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/offices/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_office_name_is_a_conflict() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = admin_jwt();

    create_office(&client, &server.base_url, &token, "Valencia").await;

    let res = client
        .post(format!("{}/offices", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Valencia", "address": "otra sede" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = admin_jwt();

    let res = client
        .get(format!("{}/offices/not-a-uuid", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn issuance_assigns_sequential_numbers_per_office() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();

    let operator = operator_jwt(Some(office_id_of(&origin)));

    let first = issue_invoice(&client, &server.base_url, &operator, destination_id, "V-111").await;
    assert_eq!(first["invoice_number"], "A-000001");
    assert_eq!(first["payment_status"], "pending");
    assert_eq!(first["shipping_status"], "pending_dispatch");
    assert_eq!(decimal_field(&first, "total"), dec!(118.00));
    assert_eq!(first["items"].as_array().unwrap().len(), 1);

    let second = issue_invoice(&client, &server.base_url, &operator, destination_id, "V-222").await;
    assert_eq!(second["invoice_number"], "A-000002");

    // A different origin office numbers independently.
    let other_origin = create_office(&client, &server.base_url, &admin, "Zulia").await;
    let other_operator = operator_jwt(Some(office_id_of(&other_origin)));
    let third = issue_invoice(
        &client,
        &server.base_url,
        &other_operator,
        destination_id,
        "V-333",
    )
    .await;
    assert_eq!(third["invoice_number"], "Z-000001");
}

#[tokio::test]
async fn issuance_reuses_clients_by_identity_key() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let first = issue_invoice(&client, &server.base_url, &operator, destination_id, "V-999").await;

    // Same sender identity with a different display name: matched, not
    // duplicated, and the stored name is untouched.
    let mut payload = invoice_payload(destination_id, "V-999");
    payload["sender"]["name"] = json!("M. Pérez de Rodríguez");
    let res = client
        .post(format!("{}/invoices", server.base_url))
        .bearer_auth(&operator)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let second: Value = res.json().await.unwrap();
    assert_eq!(second["sender_id"], first["sender_id"]);

    let clients = get_json(&client, &format!("{}/clients", server.base_url), &admin).await;
    let items = clients["items"].as_array().unwrap();
    let senders: Vec<&Value> = items
        .iter()
        .filter(|c| c["id_number"] == "V-999")
        .collect();
    assert_eq!(senders.len(), 1);
    assert_eq!(senders[0]["name"], "María Pérez");
}

#[tokio::test]
async fn issuance_requires_an_origin_office() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/invoices", server.base_url))
        .bearer_auth(&operator_jwt(None))
        .json(&invoice_payload(destination_id, "V-111"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn rejected_issuance_leaves_no_trace() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let mut payload = invoice_payload(destination_id, "V-111");
    payload["items"][0]["quantity"] = json!(0);
    let res = client
        .post(format!("{}/invoices", server.base_url))
        .bearer_auth(&operator)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    // No client row, no invoice, no number burned.
    let clients = get_json(&client, &format!("{}/clients", server.base_url), &admin).await;
    assert!(clients["items"].as_array().unwrap().is_empty());

    let ok = issue_invoice(&client, &server.base_url, &operator, destination_id, "V-111").await;
    assert_eq!(ok["invoice_number"], "A-000001");
}

#[tokio::test]
async fn issuance_validates_referenced_records() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let ghost_office = uuid::Uuid::now_v7().to_string();
    let res = client
        .post(format!("{}/invoices", server.base_url))
        .bearer_auth(&operator)
        .json(&invoice_payload(&ghost_office, "V-111"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issuance_yields_distinct_numbers() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap().to_string();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let mut handles = Vec::new();
    for lane in 0..8 {
        let client = client.clone();
        let base_url = server.base_url.clone();
        let token = operator.clone();
        let destination_id = destination_id.clone();
        handles.push(tokio::spawn(async move {
            let doc = format!("V-{}", lane);
            let body =
                issue_invoice(&client, &base_url, &token, &destination_id, &doc).await;
            body["invoice_number"].as_str().unwrap().to_string()
        }));
    }

    let mut numbers = std::collections::BTreeSet::new();
    for handle in handles {
        numbers.insert(handle.await.unwrap());
    }

    let expected: std::collections::BTreeSet<String> =
        (1..=8).map(|n| format!("A-{:06}", n)).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn invoice_listing_respects_roles() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let foreign = create_office(&client, &server.base_url, &admin, "Zulia").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let origin_id = office_id_of(&origin);

    let op_one = mint_jwt(UserId::new(), Some(origin_id), Role::Operator);
    let op_two = mint_jwt(UserId::new(), Some(origin_id), Role::Operator);

    let mine = issue_invoice(&client, &server.base_url, &op_one, destination_id, "V-111").await;
    issue_invoice(&client, &server.base_url, &op_two, destination_id, "V-222").await;

    let listed = get_json(&client, &format!("{}/invoices", server.base_url), &op_one).await;
    let items = listed["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], mine["id"]);

    let office_admin = mint_jwt(UserId::new(), Some(origin_id), Role::OfficeAdmin);
    let listed = get_json(
        &client,
        &format!("{}/invoices", server.base_url),
        &office_admin,
    )
    .await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 2);

    let listed = get_json(&client, &format!("{}/invoices", server.base_url), &admin).await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 2);

    let outsider = mint_jwt(UserId::new(), Some(office_id_of(&foreign)), Role::Operator);
    let listed = get_json(&client, &format!("{}/invoices", server.base_url), &outsider).await;
    assert!(listed["items"].as_array().unwrap().is_empty());

    // Scoped detail read: another operator's invoice reads as absent.
    let res = client
        .get(format!(
            "{}/invoices/{}",
            server.base_url,
            mine["id"].as_str().unwrap()
        ))
        .bearer_auth(&op_two)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn payment_status_updates_are_scoped_to_the_creator() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let origin_id = office_id_of(&origin);

    let creator = mint_jwt(UserId::new(), Some(origin_id), Role::Operator);
    let stranger = mint_jwt(UserId::new(), Some(origin_id), Role::Operator);

    let invoice =
        issue_invoice(&client, &server.base_url, &creator, destination_id, "V-111").await;
    let invoice_url = format!(
        "{}/invoices/{}",
        server.base_url,
        invoice["id"].as_str().unwrap()
    );

    let res = client
        .patch(&invoice_url)
        .bearer_auth(&stranger)
        .json(&json!({ "payment_status": "paid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .patch(&invoice_url)
        .bearer_auth(&creator)
        .json(&json!({ "payment_status": "paid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["payment_status"], "paid");
}

async fn seed_dispatchable_manifest(
    client: &reqwest::Client,
    base_url: &str,
    admin: &str,
    operator: &str,
    destination_id: &str,
    plate: &str,
    manifest_number: &str,
) -> (Value, Vec<String>) {
    let res = client
        .post(format!("{}/vehicles", base_url))
        .bearer_auth(admin)
        .json(&json!({
            "license_plate": plate,
            "brand": "Iveco",
            "model": "Daily",
            "year": 2021,
            "capacity_kg": "3500.00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let vehicle: Value = res.json().await.unwrap();

    let res = client
        .post(format!("{}/manifests", base_url))
        .bearer_auth(admin)
        .json(&json!({
            "manifest_number": manifest_number,
            "vehicle_id": vehicle["id"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let manifest: Value = res.json().await.unwrap();
    assert_eq!(manifest["status"], "planned");

    let mut invoice_ids = Vec::new();
    for doc in ["V-701", "V-702"] {
        let invoice = issue_invoice(client, base_url, operator, destination_id, doc).await;
        invoice_ids.push(invoice["id"].as_str().unwrap().to_string());
    }

    (manifest, invoice_ids)
}

#[tokio::test]
async fn manifest_dispatch_and_finalize_lifecycle() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let (manifest, invoice_ids) = seed_dispatchable_manifest(
        &client,
        &server.base_url,
        &admin,
        &operator,
        destination_id,
        "A12BC3D",
        "MAN-001",
    )
    .await;
    let manifest_url = format!(
        "{}/manifests/{}",
        server.base_url,
        manifest["id"].as_str().unwrap()
    );

    let res = client
        .post(format!("{}/dispatch", manifest_url))
        .bearer_auth(&admin)
        .json(&json!({ "invoice_ids": invoice_ids }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "manifest dispatched");

    let detail = get_json(&client, &manifest_url, &admin).await;
    assert_eq!(detail["manifest"]["status"], "on_route");
    assert!(detail["manifest"]["departure_time"].is_string());
    let invoices = detail["invoices"].as_array().unwrap();
    assert_eq!(invoices.len(), 2);
    for invoice in invoices {
        assert_eq!(invoice["shipping_status"], "in_transit");
    }

    let vehicles = get_json(&client, &format!("{}/vehicles", server.base_url), &admin).await;
    assert_eq!(vehicles["items"][0]["status"], "on_route");

    // A dispatched manifest cannot go out again.
    let res = client
        .post(format!("{}/dispatch", manifest_url))
        .bearer_auth(&admin)
        .json(&json!({ "invoice_ids": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "already dispatched or finalized");

    let res = client
        .post(format!("{}/finalize_trip", manifest_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "trip finalized, invoices delivered");

    let detail = get_json(&client, &manifest_url, &admin).await;
    assert_eq!(detail["manifest"]["status"], "finalized");
    assert!(detail["manifest"]["arrival_time"].is_string());
    for invoice in detail["invoices"].as_array().unwrap() {
        assert_eq!(invoice["shipping_status"], "delivered");
    }

    let vehicles = get_json(&client, &format!("{}/vehicles", server.base_url), &admin).await;
    assert_eq!(vehicles["items"][0]["status"], "available");

    // Finalizing twice fails: the manifest is no longer on route.
    let res = client
        .post(format!("{}/finalize_trip", manifest_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn dispatch_is_all_or_nothing() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let (first_manifest, invoice_ids) = seed_dispatchable_manifest(
        &client,
        &server.base_url,
        &admin,
        &operator,
        destination_id,
        "A12BC3D",
        "MAN-001",
    )
    .await;

    let res = client
        .post(format!(
            "{}/manifests/{}/dispatch",
            server.base_url,
            first_manifest["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .json(&json!({ "invoice_ids": [invoice_ids[0]] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Second manifest on a second vehicle, trying to take one invoice
    // that is already in transit plus one that is fine.
    let (second_manifest, _) = seed_dispatchable_manifest(
        &client,
        &server.base_url,
        &admin,
        &operator,
        destination_id,
        "B45DE6F",
        "MAN-002",
    )
    .await;
    let second_url = format!(
        "{}/manifests/{}",
        server.base_url,
        second_manifest["id"].as_str().unwrap()
    );

    let res = client
        .post(format!("{}/dispatch", second_url))
        .bearer_auth(&admin)
        .json(&json!({ "invoice_ids": [invoice_ids[0], invoice_ids[1]] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "some invoices are not available for dispatch");

    // Nothing moved: the clean invoice is still pending and the second
    // manifest still planned.
    let detail = get_json(&client, &second_url, &admin).await;
    assert_eq!(detail["manifest"]["status"], "planned");

    let res = client
        .get(format!("{}/invoices/{}", server.base_url, invoice_ids[1]))
        .bearer_auth(&operator)
        .send()
        .await
        .unwrap();
    let invoice: Value = res.json().await.unwrap();
    assert_eq!(invoice["shipping_status"], "pending_dispatch");
}

#[tokio::test]
async fn dispatch_requires_an_available_vehicle() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let (first_manifest, invoice_ids) = seed_dispatchable_manifest(
        &client,
        &server.base_url,
        &admin,
        &operator,
        destination_id,
        "A12BC3D",
        "MAN-001",
    )
    .await;

    let res = client
        .post(format!(
            "{}/manifests/{}/dispatch",
            server.base_url,
            first_manifest["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .json(&json!({ "invoice_ids": invoice_ids }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Second manifest reusing the same (now on-route) vehicle.
    let res = client
        .post(format!("{}/manifests", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "manifest_number": "MAN-002",
            "vehicle_id": first_manifest["vehicle_id"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let second_manifest: Value = res.json().await.unwrap();

    let res = client
        .post(format!(
            "{}/manifests/{}/dispatch",
            server.base_url,
            second_manifest["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .json(&json!({ "invoice_ids": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("is not available"));
}

#[tokio::test]
async fn dispatch_validates_the_driver() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let (manifest, invoice_ids) = seed_dispatchable_manifest(
        &client,
        &server.base_url,
        &admin,
        &operator,
        destination_id,
        "A12BC3D",
        "MAN-001",
    )
    .await;

    let res = client
        .post(format!(
            "{}/manifests/{}/dispatch",
            server.base_url,
            manifest["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .json(&json!({
            "invoice_ids": invoice_ids,
            "driver_id": uuid::Uuid::now_v7()
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn expense_recording_and_scoping() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let office_a = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let office_b = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let op_a = operator_jwt(Some(office_id_of(&office_a)));
    let op_b = operator_jwt(Some(office_id_of(&office_b)));

    for (token, description) in [(&op_a, "Gasolina"), (&op_b, "Peaje")] {
        let res = client
            .post(format!("{}/expenses", server.base_url))
            .bearer_auth(token)
            .json(&json!({
                "description": description,
                "amount": "40.00",
                "category": "transporte"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let listed = get_json(&client, &format!("{}/expenses", server.base_url), &op_a).await;
    let items = listed["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["description"], "Gasolina");

    let listed = get_json(&client, &format!("{}/expenses", server.base_url), &admin).await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 2);

    // No office: nothing to record against, nothing to see.
    let floating = operator_jwt(None);
    let res = client
        .post(format!("{}/expenses", server.base_url))
        .bearer_auth(&floating)
        .json(&json!({ "description": "Caja chica", "amount": "5.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let listed = get_json(&client, &format!("{}/expenses", server.base_url), &floating).await;
    assert!(listed["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn audit_log_is_admin_only_and_newest_first() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    issue_invoice(&client, &server.base_url, &operator, destination_id, "V-111").await;

    let res = client
        .post(format!("{}/expenses", server.base_url))
        .bearer_auth(&operator)
        .json(&json!({ "description": "Gasolina", "amount": "40.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/audit-logs", server.base_url))
        .bearer_auth(&operator)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let listed = get_json(&client, &format!("{}/audit-logs", server.base_url), &admin).await;
    let items = listed["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["action"], "Expense recorded");
    assert_eq!(items[1]["action"], "Invoice issued");
    assert!(items[1]["details"]
        .as_str()
        .unwrap()
        .contains("A-000001"));
}

#[tokio::test]
async fn company_info_defaults_and_partial_update() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let info = get_json(&client, &format!("{}/company-info", server.base_url), &admin).await;
    assert_eq!(decimal_field(&info, "cost_per_kg"), dec!(1.00));
    assert_eq!(decimal_field(&info, "tax_rate"), dec!(16.00));

    let res = client
        .post(format!("{}/company-info", server.base_url))
        .bearer_auth(&operator_jwt(Some(OfficeId::new())))
        .json(&json!({ "name": "Encomiendas del Centro" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{}/company-info", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Encomiendas del Centro", "tax_rate": "8.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Encomiendas del Centro");
    assert_eq!(decimal_field(&updated, "tax_rate"), dec!(8.00));
    // Untouched fields keep their values.
    assert_eq!(decimal_field(&updated, "cost_per_kg"), dec!(1.00));
    assert_eq!(decimal_field(&updated, "bcv_rate"), dec!(36.50));
}

#[tokio::test]
async fn settings_reference_data_round_trip() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let res = client
        .post(format!("{}/settings/shipping-types", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Terrestre" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let shipping_type: Value = res.json().await.unwrap();

    let res = client
        .post(format!("{}/settings/shipping-types", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Terrestre" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(format!("{}/settings/payment-methods", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Pago Móvil Banesco",
            "kind": "mobile_payment",
            "bank_name": "Banesco",
            "phone": "0414-5550101",
            "beneficiary_id": "J-30123456-7"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let method: Value = res.json().await.unwrap();
    assert_eq!(method["kind"], "mobile_payment");

    for path in ["settings/categories", "settings/expense-categories"] {
        let res = client
            .post(format!("{}/{}", server.base_url, path))
            .bearer_auth(&admin)
            .json(&json!({ "name": "General" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let listed = get_json(
        &client,
        &format!("{}/settings/shipping-types", server.base_url),
        &admin,
    )
    .await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let res = client
        .delete(format!(
            "{}/settings/shipping-types/{}",
            server.base_url,
            shipping_type["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!(
            "{}/settings/shipping-types/{}",
            server.base_url,
            shipping_type["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_reflects_current_month_activity() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let origin = create_office(&client, &server.base_url, &admin, "Aragua").await;
    let destination = create_office(&client, &server.base_url, &admin, "Barinas").await;
    let destination_id = destination["id"].as_str().unwrap();
    let operator = operator_jwt(Some(office_id_of(&origin)));

    let invoice =
        issue_invoice(&client, &server.base_url, &operator, destination_id, "V-111").await;

    let res = client
        .post(format!("{}/expenses", server.base_url))
        .bearer_auth(&operator)
        .json(&json!({ "description": "Gasolina", "amount": "40.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let stats = get_json(
        &client,
        &format!("{}/dashboard/stats", server.base_url),
        &admin,
    )
    .await;
    assert_eq!(decimal_field(&stats, "total_revenue_month"), dec!(118.00));
    assert_eq!(decimal_field(&stats, "total_expenses_month"), dec!(40.00));
    assert_eq!(decimal_field(&stats, "net_income_month"), dec!(78.00));
    assert_eq!(stats["shipping_status_counts"]["pending_dispatch"], 1);
    assert_eq!(stats["shipping_status_counts"]["in_transit"], 0);

    // Voided invoices drop out of revenue but keep their status count.
    let res = client
        .patch(format!(
            "{}/invoices/{}",
            server.base_url,
            invoice["id"].as_str().unwrap()
        ))
        .bearer_auth(&operator)
        .json(&json!({ "payment_status": "voided" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let stats = get_json(
        &client,
        &format!("{}/dashboard/stats", server.base_url),
        &admin,
    )
    .await;
    assert_eq!(decimal_field(&stats, "total_revenue_month"), dec!(0));
    assert_eq!(stats["shipping_status_counts"]["pending_dispatch"], 1);
}

#[tokio::test]
async fn suppliers_and_assets_round_trip() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = admin_jwt();

    let res = client
        .post(format!("{}/suppliers", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Repuestos La Victoria",
            "rif": "J-40123456-1",
            "phone": "0244-5550101"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let supplier: Value = res.json().await.unwrap();

    let res = client
        .put(format!(
            "{}/suppliers/{}",
            server.base_url,
            supplier["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Repuestos La Victoria C.A." }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/asset-categories", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Equipos de oficina" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let category: Value = res.json().await.unwrap();

    let res = client
        .post(format!("{}/assets", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Impresora fiscal",
            "category_id": category["id"],
            "purchase_date": "2026-02-14",
            "purchase_value": "350.00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let asset: Value = res.json().await.unwrap();
    assert_eq!(asset["category_id"], category["id"]);

    let listed = get_json(&client, &format!("{}/assets", server.base_url), &admin).await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);
}
