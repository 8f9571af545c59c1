use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde_json::json;

use bookwell_api::app::{build_app_with, services::AppServices};
use bookwell_api::identity::{IdentityAdapter, IdentityClaims, JwtIdentityAdapter};
use bookwell_auth::{
    DenialPolicy, PrincipalId, RoleKind, RoleStore, ScopeConflictPolicy, TenantScopeFilter,
};
use bookwell_booking::{Appointment, Center};
use bookwell_core::{AppointmentId, TenantId};
use bookwell_infra::{InMemoryRoleStore, InMemoryScopedStore, ScopedStore};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    roles: Arc<InMemoryRoleStore>,
    centers: Arc<InMemoryScopedStore<Center>>,
    appointments: Arc<InMemoryScopedStore<Appointment>>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(ScopeConflictPolicy::Deny).await
    }

    async fn spawn_with(scope_conflict: ScopeConflictPolicy) -> Self {
        let roles = Arc::new(InMemoryRoleStore::new());
        let centers = Arc::new(InMemoryScopedStore::<Center>::new());
        let appointments = Arc::new(InMemoryScopedStore::<Appointment>::new());

        let role_store: Arc<dyn RoleStore> = roles.clone();
        let center_store: Arc<dyn ScopedStore<Center>> = centers.clone();
        let appointment_store: Arc<dyn ScopedStore<Appointment>> = appointments.clone();
        let services = AppServices::new(role_store, center_store, appointment_store)
            .with_policies(scope_conflict, DenialPolicy::new("/login", "/"));
        let identity: Arc<dyn IdentityAdapter> =
            Arc::new(JwtIdentityAdapter::new(JWT_SECRET.as_bytes()));

        // Same router as prod, bound to an ephemeral port.
        let app = build_app_with(Arc::new(services), identity);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            roles,
            centers,
            appointments,
            client,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn seed_center(&self, name: &str) -> Center {
        let center = Center::register(name, Utc::now()).unwrap();
        assert!(self.centers.insert(TenantScopeFilter::All, center.clone()).await.unwrap());
        center
    }

    async fn seed_appointment(&self, center: &Center, patient: &str) -> Appointment {
        let appointment =
            Appointment::book(center.id, patient, Utc::now() + ChronoDuration::days(1)).unwrap();
        assert!(
            self.appointments
                .insert(TenantScopeFilter::All, appointment.clone())
                .await
                .unwrap()
        );
        appointment
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(principal_id: PrincipalId) -> String {
    let now = Utc::now();
    let claims = IdentityClaims {
        sub: principal_id,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn location(res: &reqwest::Response) -> &str {
    res.headers().get(LOCATION).unwrap().to_str().unwrap()
}

fn item_ids(body: &serde_json::Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_redirects_to_login() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/admin/centers", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn invalid_token_redirects_to_login() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/admin/whoami", Some("not-a-jwt")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn principal_without_role_redirects_to_landing() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(PrincipalId::new());

    let res = srv.get("/admin/centers", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn staff_is_kept_off_the_admin_surface() {
    let srv = TestServer::spawn().await;
    let center = srv.seed_center("North").await;
    let staff = PrincipalId::new();
    srv.roles.grant(staff, RoleKind::Staff, Some(center.id));
    let token = mint_jwt(staff);

    for path in ["/admin/centers".to_string(), format!("/admin/centers/{}", center.id)] {
        let res = srv.get(&path, Some(&token)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
    }
}

#[tokio::test]
async fn whoami_reports_effective_role() {
    let srv = TestServer::spawn().await;
    let center = srv.seed_center("North").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(center.id));

    let res = srv.get("/admin/whoami", Some(&mint_jwt(admin))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["principal_id"], admin.to_string());
    assert_eq!(body["role"], "center_admin");
    assert_eq!(body["center_id"], center.id.to_string());
}

#[tokio::test]
async fn center_admin_lists_only_own_center() {
    let srv = TestServer::spawn().await;
    let own = srv.seed_center("North").await;
    let _other = srv.seed_center("South").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(own.id));

    let res = srv.get("/admin/centers", Some(&mint_jwt(admin))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item_ids(&body), vec![own.id.to_string()]);
}

#[tokio::test]
async fn super_admin_sees_every_center() {
    let srv = TestServer::spawn().await;
    let a = srv.seed_center("North").await;
    let b = srv.seed_center("South").await;
    let root = PrincipalId::new();
    srv.roles.grant(root, RoleKind::SuperAdmin, None);
    let token = mint_jwt(root);

    let res = srv.get("/admin/centers", Some(&token)).await;
    let body: serde_json::Value = res.json().await.unwrap();
    let mut ids = item_ids(&body);
    ids.sort();
    let mut expected = vec![a.id.to_string(), b.id.to_string()];
    expected.sort();
    assert_eq!(ids, expected);

    let appt = srv.seed_appointment(&b, "Grace Hopper").await;
    let res = srv.get(&format!("/admin/appointments/{}", appt.id), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn foreign_appointment_is_indistinguishable_from_missing() {
    let srv = TestServer::spawn().await;
    let own = srv.seed_center("North").await;
    let other = srv.seed_center("South").await;
    let foreign = srv.seed_appointment(&other, "Grace Hopper").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(own.id));
    let token = mint_jwt(admin);

    let foreign_res = srv
        .get(&format!("/admin/appointments/{}", foreign.id), Some(&token))
        .await;
    let missing_res = srv
        .get(&format!("/admin/appointments/{}", AppointmentId::new()), Some(&token))
        .await;
    let malformed_res = srv.get("/admin/appointments/not-a-uuid", Some(&token)).await;

    assert_eq!(foreign_res.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing_res.status(), StatusCode::NOT_FOUND);
    assert_eq!(malformed_res.status(), StatusCode::NOT_FOUND);

    let foreign_body = foreign_res.bytes().await.unwrap();
    let missing_body = missing_res.bytes().await.unwrap();
    let malformed_body = malformed_res.bytes().await.unwrap();
    assert_eq!(foreign_body, missing_body);
    assert_eq!(foreign_body, malformed_body);
}

#[tokio::test]
async fn foreign_center_is_not_found() {
    let srv = TestServer::spawn().await;
    let own = srv.seed_center("North").await;
    let other = srv.seed_center("South").await;
    srv.seed_appointment(&other, "Grace Hopper").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(own.id));
    let token = mint_jwt(admin);

    let res = srv.get(&format!("/admin/centers/{}", other.id), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .get(&format!("/admin/centers/{}/appointments", other.id), Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv.get(&format!("/admin/centers/{}", own.id), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_grants_resolve_to_single_center_admin() {
    let srv = TestServer::spawn().await;
    let center = srv.seed_center("North").await;
    let appt = srv.seed_appointment(&center, "Ada Lovelace").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(center.id));
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(center.id));
    let token = mint_jwt(admin);

    let res = srv
        .get(&format!("/admin/centers/{}/appointments", center.id), Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item_ids(&body), vec![appt.id.to_string()]);
}

#[tokio::test]
async fn conflicting_center_grants_fail_closed_by_default() {
    let srv = TestServer::spawn().await;
    let a = srv.seed_center("North").await;
    let b = srv.seed_center("South").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(a.id));
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(b.id));

    let res = srv.get("/admin/centers", Some(&mint_jwt(admin))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn conflicting_center_grants_use_most_recent_when_configured() {
    let srv = TestServer::spawn_with(ScopeConflictPolicy::MostRecent).await;
    let a = srv.seed_center("North").await;
    let b = srv.seed_center("South").await;
    let admin = PrincipalId::new();
    let now = Utc::now();
    srv.roles
        .grant_at(admin, RoleKind::CenterAdmin, Some(a.id), now - ChronoDuration::hours(1));
    srv.roles.grant_at(admin, RoleKind::CenterAdmin, Some(b.id), now);

    let res = srv.get("/admin/centers", Some(&mint_jwt(admin))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item_ids(&body), vec![b.id.to_string()]);
}

#[tokio::test]
async fn deactivation_applies_to_the_next_request() {
    let srv = TestServer::spawn().await;
    let center = srv.seed_center("North").await;
    let admin = PrincipalId::new();
    let grant = srv.roles.grant(admin, RoleKind::CenterAdmin, Some(center.id));
    let token = mint_jwt(admin);

    let res = srv.get("/admin/centers", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);

    assert!(srv.roles.deactivate(grant));

    let res = srv.get("/admin/centers", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn only_super_admin_registers_centers() {
    let srv = TestServer::spawn().await;
    let center = srv.seed_center("North").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(center.id));
    let root = PrincipalId::new();
    srv.roles.grant(root, RoleKind::SuperAdmin, None);

    let res = srv
        .client
        .post(srv.url("/admin/centers"))
        .bearer_auth(mint_jwt(admin))
        .json(&json!({ "name": "East" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    let res = srv
        .client
        .post(srv.url("/admin/centers"))
        .bearer_auth(mint_jwt(root))
        .json(&json!({ "name": "East" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "East");

    let ids = srv.centers.list(TenantScopeFilter::All).await.unwrap();
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn center_admin_books_and_cancels_own_appointments() {
    let srv = TestServer::spawn().await;
    let center = srv.seed_center("North").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(center.id));
    let token = mint_jwt(admin);

    let res = srv
        .client
        .post(srv.url(&format!("/admin/centers/{}/appointments", center.id)))
        .bearer_auth(&token)
        .json(&json!({
            "patient_name": "Ada Lovelace",
            "starts_at": (Utc::now() + ChronoDuration::days(2)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["center_id"], center.id.to_string());

    let res = srv
        .client
        .patch(srv.url(&format!("/admin/appointments/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "cancelled");

    let res = srv
        .client
        .patch(srv.url(&format!("/admin/appointments/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn foreign_appointments_cannot_be_changed_or_deleted() {
    let srv = TestServer::spawn().await;
    let own = srv.seed_center("North").await;
    let other = srv.seed_center("South").await;
    let foreign = srv.seed_appointment(&other, "Grace Hopper").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(own.id));
    let token = mint_jwt(admin);

    let res = srv
        .client
        .patch(srv.url(&format!("/admin/appointments/{}", foreign.id)))
        .bearer_auth(&token)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .delete(srv.url(&format!("/admin/appointments/{}", foreign.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .post(srv.url(&format!("/admin/centers/{}/appointments", other.id)))
        .bearer_auth(&token)
        .json(&json!({
            "patient_name": "Mallory",
            "starts_at": Utc::now().to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let stored = srv
        .appointments
        .get(TenantScopeFilter::All, foreign.id)
        .await
        .unwrap();
    assert_eq!(stored, Some(foreign));
    assert_eq!(
        srv.appointments
            .list_for_tenant(TenantScopeFilter::All, other.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn own_appointment_can_be_deleted() {
    let srv = TestServer::spawn().await;
    let center = srv.seed_center("North").await;
    let appt = srv.seed_appointment(&center, "Ada Lovelace").await;
    let admin = PrincipalId::new();
    srv.roles.grant(admin, RoleKind::CenterAdmin, Some(center.id));
    let token = mint_jwt(admin);

    let res = srv
        .client
        .delete(srv.url(&format!("/admin/appointments/{}", appt.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.get(&format!("/admin/appointments/{}", appt.id), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_center_id_is_not_found_for_super_admin() {
    let srv = TestServer::spawn().await;
    let root = PrincipalId::new();
    srv.roles.grant(root, RoleKind::SuperAdmin, None);

    let res = srv
        .get(&format!("/admin/centers/{}", TenantId::new()), Some(&mint_jwt(root)))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "not_found", "message": "not found" }));
}
