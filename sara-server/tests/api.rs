use std::{net::SocketAddr, sync::Arc};

use sara_care::{Care, CareConfig, Database, MemoryDatabase};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct TestServer {
    addr: SocketAddr,
    _upload_dir: TempDir,
}

struct Response {
    status: u16,
    body: String,
}

impl Response {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

async fn spawn_server() -> TestServer {
    spawn_server_with(MemoryDatabase::new()).await
}

async fn spawn_server_with<Db>(database: Db) -> TestServer
where
    Db: Database + 'static,
{
    let upload_dir = tempfile::tempdir().expect("tempdir");
    let care = Care::new(
        database,
        CareConfig {
            upload_dir: upload_dir.path().to_path_buf(),
            ..CareConfig::new("integration-secret")
        },
    );
    let app = sara_server::app(Arc::new(care));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    TestServer {
        addr,
        _upload_dir: upload_dir,
    }
}

impl TestServer {
    async fn send_raw(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        content_type: Option<&str>,
        body: &[u8],
    ) -> Response {
        let addr = self.addr;
        let mut stream = tokio::net::TcpStream::connect(addr)
            .await
            .expect("connect server");

        let mut head = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
        for (name, value) in headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        if let Some(content_type) = content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

        stream.write_all(head.as_bytes()).await.expect("write head");
        stream.write_all(body).await.expect("write body");

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .expect("read response");
        let (head, body) = response
            .split_once("\r\n\r\n")
            .expect("http response separator");
        let status = head
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|s| s.parse::<u16>().ok())
            .expect("status");

        Response {
            status,
            body: body.to_string(),
        }
    }

    async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let bearer = token.map(|t| format!("Bearer {t}"));
        let headers: Vec<_> = bearer
            .iter()
            .map(|b| ("Authorization", b.as_str()))
            .collect();

        self.send_raw("GET", path, &headers, None, &[]).await
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        let bearer = token.map(|t| format!("Bearer {t}"));
        let headers: Vec<_> = bearer
            .iter()
            .map(|b| ("Authorization", b.as_str()))
            .collect();

        self.send_raw(
            "POST",
            path,
            &headers,
            Some("application/json"),
            body.to_string().as_bytes(),
        )
        .await
    }

    /// Registers and logs in a user, returning its id and bearer token
    async fn user(&self, email: &str, role: &str) -> (String, String) {
        let registered = self
            .post(
                "/api/auth/register",
                None,
                json!({ "email": email, "password": "correct horse", "name": "Someone", "role": role }),
            )
            .await;
        assert_eq!(registered.status, 200, "{}", registered.body);

        let login = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": "correct horse" }),
            )
            .await;
        assert_eq!(login.status, 200, "{}", login.body);

        let id = registered.json()["id"].as_str().unwrap().to_string();
        let token = login.json()["access_token"].as_str().unwrap().to_string();

        (id, token)
    }

    /// Creates a caretaker and a patient centered on 0,0 with the default radius
    async fn patient(&self, email: &str) -> (String, String) {
        let (caretaker_id, token) = self.user(email, "caretaker").await;

        let patient = self
            .post(
                "/api/patients",
                Some(&token),
                json!({
                    "name": "Pat",
                    "caretaker_id": caretaker_id,
                    "safe_center_lat": 0.0,
                    "safe_center_lng": 0.0
                }),
            )
            .await;
        assert_eq!(patient.status, 200, "{}", patient.body);

        let patient_id = patient.json()["id"].as_str().unwrap().to_string();

        (token, patient_id)
    }
}

// One degree of latitude is about 111 195 m
fn meters_north(meters: f64) -> f64 {
    meters / 111_195.
}

#[tokio::test]
async fn health_and_docs() {
    let server = spawn_server().await;

    let health = server.get("/health", None).await;
    assert_eq!(health.status, 200);
    assert_eq!(health.json(), json!({ "status": "ok" }));

    let docs = server.get("/api.json", None).await;
    assert_eq!(docs.status, 200);
    assert!(docs.json()["paths"]["/api/locations/ping"].is_object());
}

#[tokio::test]
async fn registration_and_login() {
    let server = spawn_server().await;
    let (_, token) = server.user("ann@example.com", "patient").await;
    assert!(!token.is_empty());

    let duplicate = server
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "ann@example.com", "password": "something else", "name": "Ann", "role": "caretaker" }),
        )
        .await;
    assert_eq!(duplicate.status, 400);

    let wrong_password = server
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ann@example.com", "password": "incorrect" }),
        )
        .await;
    assert_eq!(wrong_password.status, 401);

    let bad_email = server
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "not-an-email", "password": "correct horse", "name": "Bo", "role": "patient" }),
        )
        .await;
    assert_eq!(bad_email.status, 422);

    let bad_role = server
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "bo@example.com", "password": "correct horse", "name": "Bo", "role": "admin" }),
        )
        .await;
    assert_eq!(bad_role.status, 422);

    let short_password = server
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "cy@example.com", "password": "pw", "name": "", "role": "patient" }),
        )
        .await;
    assert_eq!(short_password.status, 200, "{}", short_password.body);
}

#[tokio::test]
async fn routes_are_gated() {
    let server = spawn_server().await;
    let (_, patient_token) = server.user("pat@example.com", "patient").await;

    let missing = server.get("/api/patients", None).await;
    assert_eq!(missing.status, 401);

    let garbage = server.get("/api/patients", Some("not.a.token")).await;
    assert_eq!(garbage.status, 401);

    let mut tampered = patient_token.clone();
    tampered.insert_str(tampered.find('.').unwrap() + 1, "e30");
    let tampered = server.get("/api/patients", Some(&tampered)).await;
    assert_eq!(tampered.status, 401);

    let forbidden = server.get("/api/patients", Some(&patient_token)).await;
    assert_eq!(forbidden.status, 403);

    // Patients may still use routes that only need a bearer token
    let alerts = server
        .get(
            &format!("/api/locations/alerts/{}", uuid::Uuid::new_v4()),
            Some(&patient_token),
        )
        .await;
    assert_eq!(alerts.status, 200);
    assert_eq!(alerts.json(), json!([]));
}

#[tokio::test]
async fn pings_raise_geofence_alerts() {
    let server = spawn_server().await;
    let (token, patient_id) = server.patient("carol@example.com").await;

    let inside = server
        .post(
            "/api/locations/ping",
            Some(&token),
            json!({ "patient_id": patient_id, "lat": meters_north(100.), "lng": 0.0 }),
        )
        .await;
    assert_eq!(inside.status, 200);
    assert_eq!(inside.json(), json!({ "ok": true }));

    let alerts_path = format!("/api/locations/alerts/{patient_id}");
    assert_eq!(server.get(&alerts_path, Some(&token)).await.json(), json!([]));

    // Just past 200 m, so the excess floors to 50 rather than 49
    let outside = server
        .post(
            "/api/locations/ping",
            Some(&token),
            json!({ "patient_id": patient_id, "lat": meters_north(200.4), "lng": 0.0 }),
        )
        .await;
    assert_eq!(outside.status, 200);

    let alerts = server.get(&alerts_path, Some(&token)).await.json();
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["type"], "geofence_breach");
    assert_eq!(alerts[0]["message"], "Patient left safe zone by 50 m");
    assert_eq!(alerts[0]["resolved"], false);

    let latest = server
        .get(&format!("/api/locations/latest/{patient_id}"), Some(&token))
        .await;
    assert_eq!(latest.status, 200);
    assert_eq!(latest.json()["patient_id"], patient_id.as_str());

    // Coordinates are stored as sent
    let off_the_map = server
        .post(
            "/api/locations/ping",
            Some(&token),
            json!({ "patient_id": patient_id, "lat": 120.0, "lng": 200.0 }),
        )
        .await;
    assert_eq!(off_the_map.status, 200, "{}", off_the_map.body);
}

#[tokio::test]
async fn device_readings_raise_one_alert() {
    let server = spawn_server().await;
    let (token, patient_id) = server.patient("carol@example.com").await;

    let device = server
        .post(
            "/api/devices/register",
            Some(&token),
            json!({ "patient_id": patient_id, "device_name": "Watch" }),
        )
        .await;
    assert_eq!(device.status, 200);
    let device_token = device.json()["device_token"].as_str().unwrap().to_string();
    assert_eq!(device_token.len(), 32);

    let reading = json!({ "patient_id": patient_id, "heart_rate": 130, "body_temp": 39.0, "spo2": 95 });

    let unknown = server
        .send_raw(
            "POST",
            "/api/vitals",
            &[("device-token", "0123456789abcdef0123456789abcdef")],
            Some("application/json"),
            reading.to_string().as_bytes(),
        )
        .await;
    assert_eq!(unknown.status, 401);

    let latest_path = format!("/api/vitals/latest/{patient_id}");
    assert_eq!(server.get(&latest_path, None).await.status, 404);

    let accepted = server
        .send_raw(
            "POST",
            "/api/vitals",
            &[("device-token", device_token.as_str())],
            Some("application/json"),
            reading.to_string().as_bytes(),
        )
        .await;
    assert_eq!(accepted.status, 200, "{}", accepted.body);
    assert_eq!(accepted.json()["heart_rate"], 130);

    let alerts = server
        .get(&format!("/api/locations/alerts/{patient_id}"), Some(&token))
        .await
        .json();
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["type"], "vital_spike");
    assert_eq!(alerts[0]["message"], "High heart rate detected: 130 bpm");

    let history = server
        .get(&format!("/api/vitals/history/{patient_id}?hours=1"), None)
        .await;
    assert_eq!(history.status, 200);
    assert_eq!(history.json().as_array().unwrap().len(), 1);

    let devices = server
        .get(&format!("/api/devices/{patient_id}"), Some(&token))
        .await;
    assert_eq!(devices.json().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn reminders_respect_ownership() {
    let server = spawn_server().await;
    let (token, patient_id) = server.patient("carol@example.com").await;
    let (_, stranger_token) = server.user("dave@example.com", "caretaker").await;

    let reminder = json!({ "patient_id": patient_id, "title": "Pills", "when": "2020-01-01T08:00:00Z" });

    let foreign = server
        .post("/api/reminders", Some(&stranger_token), reminder.clone())
        .await;
    assert_eq!(foreign.status, 404);

    let created = server.post("/api/reminders", Some(&token), reminder).await;
    assert_eq!(created.status, 200);
    let reminder_id = created.json()["id"].as_str().unwrap().to_string();

    let due_path = format!("/api/reminders/due/{patient_id}");
    let due = server.get(&due_path, Some(&token)).await.json();
    assert_eq!(due.as_array().unwrap().len(), 1);

    let ack_path = format!("/api/reminders/{reminder_id}/ack");
    for _ in 0..2 {
        let ack = server.post(&ack_path, Some(&token), json!({})).await;
        assert_eq!(ack.status, 200);
        assert_eq!(ack.json(), json!({ "ok": true }));
    }

    assert_eq!(server.get(&due_path, Some(&token)).await.json(), json!([]));

    let missing = server
        .post(
            &format!("/api/reminders/{}/ack", uuid::Uuid::new_v4()),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(missing.status, 404);

    let malformed = server
        .post("/api/reminders/not-an-id/ack", Some(&token), json!({}))
        .await;
    assert_eq!(malformed.status, 422);
}

#[tokio::test]
async fn sos_is_listed_first() {
    let server = spawn_server().await;
    let (token, patient_id) = server.patient("carol@example.com").await;

    server
        .post(
            "/api/locations/ping",
            Some(&token),
            json!({ "patient_id": patient_id, "lat": 1.0, "lng": 1.0 }),
        )
        .await;

    let sos = server
        .post(&format!("/api/sos/{patient_id}"), Some(&token), json!({}))
        .await;
    assert_eq!(sos.status, 200);

    let alerts = server
        .get(&format!("/api/locations/alerts/{patient_id}"), Some(&token))
        .await
        .json();
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["type"], "sos");
    assert_eq!(alerts[0]["message"], "Patient pressed SOS");
    assert_eq!(alerts[1]["type"], "geofence_breach");
}

#[tokio::test]
async fn family_content() {
    let server = spawn_server().await;
    let (token, patient_id) = server.patient("carol@example.com").await;

    let boundary = "sara-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"patient_id\"\r\n\r\n{patient_id}\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\nBeach\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"beach day.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\nnot really a jpeg\r\n\
         --{boundary}--\r\n"
    );
    let bearer = format!("Bearer {token}");

    let upload = server
        .send_raw(
            "POST",
            "/api/family/upload",
            &[("Authorization", bearer.as_str())],
            Some(&format!("multipart/form-data; boundary={boundary}")),
            body.as_bytes(),
        )
        .await;
    assert_eq!(upload.status, 200, "{}", upload.body);

    let image_url = upload.json()["image_url"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/static/family_images/"));
    assert!(image_url.ends_with("_beach_day.jpg"));

    let images = server
        .get(&format!("/api/family/{patient_id}"), Some(&token))
        .await
        .json();
    assert_eq!(images[0]["caption"], "Beach");

    let latest_comfort = format!("/api/comfort/{patient_id}");
    assert_eq!(server.get(&latest_comfort, Some(&token)).await.status, 404);

    let comfort = server
        .post(
            "/api/comfort",
            Some(&token),
            json!({ "patient_id": patient_id, "message": "You are safe" }),
        )
        .await;
    assert_eq!(comfort.status, 200);
    assert_eq!(
        server.get(&latest_comfort, Some(&token)).await.json()["message"],
        "You are safe"
    );

    let mood = server
        .post(
            "/api/moods",
            Some(&token),
            json!({ "patient_id": patient_id, "mood": "good" }),
        )
        .await;
    assert_eq!(mood.status, 200);

    let trend = server
        .get(&format!("/api/moods/trend/{patient_id}"), Some(&token))
        .await
        .json();
    assert_eq!(trend[0]["mood"], "good");

    let log = server
        .post(
            "/api/logs",
            Some(&token),
            json!({ "patient_id": patient_id, "entry": "Slept well" }),
        )
        .await;
    assert_eq!(log.status, 200);

    let logs = server
        .get(&format!("/api/logs/{patient_id}"), Some(&token))
        .await
        .json();
    assert_eq!(logs[0]["entry"], "Slept well");
}

#[tokio::test]
async fn readings_belong_to_the_patient_in_the_body() {
    let server = spawn_server().await;
    let (token, watched) = server.patient("carol@example.com").await;
    let (_, other) = server.patient("dave@example.com").await;

    let device = server
        .post(
            "/api/devices/register",
            Some(&token),
            json!({ "patient_id": watched, "device_name": "Watch" }),
        )
        .await;
    let device_token = device.json()["device_token"].as_str().unwrap().to_string();

    let reading = json!({ "patient_id": other, "heart_rate": 450, "body_temp": 36.8, "spo2": 98 });
    let accepted = server
        .send_raw(
            "POST",
            "/api/vitals",
            &[("device-token", device_token.as_str())],
            Some("application/json"),
            reading.to_string().as_bytes(),
        )
        .await;
    assert_eq!(accepted.status, 200, "{}", accepted.body);
    assert_eq!(accepted.json()["patient_id"], other.as_str());

    let latest = server.get(&format!("/api/vitals/latest/{other}"), None).await;
    assert_eq!(latest.status, 200);
    assert_eq!(latest.json()["heart_rate"], 450);
    assert_eq!(
        server.get(&format!("/api/vitals/latest/{watched}"), None).await.status,
        404
    );

    let alerts = server
        .get(&format!("/api/locations/alerts/{other}"), Some(&token))
        .await
        .json();
    assert_eq!(alerts[0]["type"], "vital_spike");
    assert_eq!(alerts[0]["message"], "High heart rate detected: 450 bpm");
}

#[tokio::test]
async fn oversized_windows_still_answer() {
    let server = spawn_server().await;
    let (token, patient_id) = server.patient("carol@example.com").await;

    server
        .post(
            "/api/moods",
            Some(&token),
            json!({ "patient_id": patient_id, "mood": "low" }),
        )
        .await;

    for hours in ["9223372036854775807", "10000000000", "24"] {
        let history = server
            .get(&format!("/api/vitals/history/{patient_id}?hours={hours}"), None)
            .await;
        assert_eq!(history.status, 200, "hours={hours}");
        assert_eq!(history.json(), json!([]));
    }

    for days in ["9223372036854775807", "1000000000000"] {
        let trend = server
            .get(
                &format!("/api/moods/trend/{patient_id}?days={days}"),
                Some(&token),
            )
            .await;
        assert_eq!(trend.status, 200, "days={days}");
        assert_eq!(trend.json()[0]["mood"], "low");
    }
}

mod unavailable {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use sara_care::{
        AlertData, ComfortMessageData, DailyLogData, Database, DatabaseError, DeviceData,
        FamilyImageData, FamilyMessageData, LocationData, MoodData, NewAlert, NewComfortMessage,
        NewDailyLog, NewDevice, NewFamilyImage, NewFamilyMessage, NewLocation, NewMood,
        NewPatient, NewReminder, NewUser, NewVital, PatientData, PrimaryKey, ReminderData, Result,
        UserData, VitalData,
    };

    /// A backend whose every call fails as if the connection dropped
    pub struct Unavailable;

    fn down<T>() -> Result<T> {
        Err(DatabaseError::Internal("database is unreachable".into()))
    }

    #[async_trait]
    impl Database for Unavailable {
        async fn user_by_id(&self, _: PrimaryKey) -> Result<UserData> {
            down()
        }
        async fn user_by_email(&self, _: &str) -> Result<UserData> {
            down()
        }
        async fn create_user(&self, _: NewUser) -> Result<UserData> {
            down()
        }
        async fn patient_by_id(&self, _: PrimaryKey) -> Result<PatientData> {
            down()
        }
        async fn create_patient(&self, _: NewPatient) -> Result<PatientData> {
            down()
        }
        async fn patients_by_caretaker(&self, _: PrimaryKey) -> Result<Vec<PatientData>> {
            down()
        }
        async fn create_location(&self, _: NewLocation) -> Result<LocationData> {
            down()
        }
        async fn latest_location(&self, _: PrimaryKey) -> Result<LocationData> {
            down()
        }
        async fn create_vital(&self, _: NewVital) -> Result<VitalData> {
            down()
        }
        async fn latest_vital(&self, _: PrimaryKey) -> Result<VitalData> {
            down()
        }
        async fn vitals_since(&self, _: PrimaryKey, _: DateTime<Utc>) -> Result<Vec<VitalData>> {
            down()
        }
        async fn create_alert(&self, _: NewAlert) -> Result<AlertData> {
            down()
        }
        async fn alerts_by_patient(&self, _: PrimaryKey) -> Result<Vec<AlertData>> {
            down()
        }
        async fn create_reminder(&self, _: NewReminder) -> Result<ReminderData> {
            down()
        }
        async fn due_reminders(
            &self,
            _: PrimaryKey,
            _: DateTime<Utc>,
        ) -> Result<Vec<ReminderData>> {
            down()
        }
        async fn acknowledge_reminder(&self, _: PrimaryKey) -> Result<()> {
            down()
        }
        async fn create_device(&self, _: NewDevice) -> Result<DeviceData> {
            down()
        }
        async fn device_by_token(&self, _: &str) -> Result<DeviceData> {
            down()
        }
        async fn devices_by_patient(&self, _: PrimaryKey) -> Result<Vec<DeviceData>> {
            down()
        }
        async fn create_mood(&self, _: NewMood) -> Result<MoodData> {
            down()
        }
        async fn moods_since(&self, _: PrimaryKey, _: DateTime<Utc>) -> Result<Vec<MoodData>> {
            down()
        }
        async fn create_comfort_message(
            &self,
            _: NewComfortMessage,
        ) -> Result<ComfortMessageData> {
            down()
        }
        async fn latest_comfort_message(&self, _: PrimaryKey) -> Result<ComfortMessageData> {
            down()
        }
        async fn create_family_message(&self, _: NewFamilyMessage) -> Result<FamilyMessageData> {
            down()
        }
        async fn latest_family_message(&self, _: PrimaryKey) -> Result<FamilyMessageData> {
            down()
        }
        async fn create_family_image(&self, _: NewFamilyImage) -> Result<FamilyImageData> {
            down()
        }
        async fn family_images_by_patient(&self, _: PrimaryKey) -> Result<Vec<FamilyImageData>> {
            down()
        }
        async fn create_daily_log(&self, _: NewDailyLog) -> Result<DailyLogData> {
            down()
        }
        async fn daily_logs_by_patient(&self, _: PrimaryKey) -> Result<Vec<DailyLogData>> {
            down()
        }
    }
}

/// Signs a token the way the server does, for a user the backend cannot look up
fn token_for(user_id: uuid::Uuid) -> String {
    let claims = json!({
        "sub": user_id.to_string(),
        "role": "caretaker",
        "exp": (chrono::Utc::now() + chrono::Duration::minutes(5)).timestamp(),
    });

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"integration-secret"),
    )
    .expect("sign token")
}

#[tokio::test]
async fn storage_failures_during_authentication_are_server_errors() {
    let server = spawn_server_with(unavailable::Unavailable).await;
    let patient_id = uuid::Uuid::new_v4();

    let session = server
        .get(
            &format!("/api/locations/alerts/{patient_id}"),
            Some(&token_for(uuid::Uuid::new_v4())),
        )
        .await;
    assert_eq!(session.status, 500);
    assert_eq!(session.body, "Internal server error");

    let reading = json!({ "patient_id": patient_id, "heart_rate": 72, "body_temp": 36.8, "spo2": 98 });
    let device = server
        .send_raw(
            "POST",
            "/api/vitals",
            &[("device-token", "0123456789abcdef0123456789abcdef")],
            Some("application/json"),
            reading.to_string().as_bytes(),
        )
        .await;
    assert_eq!(device.status, 500);

    let forged = server
        .get(
            &format!("/api/locations/alerts/{patient_id}"),
            Some("not-a-token"),
        )
        .await;
    assert_eq!(forged.status, 401);
}
