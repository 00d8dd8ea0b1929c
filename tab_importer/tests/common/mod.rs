use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tab_importer::{ApiError, SubmissionRequest, SubmitMethod, TournamentApi, TournamentSettings};

pub const SITE_URL: &str = "http://tab.test/wudc/admin/";
pub const API_ROOT: &str = "http://tab.test/api/v1";

pub fn settings() -> TournamentSettings {
    TournamentSettings::for_directory(SITE_URL, "WUDC 2025")
}

/// An in-memory tournament service. Creates get `{collection}/{n}` as their url,
/// patches echo their body, and everything is recorded in arrival order.
#[derive(Default)]
pub struct MockApi {
    objects: Mutex<HashMap<String, Value>>,
    submissions: Mutex<Vec<SubmissionRequest>>,
    fetches: Mutex<Vec<String>>,
    rejections: Mutex<Vec<(String, Value)>>,
    lost: Mutex<Vec<(String, Value)>>,
    broken: Mutex<bool>,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn garbled_response() -> ApiError {
    ApiError::Decode(serde_json::from_str::<Value>("<html>").unwrap_err())
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Any submission whose body has `field` equal to `value` is answered with 400.
    pub fn reject_when(&self, field: &str, value: impl Into<Value>) {
        self.rejections.lock().unwrap().push((field.to_string(), value.into()));
    }

    /// Any submission whose body has `field` equal to `value` never gets a
    /// readable answer, as if the connection dropped mid-response.
    pub fn lose_when(&self, field: &str, value: impl Into<Value>) {
        self.lost.lock().unwrap().push((field.to_string(), value.into()));
    }

    /// The most submissions that were ever awaiting an answer at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every lookup fails before reaching the service.
    pub fn break_transport(&self) {
        *self.broken.lock().unwrap() = true;
    }

    pub fn add_object(&self, url: &str, object: Value) {
        self.objects.lock().unwrap().insert(url.to_string(), object);
    }

    pub fn submissions(&self) -> Vec<SubmissionRequest> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn posts_to(&self, collection_url: &str) -> Vec<Value> {
        self.submissions()
            .into_iter()
            .filter(|r| r.method == SubmitMethod::Post && r.url == collection_url)
            .map(|r| r.body)
            .collect()
    }

    pub fn patches(&self) -> Vec<SubmissionRequest> {
        self.submissions().into_iter().filter(|r| r.method == SubmitMethod::Patch).collect()
    }

    fn matches(rules: &Mutex<Vec<(String, Value)>>, body: &Value) -> bool {
        rules.lock().unwrap().iter().any(|(field, value)| body.get(field) == Some(value))
    }

    async fn answer(&self, request: &SubmissionRequest) -> Result<Value, ApiError> {
        tokio::time::sleep(Duration::from_millis(2)).await;

        if Self::matches(&self.lost, &request.body) {
            return Err(garbled_response());
        }
        if Self::matches(&self.rejections, &request.body) {
            return Err(ApiError::Rejected {
                status: 400,
                body: json!({"detail": "Invalid."}).to_string(),
            });
        }

        let mut response = request.body.clone();
        match request.method {
            SubmitMethod::Post => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let url = format!("{}/{}", request.url, id);
                response["id"] = json!(id);
                response["url"] = json!(url);
                if request.url == format!("{}/tournaments", API_ROOT) {
                    if let Some(slug) = request.body.get("slug").and_then(Value::as_str) {
                        self.add_object(&format!("{}/{}", request.url, slug), response.clone());
                    }
                }
                self.add_object(&url, response.clone());
            }
            SubmitMethod::Patch => {
                response["url"] = json!(request.url);
            }
        }
        Ok(response)
    }
}

#[async_trait]
impl TournamentApi for MockApi {
    async fn fetch(&self, url: &str) -> Result<Value, ApiError> {
        self.fetches.lock().unwrap().push(url.to_string());
        if *self.broken.lock().unwrap() {
            return Err(garbled_response());
        }

        match self.objects.lock().unwrap().get(url) {
            Some(object) => Ok(object.clone()),
            None => Err(ApiError::Rejected {
                status: 404,
                body: json!({"detail": "Not found."}).to_string(),
            }),
        }
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<Value, ApiError> {
        self.submissions.lock().unwrap().push(request.clone());

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let result = self.answer(request).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result
    }
}

pub fn csv(text: &str) -> std::io::Cursor<Vec<u8>> {
    std::io::Cursor::new(text.as_bytes().to_vec())
}
