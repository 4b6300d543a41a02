use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use gallery_backend::{
    entities::{gallery::{GalleryCreatedResponse, NewGalleryRequest}, image::UploadFile},
    routes::{configure_routes, multipart_config},
    repositories::memory::{InMemoryAssetStore, InMemoryGalleryRepo},
    settings::{AppConfig, AppEnvironment, StorageBackend},
    AppState, SharedAssetStore, SharedGalleryRepo,
};
use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;
use std::{net::TcpListener, sync::Arc, time::Duration};

pub const ADMIN_TOKEN: &str = "test_admin_token_that_is_long_enough_1234567890";
pub const PUBLIC_ASSET_URL: &str = "http://assets.test/images";

#[derive(Clone)]
pub struct TestApp {
    pub state: web::Data<AppState>,
    pub address: String,
    pub client: Client,
    pub gallery_repo: Arc<InMemoryGalleryRepo>,
    pub asset_store: Arc<InMemoryAssetStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = test_config();

        let gallery_repo = Arc::new(InMemoryGalleryRepo::new());
        let asset_store = Arc::new(InMemoryAssetStore::new(PUBLIC_ASSET_URL));

        let shared_repo: SharedGalleryRepo = gallery_repo.clone();
        let shared_assets: SharedAssetStore = asset_store.clone();
        let state = web::Data::new(AppState::new(&config, shared_repo, shared_assets));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let state_clone = state.clone();
        let upload_limit = config.max_upload_total_bytes();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state_clone.clone())
                .app_data(multipart_config(upload_limit))
                .wrap(NormalizePath::trim())
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        actix_web::rt::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/api/v1/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            state,
            address,
            client,
            gallery_repo,
            asset_store,
        }
    }

    /// Inserts a gallery through the ingestion handler, bypassing HTTP.
    pub async fn seed(&self, request: NewGalleryRequest, files: Vec<UploadFile>) -> GalleryCreatedResponse {
        self.state
            .ingestion_handler
            .submit_gallery(request, files)
            .await
            .expect("Failed to seed gallery")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn post_gallery(&self, form: MultipartBody, token: Option<&str>) -> reqwest::Response {
        let (content_type, body) = form.finish();

        let mut request = self.client
            .post(self.url("/api/v1/admin/galleries"))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request.send().await.expect("Failed to post gallery")
    }

    pub async fn delete_gallery(&self, id: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.delete(self.url(&format!("/api/v1/admin/galleries/{}", id)));

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request.send().await.expect("Failed to delete gallery")
    }
}

/// Hand-built `multipart/form-data` body.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        MultipartBody {
            boundary: format!("gallery-test-{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn gallery_data(mut self, value: &Value) -> Self {
        self.part_header("gallery_data", None, Some("application/json"));
        self.body.extend_from_slice(value.to_string().as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Plain form field with no Content-Type, the way a browser sends
    /// `FormData.append(name, string)`.
    pub fn text_field(mut self, name: &str, value: &str) -> Self {
        self.part_header(name, None, None);
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.part_header("files", Some(file_name), Some(content_type));
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (format!("multipart/form-data; boundary={}", self.boundary), self.body)
    }

    fn part_header(&mut self, name: &str, file_name: Option<&str>, content_type: Option<&str>) {
        let disposition = match file_name {
            Some(file_name) => format!("form-data; name=\"{}\"; filename=\"{}\"", name, file_name),
            None => format!("form-data; name=\"{}\"", name),
        };
        let mut header = format!("--{}\r\nContent-Disposition: {}\r\n", self.boundary, disposition);
        if let Some(content_type) = content_type {
            header.push_str(&format!("Content-Type: {}\r\n", content_type));
        }
        header.push_str("\r\n");
        self.body.extend_from_slice(header.as_bytes());
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Gallery Backend Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        storage_backend: StorageBackend::Memory,
        database_url: String::new(),
        run_migrations: false,
        cors_allowed_origins: vec!["*".to_string()],
        admin_api_token: ADMIN_TOKEN.into(),
        asset_api_url: None,
        asset_project_id: String::new(),
        asset_dataset: "production".into(),
        asset_api_version: "2023-10-10".into(),
        asset_api_token: String::new(),
        asset_cdn_url: "https://cdn.test".into(),
        public_asset_url: PUBLIC_ASSET_URL.into(),
        upload_concurrency: 4,
        gallery_cache_ttl: "30s".into(),
        max_upload_total_mb: 20,
    }
}
