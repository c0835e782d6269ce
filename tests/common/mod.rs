use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tempfile::TempDir;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let media = TempDir::new().expect("Failed to create media dir");

        let router = pantry::build_app(pool.clone(), media.path().to_path_buf());

        Self {
            router,
            db: pool,
            media,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Register a user through the public endpoint and return its token.
    pub async fn create_user(&self, email: &str, password: &str) -> String {
        let resp = self.register(email, password, "Test User").await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        self.login(email, password).await
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Response {
        self.post_json(
            "/user/create",
            &json!({ "email": email, "password": password, "name": name }),
            None,
        )
        .await
    }

    /// Exchange credentials for a bearer token via the token endpoint.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .post_json(
                "/user/token",
                &json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        body["token"]
            .as_str()
            .expect("Token endpoint should return a token")
            .to_string()
    }

    /// Create a recipe through the API and return its id.
    pub async fn create_recipe(&self, token: &str, title: &str) -> i64 {
        let resp = self
            .post_json(
                "/recipe/recipes",
                &json!({ "title": title, "time_minutes": 25, "price": 5.25 }),
                Some(token),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().unwrap()
    }

    fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("GET", uri, token).body(Body::empty()).unwrap();
        self.request(req).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("DELETE", uri, token)
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Response {
        let req = Self::builder(method, uri, token)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value, token: Option<&str>) -> Response {
        self.send_json("POST", uri, body, token).await
    }

    pub async fn patch_json(&self, uri: &str, body: &Value, token: Option<&str>) -> Response {
        self.send_json("PATCH", uri, body, token).await
    }

    pub async fn put_json(&self, uri: &str, body: &Value, token: Option<&str>) -> Response {
        self.send_json("PUT", uri, body, token).await
    }

    /// Send a multipart POST with a single file part named `image`.
    pub async fn post_image(
        &self,
        uri: &str,
        filename: &str,
        data: &[u8],
        token: Option<&str>,
    ) -> Response {
        let boundary = "test-boundary-7MA4YWxkTrZu0gW";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Self::builder("POST", uri, token)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.request(req).await
    }
}

/// Read the full response body and parse it as JSON.
pub async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Response body should be JSON")
}
