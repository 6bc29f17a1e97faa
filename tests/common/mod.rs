#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use rayn_roles::config::AppConfig;
use rayn_roles::jwt::JwtConfig;

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
    pub register_response: Value,
}

pub async fn setup() -> Result<TestApp> {
    setup_with(|config| config).await
}

pub async fn setup_with(configure: impl FnOnce(AppConfig) -> AppConfig) -> Result<TestApp> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let config = configure(AppConfig::new(JwtConfig::new("test-secret", 1)));
    let app = rayn_roles::create_app_with_config(pool.clone(), config);

    Ok(TestApp { app, pool, _dir: dir })
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn register(&self, name: &str) -> Result<TestUser> {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple());
        let (status, body) = self
            .send(
                "POST",
                "/auth/register",
                None,
                Some(json!({"name": name, "email": email, "password": "password123"})),
            )
            .await?;
        if status != StatusCode::CREATED {
            anyhow::bail!("register failed: {} - {}", status, body);
        }

        let token = body["token"].as_str().context("missing token")?.to_string();
        let id = body["user"]["id"].as_str().context("missing user id")?.parse()?;
        Ok(TestUser { id, token, register_response: body })
    }

    /// Re-resolves the caller's role after the test changed store data.
    pub async fn refresh(&self, user: &TestUser) -> Result<Value> {
        let (status, body) = self.send("POST", "/auth/role/refresh", Some(&user.token), None).await?;
        if status != StatusCode::OK {
            anyhow::bail!("refresh failed: {} - {}", status, body);
        }
        Ok(body)
    }

    pub async fn grant_primary_role(&self, user_id: Uuid, role: &str) -> Result<()> {
        sqlx::query("INSERT INTO user_roles (user_id, role, created_at) VALUES (?, ?, ?)")
            .bind(user_id.to_string())
            .bind(role)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_organization(&self, name: &str, active: bool) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO organizations (id, name, is_active, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(name)
            .bind(active)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn insert_license(&self, organization_id: Uuid, product: &str, seats: i64) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO licenses (id, organization_id, product_name, total_seats, expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(organization_id.to_string())
        .bind(product)
        .bind(seats)
        .bind((Utc::now() + Duration::days(365)).to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// `age_days` pushes `assigned_at` into the past so tests can control
    /// which assignment counts as the first one.
    pub async fn assign_license(&self, user_id: Uuid, license_id: Uuid, access_level: &str, age_days: i64) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO license_assignments (id, user_id, license_id, access_level, assigned_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(license_id.to_string())
        .bind(access_level)
        .bind((Utc::now() - Duration::days(age_days)).to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }
}
