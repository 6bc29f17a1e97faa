mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use rayn_roles::jwt::JwtConfig;

use common::{setup, setup_with};

#[tokio::test]
async fn auth_edge_cases() -> Result<()> {
    let t = setup().await?;

    // 1. Register with short password
    let (status, _) = t
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Short Pass", "email": "short@example.com", "password": "short"})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Should fail with bad request for short password");

    // 2. Register with valid user
    let (status, body) = t
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Valid User", "email": "Valid@Example.com", "password": "password123"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "valid@example.com");

    // 3. Same email again, different case
    let (status, _) = t
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"name": "Dup", "email": "VALID@example.com", "password": "password123"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // 4. Login with wrong password
    let (status, _) = t
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "valid@example.com", "password": "wrongpassword"})),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "Should fail with unauthorized for wrong password");

    // 5. Login with non-existent email
    let (status, _) = t
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "password123"})),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "Should fail with unauthorized for non-existent user");

    // 6. Login works and resolves a role
    let (status, body) = t
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "valid@example.com", "password": "password123"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"]["source"], "default");

    // 7. Access role-gated route without token
    let (status, _) = t.send("GET", "/auth/role", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "Should fail with unauthorized for missing token");

    // 8. Garbage token
    let (status, body) = t.get("/dashboard", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token");

    Ok(())
}

#[tokio::test]
async fn token_rejected_after_logout() -> Result<()> {
    let t = setup().await?;
    let user = t.register("Returning").await?;

    let (status, _) = t.get("/auth/role", &user.token).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t.send("POST", "/auth/logout", Some(&user.token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.get("/auth/role", &user.token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = t.get("/auth/me", &user.token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.send("POST", "/auth/logout", Some(&user.token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // a new login gets a new session
    let email = user.register_response["user"]["email"].as_str().unwrap_or_default().to_string();
    let (status, body) = t
        .send("POST", "/auth/login", None, Some(json!({"email": email, "password": "password123"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap_or_default().to_string();
    let (status, _) = t.get("/auth/role", &token).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn expired_sessions_drop_out_of_the_registry() -> Result<()> {
    let t = setup_with(|mut config| {
        config.jwt = JwtConfig::new("test-secret", -1);
        config
    })
    .await?;

    let first = t.register("First").await?;
    t.register("Second").await?;
    t.register("Third").await?;

    let (status, health) = t.send("GET", "/api/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["active_sessions"], 0);

    let (status, body) = t.get("/auth/role", &first.token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token");

    Ok(())
}
