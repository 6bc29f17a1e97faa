mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{setup, setup_with};

#[tokio::test]
async fn override_routes_absent_unless_enabled() -> Result<()> {
    let t = setup().await?;
    let rayn = t.register("Rayn").await?;
    t.grant_primary_role(rayn.id, "admin").await?;
    t.refresh(&rayn).await?;

    let (status, _) = t
        .send("PUT", "/debug/role-override", Some(&rayn.token), Some(json!({"role": "user"})))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn ordinary_users_cannot_override() -> Result<()> {
    let t = setup_with(|c| c.with_role_override(true)).await?;
    let org = t.insert_organization("Client", true).await?;
    let license = t.insert_license(org, "Suite", 3).await?;

    let client_admin = t.register("Clientadmin").await?;
    t.assign_license(client_admin.id, license, "admin", 1).await?;
    t.refresh(&client_admin).await?;

    let (status, body) = t
        .send("PUT", "/debug/role-override", Some(&client_admin.token), Some(json!({"role": "admin"})))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (_, role) = t.get("/auth/role", &client_admin.token).await?;
    assert_eq!(role["override_active"], false);
    assert_eq!(role["descriptor"]["is_primary_admin"], false);

    Ok(())
}

#[tokio::test]
async fn operator_previews_lower_tier_then_clears() -> Result<()> {
    let t = setup_with(|c| c.with_role_override(true)).await?;
    let org = t.insert_organization("Client", true).await?;
    let rayn = t.register("Rayn").await?;
    t.grant_primary_role(rayn.id, "admin").await?;
    t.refresh(&rayn).await?;

    let (status, body) = t
        .send(
            "PUT",
            "/debug/role-override",
            Some(&rayn.token),
            Some(json!({"role": "manager", "scope_id": org})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["override_active"], true);
    assert_eq!(body["descriptor"]["role"], "manager");
    assert_eq!(body["descriptor"]["scope_id"], org.to_string());

    // guards see the previewed tier straight away
    let (_, dash) = t.get("/dashboard", &rayn.token).await?;
    assert_eq!(dash["variant"], "manager");
    let (status, _) = t.get("/organizations", &rayn.token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // refresh does not undo the preview
    let refreshed = t.refresh(&rayn).await?;
    assert_eq!(refreshed["descriptor"]["role"], "manager");

    let (status, body) = t.send("DELETE", "/debug/role-override", Some(&rayn.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["override_active"], false);
    assert_eq!(body["descriptor"]["is_primary_admin"], true);

    let (status, _) = t.get("/organizations", &rayn.token).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn override_scope_must_be_active_organization() -> Result<()> {
    let t = setup_with(|c| c.with_role_override(true)).await?;
    let closed = t.insert_organization("Closed", false).await?;
    let rayn = t.register("Rayn").await?;
    t.grant_primary_role(rayn.id, "admin").await?;
    t.refresh(&rayn).await?;

    let (status, _) = t
        .send(
            "PUT",
            "/debug/role-override",
            Some(&rayn.token),
            Some(json!({"role": "admin", "scope_id": closed})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}
