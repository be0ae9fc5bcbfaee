use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    context::AppContext,
    model::{admin::Admin, role::Role, staff::Staff},
    models::{LoginReqDto, PrincipalKind, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};

#[derive(Serialize, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

/// Login
///
/// Admins authenticate by username, staff by their registered name.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Tokens issued"),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(ctx, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    ctx: web::Data<AppContext>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "error": "Username and password required"
        }));
    }

    debug!("Fetching principal from database");

    let (user_id, display_name, role) = match user.user_type {
        PrincipalKind::Admin => {
            let admin = match sqlx::query_as::<_, Admin>(
                r#"
                SELECT id, username, password, is_admin
                FROM admins
                WHERE username = ?
                "#,
            )
            .bind(&user.username)
            .fetch_optional(&ctx.pool)
            .await
            {
                Ok(Some(admin)) => admin,
                Ok(None) => {
                    info!("Invalid credentials: admin not found");
                    return HttpResponse::Unauthorized().json(json!({
                        "error": "Invalid credentials"
                    }));
                }
                Err(e) => {
                    error!(error = %e, "Database error while fetching admin");
                    return HttpResponse::InternalServerError().finish();
                }
            };

            if verify_password(&user.password, &admin.password).is_err() {
                info!("Invalid credentials: password mismatch");
                return HttpResponse::Unauthorized().json(json!({
                    "error": "Invalid credentials"
                }));
            }

            (admin.id, admin.username, Role::Admin)
        }
        PrincipalKind::Staff => {
            let staff = match sqlx::query_as::<_, Staff>(
                r#"
                SELECT id, name, department, password, barcode, created_at
                FROM staff
                WHERE name = ?
                "#,
            )
            .bind(&user.username)
            .fetch_optional(&ctx.pool)
            .await
            {
                Ok(Some(staff)) => staff,
                Ok(None) => {
                    info!("Invalid credentials: staff not found");
                    return HttpResponse::Unauthorized().json(json!({
                        "error": "Invalid credentials"
                    }));
                }
                Err(e) => {
                    error!(error = %e, "Database error while fetching staff");
                    return HttpResponse::InternalServerError().finish();
                }
            };

            if verify_password(&user.password, &staff.password).is_err() {
                info!("Invalid credentials: password mismatch");
                return HttpResponse::Unauthorized().json(json!({
                    "error": "Invalid credentials"
                }));
            }

            (staff.id, staff.name, Role::Staff)
        }
    };

    debug!("Password verified, generating tokens");

    let access_token = generate_access_token(
        user_id,
        display_name.clone(),
        role.id(),
        &config.jwt_secret,
        config.access_token_ttl,
    );

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user_id,
        display_name,
        role.id(),
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    debug!(user_id, jti = %refresh_claims.jti, "Storing refresh token");

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, role_id, jti, expires_at)
        VALUES (?, ?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(role.id())
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(&ctx.pool)
    .await
    {
        error!(error = %e, "Failed to store refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    })
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: u64,
    user_id: u64,
    role_id: u8,
    revoked: bool,
}

/// Rotate a refresh token: revoke the presented one, issue a new pair.
#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "New token pair issued"),
        (status = 401, description = "Missing, invalid, or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    let record = match sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT id, user_id, role_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(&ctx.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let record = match record {
        Some(r) if !r.revoked => r,
        _ => return HttpResponse::Unauthorized().finish(),
    };

    // revoke old refresh token
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record.id)
        .execute(&ctx.pool)
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // issue new refresh token
    let (new_refresh_token, new_claims) = generate_refresh_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, role_id, jti, expires_at)
        VALUES (?, ?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(record.user_id)
    .bind(record.role_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(&ctx.pool)
    .await
    {
        error!(error = %e, "Failed to store rotated refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // new access token
    let access_token = generate_access_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    }))
}

/// Revoke the presented refresh token. Succeeds even if it never existed.
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 204, description = "Token revoked (or nothing to revoke)")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(req: HttpRequest, ctx: web::Data<AppContext>, config: web::Data<Config>) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // revoke refresh token (idempotent)
    let _ = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(&ctx.pool)
        .await;

    HttpResponse::NoContent().finish()
}

/// Purge refresh tokens whose expiry has passed. Called opportunistically
/// from the startup warmups.
pub async fn purge_expired_refresh_tokens(pool: &sqlx::MySqlPool) -> anyhow::Result<u64> {
    let now: DateTime<Utc> = Utc::now();
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
        .bind(now.naive_utc())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
