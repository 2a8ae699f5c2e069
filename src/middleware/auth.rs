use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
    #[serde(default)]
    pub grade: Option<i32>,
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub number: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Token subject is not a valid user id".to_string()))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case(role))
            .unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

/// Verifies the `Authorization: Bearer` token (HS256, expiry enforced).
pub fn decode_bearer(headers: &HeaderMap, secret: &str) -> Result<Claims> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing authorization header".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| Error::Unauthorized("Malformed authorization header".to_string()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("Unsupported authorization scheme".to_string()))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token.trim(),
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        Error::Unauthorized("Invalid or expired token".to_string())
    })?;
    Ok(data.claims)
}

async fn require_roles(mut req: Request, next: Next, allowed: &[&str]) -> Result<Response> {
    let config = crate::config::get_config();
    let claims = decode_bearer(req.headers(), &config.jwt_secret)?;
    if !allowed.iter().any(|r| claims.has_role(r)) {
        return Err(Error::Forbidden(format!(
            "This action requires one of the roles: {}",
            allowed.join(", ")
        )));
    }
    claims.user_id()?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn require_student(req: Request, next: Next) -> Result<Response> {
    require_roles(req, next, &[ROLE_STUDENT]).await
}

pub async fn require_teacher(req: Request, next: Next) -> Result<Response> {
    require_roles(req, next, &[ROLE_TEACHER, ROLE_ADMIN]).await
}
