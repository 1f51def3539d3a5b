use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use log::{debug, info, warn};

use crate::{
    config::Settings,
    db,
    dto::{AuthUserResponse, LoginUserRequest},
    errors::ApiError,
    service::{access::Principal, crypto},
    PGPool,
};

/// Resolves the bearer token into a [`Principal`] stored in request
/// extensions. Requests without a valid token continue anonymously.
pub struct AuthMiddleware {
    pub db_pool: PGPool,
    pub jwt_secret: String,
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            db_pool: self.db_pool.clone(),
            jwt_secret: self.jwt_secret.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    db_pool: PGPool,
    jwt_secret: String,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let pool = self.db_pool.clone();
        let claims = jwt::parse_request(&req, "Bearer")
            .and_then(|token| jwt::decode_claims(&self.jwt_secret, &token));

        Box::pin(async move {
            match claims {
                Ok(claims) => match db::user::get_by_id(claims.sub, &pool).await {
                    Ok(Some(user)) => match Principal::from_user(&user) {
                        Some(principal) => {
                            debug!("request authenticated as '{}'", principal.username);
                            req.extensions_mut().insert(principal);
                        }
                        None => warn!("inactive user '{}' presented a token", user.username),
                    },
                    Ok(None) => warn!("token for unknown user {}", claims.sub),
                    Err(err) => warn!("failed to resolve principal: {:?}", err),
                },
                Err(ApiError::DecodeError) => debug!("rejected malformed or expired token"),
                Err(_) => {}
            }
            service.call(req).await
        })
    }
}

pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::Utc;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use uuid::Uuid;

    use crate::{dto::Claims, errors::ApiError};

    pub fn create(secret: &str, user_id: &Uuid, username: &str, ttl_secs: i64) -> Result<String, ApiError> {
        let exp = (Utc::now().timestamp() + ttl_secs).max(0) as usize;
        let claims = Claims::new(user_id, username, exp);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|_| ApiError::InternalError)
    }

    /// Signature and expiry are both checked.
    pub fn decode_claims(secret: &str, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::DecodeError)
    }

    pub fn parse_request(req: &ServiceRequest, prefix: &str) -> Result<String, ApiError> {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| parse_header(value, prefix))
            .ok_or(ApiError::AuthError)
    }

    /// The scheme must be followed by whitespace: `Bearer <token>`.
    pub fn parse_header(value: &str, prefix: &str) -> Option<String> {
        let (scheme, token) = value.trim_start().split_once(char::is_whitespace)?;
        let token = token.trim();
        if scheme != prefix || token.is_empty() {
            return None;
        }
        Some(token.to_string())
    }
}

pub async fn login(
    pool: &PGPool,
    settings: &Settings,
    req: LoginUserRequest,
) -> Result<AuthUserResponse, ApiError> {
    let user = db::user::get_by_username(&req.username, pool)
        .await?
        .ok_or(ApiError::AuthError)?;
    if !user.is_active || !crypto::verify_password(&user.username, &req.pwd, &user.pwd_hash) {
        warn!("failed login for '{}'", req.username);
        return Err(ApiError::AuthError);
    }
    let access_token = jwt::create(
        &settings.jwt_secret,
        &user.id,
        &user.username,
        settings.access_token_ttl_secs,
    )?;
    info!("user '{}' logged in", user.username);
    Ok(AuthUserResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: settings.access_token_ttl_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::jwt;
    use crate::errors::ApiError;
    use actix_web::test::TestRequest;
    use uuid::Uuid;

    #[test]
    fn token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = jwt::create("secret", &user_id, "alice", 60).unwrap();
        let claims = jwt::decode_claims("secret", &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = jwt::create("secret", &Uuid::new_v4(), "alice", 60).unwrap();
        assert_eq!(jwt::decode_claims("other", &token), Err(ApiError::DecodeError));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = jwt::create("secret", &Uuid::new_v4(), "alice", -3600).unwrap();
        assert_eq!(jwt::decode_claims("secret", &token), Err(ApiError::DecodeError));
    }

    #[test]
    fn bearer_header_is_parsed() {
        assert_eq!(jwt::parse_header("Bearer abc.def", "Bearer"), Some("abc.def".to_string()));
        assert_eq!(jwt::parse_header("Bearer   ", "Bearer"), None);
        assert_eq!(jwt::parse_header("Basic abc", "Bearer"), None);
        assert_eq!(jwt::parse_header("Bearerabc.def", "Bearer"), None);
        assert_eq!(jwt::parse_header("Bearer", "Bearer"), None);
        assert_eq!(jwt::parse_header("Bearer\tabc.def", "Bearer"), Some("abc.def".to_string()));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def"))
            .to_srv_request();
        assert_eq!(jwt::parse_request(&req, "Bearer"), Ok("abc.def".to_string()));

        let anonymous = TestRequest::default().to_srv_request();
        assert_eq!(jwt::parse_request(&anonymous, "Bearer"), Err(ApiError::AuthError));
    }
}
