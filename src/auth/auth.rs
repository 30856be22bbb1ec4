use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::model::role::Role;
use crate::models::{Claims, TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    /// Builds the caller from verified claims. Only access tokens are accepted.
    pub fn from_claims(claims: Claims) -> Result<Self, ApiError> {
        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized("Access token required".into()));
        }

        let role = Role::from_id(claims.role)
            .ok_or_else(|| ApiError::Unauthorized("Invalid role".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already verified by the auth middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthorized("Missing token".into()).into())),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ApiError::Unauthorized("Invalid token".into()).into())),
        };

        ready(AuthUser::from_claims(claims).map_err(Into::into))
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> ApiResult<()> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("HR/Admin only".into()))
        }
    }

    /// HR and admins may read anyone; an employee only their own records.
    pub fn require_self_or_hr(&self, employee_id: u64) -> ApiResult<()> {
        if self.role.is_hr_or_admin() || self.employee_id == Some(employee_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Not allowed to view another employee".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "tester".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn writes_need_hr_or_admin() {
        assert!(user(Role::Admin, None).require_hr_or_admin().is_ok());
        assert!(user(Role::Hr, None).require_hr_or_admin().is_ok());
        assert!(user(Role::ApiUser, None).require_hr_or_admin().is_err());
    }

    #[test]
    fn employees_see_only_themselves() {
        let employee = user(Role::Employee, Some(7));
        assert!(employee.require_self_or_hr(7).is_ok());
        assert!(employee.require_self_or_hr(8).is_err());
        assert!(employee.require_hr_or_admin().is_err());

        let hr = user(Role::Hr, None);
        assert!(hr.require_self_or_hr(8).is_ok());
    }

    #[test]
    fn refresh_tokens_are_not_sessions() {
        let claims = Claims {
            user_id: 1,
            sub: "tester".into(),
            role: 1,
            exp: 0,
            jti: "jti".into(),
            token_type: TokenType::Refresh,
            employee_id: None,
        };
        assert!(AuthUser::from_claims(claims).is_err());
    }
}
