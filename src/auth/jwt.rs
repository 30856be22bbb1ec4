use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Tokens are issued by the identity service; tests mint their own.
#[cfg(test)]
pub fn generate_access_token(
    user_id: u64,
    role: u8,
    employee_id: Option<u64>,
    secret: &str,
) -> String {
    generate_token(user_id, role, employee_id, secret, crate::models::TokenType::Access)
}

#[cfg(test)]
pub fn generate_token(
    user_id: u64,
    role: u8,
    employee_id: Option<u64>,
    secret: &str,
    token_type: crate::models::TokenType,
) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};
    use uuid::Uuid;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        user_id,
        sub: format!("user-{user_id}"),
        role,
        exp: now + 900,
        jti: Uuid::new_v4().to_string(),
        token_type,
        employee_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenType;

    #[test]
    fn verifies_own_tokens() {
        let token = generate_access_token(42, 2, Some(7), "secret");
        let claims = verify_token(&token, "secret").unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, 2);
        assert_eq!(claims.employee_id, Some(7));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = generate_access_token(42, 2, None, "secret");
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
