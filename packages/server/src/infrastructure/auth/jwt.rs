//! JWT (HS256) による Identity Gateway 実装
//!
//! トークンの発行とパスワードのハッシュ化は外部サービスの責務で、ここでは検証のみを行います。

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, Identity, IdentityGateway, UserId, Username};

/// JWT クレーム
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// ユーザー ID
    pub sub: String,
    /// 表示名
    pub username: String,
    /// 有効期限（Unix 秒）
    pub exp: u64,
    /// 発行者
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 で署名された JWT を検証する Identity Gateway
pub struct JwtIdentityGateway {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityGateway {
    /// 新しい JwtIdentityGateway を作成
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC 共有鍵
    /// * `issuer` - 指定した場合、`iss` クレームが一致するトークンのみ受け付ける
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityGateway for JwtIdentityGateway {
    async fn authenticate(&self, credential: &str) -> Result<Identity, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let token_data = decode::<Claims>(credential, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Rejected("token expired".to_string()),
                _ => AuthError::Rejected(e.to_string()),
            })?;

        let claims = token_data.claims;
        let id = UserId::new(claims.sub).map_err(|e| AuthError::Rejected(e.to_string()))?;
        let name =
            Username::new(claims.username).map_err(|e| AuthError::Rejected(e.to_string()))?;

        Ok(Identity::new(id, name))
    }
}
