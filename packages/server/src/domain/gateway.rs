//! Identity Gateway trait 定義
//!
//! 資格情報（トークン）の検証は外部の責務です。ドメイン層は
//! 「authenticate(credential) → Identity または拒否」という境界だけを知っています。

use async_trait::async_trait;

use super::{AuthError, Identity};

/// 資格情報を検証し、安定したユーザー Identity を返す
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<Identity, AuthError>;
}
