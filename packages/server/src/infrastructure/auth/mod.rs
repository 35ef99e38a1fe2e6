//! Identity Gateway 実装

pub mod jwt;

pub use jwt::{Claims, JwtIdentityGateway};
