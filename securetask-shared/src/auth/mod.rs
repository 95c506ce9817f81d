/// Authentication primitives
///
/// - `password`: Argon2id hashing, verification, strength checks
/// - `jwt`: HS256 access/refresh token creation and validation

pub mod jwt;
pub mod password;
