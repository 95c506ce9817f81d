/// Cross-cutting HTTP middleware
///
/// - `security`: security response headers

pub mod security;
