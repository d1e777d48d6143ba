//! Request governance: everything a call passes through before a tool body
//! runs.

pub mod rate_limiter;
pub mod regex_guard;
pub mod sanitize;
pub mod secure;
pub mod validation;

pub use rate_limiter::{Clock, RateLimiter, SystemClock};
#[cfg(any(test, feature = "test-harness"))]
pub use rate_limiter::ManualClock;
pub use regex_guard::{compile_guarded, GuardViolation};
pub use sanitize::{escape_html, sanitize_html, sanitize_text, unescape_html, SanitizeMode};
pub use secure::{ErrorKind, InvocationError, SecureHandler};
pub use validation::{ValidationError, ValidationKind, Validator, Violation};
