use std::fmt;
use subtle::ConstantTimeEq;

/// The static credential webhook callers must present
#[derive(Clone)]
pub struct SharedSecret(Option<String>);

impl SharedSecret {
    /// `None` (or an empty string) rejects every caller.
    pub fn new(secret: Option<String>) -> Self {
        Self(secret.filter(|s| !s.is_empty()))
    }

    /// Constant-time comparison of the presented header value
    pub fn verify(&self, presented: Option<&str>) -> bool {
        match (&self.0, presented) {
            (Some(expected), Some(given)) if !given.is_empty() => {
                bool::from(expected.as_bytes().ct_eq(given.as_bytes()))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("SharedSecret(<redacted>)"),
            None => f.write_str("SharedSecret(<unset>)"),
        }
    }
}
