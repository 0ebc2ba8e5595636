//! Status and raw body of a store response

/// Status code and body text of one exchange with the store.
///
/// The body is passed through verbatim; nothing here parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    status: u16,
    body: String,
}

impl ResponseEnvelope {
    pub fn new<S: Into<String>>(status: u16, body: S) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Exactly 200
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}
