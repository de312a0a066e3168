//! `Security.*` — just the one toggle the unblock sequence needs.

use serde::Serialize;

use bidi_mapper_types::{Command, Method};

#[derive(Debug, Clone, Serialize)]
pub struct SetIgnoreCertificateErrorsParams {
    pub ignore: bool,
}

impl SetIgnoreCertificateErrorsParams {
    pub fn new(ignore: bool) -> Self {
        Self { ignore }
    }
}

impl Method for SetIgnoreCertificateErrorsParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Security.setIgnoreCertificateErrors".into()
    }
}
impl Command for SetIgnoreCertificateErrorsParams {
    type Response = serde_json::Value;
}
