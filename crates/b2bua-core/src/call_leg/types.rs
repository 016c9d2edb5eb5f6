//! Value types exchanged between call-control events and the UAS leg.

use std::fmt;
use std::str::FromStr;

use crate::errors::{B2buaError, Result};

/// Session description carried by an event or a response.
///
/// `needs_update` marks a body that must be renegotiated with the media
/// layer before it can be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBody {
    pub content_type: String,
    pub content: String,
    pub needs_update: bool,
}

impl SessionBody {
    pub fn sdp(content: impl Into<String>) -> Self {
        Self {
            content_type: "application/sdp".to_string(),
            content: content.into(),
            needs_update: false,
        }
    }

    pub fn with_needs_update(mut self) -> Self {
        self.needs_update = true;
        self
    }
}

/// Opaque extra header forwarded into a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipHeader {
    pub name: String,
    pub value: String,
}

impl SipHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for SipHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Contact header value (address only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipContact {
    pub uri: String,
}

impl SipContact {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl fmt::Display for SipContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.uri)
    }
}

/// RFC 3326 `Reason` header: `SIP ;cause=200 ;text="Call completed elsewhere"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonHeader {
    pub protocol: String,
    pub cause: u16,
    pub text: Option<String>,
}

impl ReasonHeader {
    pub fn new(protocol: impl Into<String>, cause: u16, text: Option<&str>) -> Self {
        Self {
            protocol: protocol.into(),
            cause,
            text: text.map(str::to_string),
        }
    }
}

impl fmt::Display for ReasonHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};cause={}", self.protocol, self.cause)?;
        if let Some(text) = &self.text {
            write!(f, ";text=\"{}\"", text)?;
        }
        Ok(())
    }
}

impl FromStr for ReasonHeader {
    type Err = B2buaError;

    fn from_str(raw: &str) -> Result<Self> {
        let mut parts = raw.split(';');
        let protocol = parts.next().map(str::trim).unwrap_or_default();
        if protocol.is_empty() || protocol.contains(char::is_whitespace) {
            return Err(B2buaError::invalid_header("Reason", format!("bad protocol in {:?}", raw)));
        }

        let mut cause = None;
        let mut text = None;
        for param in parts {
            let (name, value) = param
                .split_once('=')
                .map(|(n, v)| (n.trim(), v.trim()))
                .ok_or_else(|| B2buaError::invalid_header("Reason", format!("bad parameter {:?}", param)))?;
            if name.eq_ignore_ascii_case("cause") {
                let parsed = value
                    .parse::<u16>()
                    .map_err(|_| B2buaError::invalid_header("Reason", format!("bad cause {:?}", value)))?;
                cause = Some(parsed);
            } else if name.eq_ignore_ascii_case("text") {
                text = Some(value.trim_matches('"').to_string());
            }
        }

        let cause = cause.ok_or_else(|| B2buaError::invalid_header("Reason", "missing cause"))?;
        Ok(Self {
            protocol: protocol.to_string(),
            cause,
            text,
        })
    }
}

/// Header lookup on an inbound request (for example the CANCEL that aborts a leg)
pub trait HeaderSource {
    /// Raw body of the first header with this name, matched case-insensitively
    fn header_value(&self, name: &str) -> Option<&str>;
}

/// A response the UAS leg asks its transaction layer to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UasResponse {
    pub code: u16,
    pub reason: String,
    pub body: Option<SessionBody>,
    pub contact: Option<SipContact>,
    /// 2xx that still expects an ACK before the call counts as connected
    pub ack_wait: bool,
    pub extra_headers: Option<Vec<SipHeader>>,
    pub reason_rfc3326: Option<ReasonHeader>,
}

impl UasResponse {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            body: None,
            contact: None,
            ack_wait: false,
            extra_headers: None,
            reason_rfc3326: None,
        }
    }

    pub fn with_body(mut self, body: Option<SessionBody>) -> Self {
        self.body = body;
        self
    }

    pub fn with_contact(mut self, contact: Option<SipContact>) -> Self {
        self.contact = contact;
        self
    }

    pub fn with_ack_wait(mut self, ack_wait: bool) -> Self {
        self.ack_wait = ack_wait;
        self
    }

    /// An empty list is sent as no extra headers at all
    pub fn with_extra_headers(mut self, headers: Option<Vec<SipHeader>>) -> Self {
        self.extra_headers = headers.filter(|h| !h.is_empty());
        self
    }

    pub fn with_reason(mut self, reason: Option<ReasonHeader>) -> Self {
        self.reason_rfc3326 = reason;
        self
    }

    pub fn is_final(&self) -> bool {
        self.code >= 200
    }
}
