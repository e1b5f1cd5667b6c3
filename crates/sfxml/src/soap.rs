//! SOAP envelopes for the Salesforce APIs
//!
//! Builds request documents and interprets response bodies. Sending the
//! request is left to the caller: POST [`Envelope::to_xml`] to
//! [`Api::service_path`] with the [`SOAP_CONTENT_TYPE`] and [`SOAP_ACTION`]
//! headers, then pass the response body and whether the status was 200 to
//! [`read_response`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::error::Error;
use crate::value::{Complex, Element, Value};

/// Content type of SOAP requests
pub const SOAP_CONTENT_TYPE: &str = "text/xml";
/// Value of the `SOAPAction` header expected by Salesforce
pub const SOAP_ACTION: &str = "\"\"";

const ENVELOPE: &str = "soapenv:Envelope";
const HEADER: &str = "soapenv:Header";
const BODY: &str = "soapenv:Body";
const FAULT: &str = "soapenv:Fault";
const ENVELOPE_NAMESPACES: &str = concat!(
    " xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\"",
    " xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\"",
    " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
);

/// Failure while reading a SOAP response
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SoapError {
    #[error("malformed SOAP response: {0}")]
    Malformed(#[from] Error),
    #[error("{code}: {message}")]
    Fault {
        code: String,
        message: String,
        detail: Value,
    },
    #[error("missing element in SOAP response: {0}")]
    MissingElement(String),
    #[error("unknown SOAP API: {0}")]
    UnknownApi(String),
}

/// SOAP endpoints exposed by an org
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Api {
    Enterprise,
    Partner,
    Apex,
    Metadata,
    Tooling,
}

impl Api {
    pub const ALL: [Self; 5] = [
        Self::Enterprise,
        Self::Partner,
        Self::Apex,
        Self::Metadata,
        Self::Tooling,
    ];

    /// Path of the service port for an API version such as `59.0`
    pub fn service_path(self, api_version: &str) -> String {
        let code = match self {
            Self::Enterprise => "c",
            Self::Partner => "u",
            Self::Apex => "s",
            Self::Metadata => "m",
            Self::Tooling => "T",
        };
        format!("/services/Soap/{code}/{api_version}")
    }

    /// Namespace declarations added to the envelope, leading space included
    pub const fn target_namespaces(self) -> &'static str {
        match self {
            Self::Enterprise => {
                " xmlns=\"urn:enterprise.soap.sforce.com\" xmlns:sf=\"urn:sobject.enterprise.soap.sforce.com\""
            }
            Self::Partner => {
                " xmlns=\"urn:partner.soap.sforce.com\" xmlns:sf=\"urn:sobject.partner.soap.sforce.com\""
            }
            Self::Apex => " xmlns=\"http://soap.sforce.com/2006/08/apex\"",
            Self::Metadata => " xmlns=\"http://soap.sforce.com/2006/04/metadata\"",
            Self::Tooling => {
                " xmlns=\"urn:tooling.soap.sforce.com\" xmlns:sf=\"urn:sobject.tooling.soap.sforce.com\" xmlns:mns=\"urn:metadata.tooling.soap.sforce.com\""
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Enterprise => "Enterprise",
            Self::Partner => "Partner",
            Self::Apex => "Apex",
            Self::Metadata => "Metadata",
            Self::Tooling => "Tooling",
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Api {
    type Err = SoapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|api| api.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SoapError::UnknownApi(s.to_string()))
    }
}

/// A SOAP request under construction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    api: Api,
    method: String,
    session_id: Option<String>,
    headers: Complex,
    args: Value,
}

impl Envelope {
    /// Start a request calling `method` on `api`, with no arguments
    pub fn new(api: Api, method: impl Into<String>) -> Self {
        Self {
            api,
            method: method.into(),
            session_id: None,
            headers: Complex::new(),
            args: Value::default(),
        }
    }

    /// Authenticate the request with a `SessionHeader`
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Add a SOAP header such as `AllOrNoneHeader`
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the method arguments
    pub fn args(mut self, args: impl Into<Value>) -> Self {
        self.args = args.into();
        self
    }

    pub fn api(&self) -> Api {
        self.api
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Build the `soapenv:Envelope` element
    pub fn into_element(self) -> Element {
        let mut header = Complex::new();
        if let Some(session_id) = self.session_id {
            header.insert(
                "SessionHeader",
                Complex::new().with("sessionId", session_id),
            );
        }
        for (name, value) in self.headers {
            header.insert(name, value);
        }

        // An empty header is written as `<soapenv:Header></soapenv:Header>`,
        // which reads back as empty text.
        let header = if header.is_empty() {
            Value::default()
        } else {
            Value::Complex(header)
        };
        let body = Complex::new().with(self.method, self.args);
        let envelope = Complex::new().with(HEADER, header).with(BODY, body);

        Element::new(ENVELOPE, envelope).with_attributes(format!(
            "{ENVELOPE_NAMESPACES}{}",
            self.api.target_namespaces()
        ))
    }

    /// Serialize the request body
    pub fn to_xml(&self) -> String {
        debug!(api = %self.api, method = %self.method, "building SOAP request");
        crate::stringify(&self.clone().into_element())
    }
}

/// Interpret a SOAP response body
///
/// With `success` set (HTTP 200), returns the `result` of the
/// `{method}Response` element, or nil when the method returns nothing.
/// Otherwise returns the envelope's fault as [`SoapError::Fault`].
pub fn read_response(text: &str, method: &str, success: bool) -> Result<Value, SoapError> {
    let envelope = crate::parse(text)?;
    let body = take(envelope.value, BODY)?;

    if success {
        let response = take(body, &format!("{method}Response"))?;
        return Ok(take(response, "result").unwrap_or(Value::Nil));
    }

    let detail = take(body, FAULT)?;
    let code = detail["faultcode"].as_str().unwrap_or_default().to_string();
    let message = detail["faultstring"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    debug!(%code, %message, "SOAP fault");
    Err(SoapError::Fault {
        code,
        message,
        detail,
    })
}

fn take(value: Value, key: &str) -> Result<Value, SoapError> {
    match value {
        Value::Complex(mut complex) => complex.remove(key),
        _ => None,
    }
    .ok_or_else(|| SoapError::MissingElement(key.to_string()))
}

/// Request for the Partner API `login` call
pub fn login_request(username: &str, password: &str) -> Envelope {
    Envelope::new(Api::Partner, "login").args(
        Complex::new()
            .with("username", username)
            .with("password", password),
    )
}

/// Session established by a `login` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginResult {
    /// Instance hostname taken from `serverUrl`
    pub instance_host: String,
    pub session_id: String,
    /// The full `result` element
    pub raw: Value,
}

impl LoginResult {
    /// Extract the session from the value returned by [`read_response`]
    pub fn from_value(raw: Value) -> Result<Self, SoapError> {
        let server_url = raw["serverUrl"].as_str().unwrap_or_default();
        let instance_host = server_url
            .strip_prefix("https://")
            .and_then(|rest| rest.rfind("/services").and_then(|end| rest.get(..end)))
            .filter(|host| !host.is_empty())
            .ok_or_else(|| SoapError::MissingElement("serverUrl".to_string()))?
            .to_string();
        let session_id = raw["sessionId"]
            .as_str()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SoapError::MissingElement("sessionId".to_string()))?
            .to_string();

        Ok(Self {
            instance_host,
            session_id,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_paths() {
        assert_eq!(Api::Enterprise.service_path("39.0"), "/services/Soap/c/39.0");
        assert_eq!(Api::Partner.service_path("39.0"), "/services/Soap/u/39.0");
        assert_eq!(Api::Apex.service_path("39.0"), "/services/Soap/s/39.0");
        assert_eq!(Api::Metadata.service_path("39.0"), "/services/Soap/m/39.0");
        assert_eq!(Api::Tooling.service_path("39.0"), "/services/Soap/T/39.0");
    }

    #[test]
    fn test_api_from_str() {
        assert_eq!("metadata".parse::<Api>(), Ok(Api::Metadata));
        assert_eq!("Tooling".parse::<Api>(), Ok(Api::Tooling));
        assert!("Bulk".parse::<Api>().is_err());
    }

    #[test]
    fn test_envelope_xml() {
        let contact = Complex::with_type("Contact").with("LastName", "Smith");
        let xml = Envelope::new(Api::Enterprise, "create")
            .session_id("SID")
            .header("AllOrNoneHeader", Complex::new().with("allOrNone", "true"))
            .args(Complex::new().with("sObjects", contact))
            .to_xml();

        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\"",
            " xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\"",
            " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
            " xmlns=\"urn:enterprise.soap.sforce.com\" xmlns:sf=\"urn:sobject.enterprise.soap.sforce.com\">",
            "<soapenv:Header><SessionHeader><sessionId>SID</sessionId></SessionHeader>",
            "<AllOrNoneHeader><allOrNone>true</allOrNone></AllOrNoneHeader></soapenv:Header>",
            "<soapenv:Body><create><sObjects xsi:type=\"Contact\"><LastName>Smith</LastName></sObjects></create></soapenv:Body>",
            "</soapenv:Envelope>",
        );
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_envelope_roundtrips_through_parser() -> Result<(), Error> {
        let envelope = login_request("user@example.com", "p&ss").into_element();
        let parsed = crate::parse(&crate::stringify(&envelope))?;
        assert_eq!(parsed, envelope);
        Ok(())
    }

    #[test]
    fn test_read_response_result() -> Result<(), SoapError> {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:enterprise.soap.sforce.com">
  <soapenv:Body>
    <upsertResponse>
      <result><created>true</created><id>003000000000001</id><success>true</success></result>
      <result><created>false</created><id>003000000000002</id><success>true</success></result>
    </upsertResponse>
  </soapenv:Body>
</soapenv:Envelope>"#;
        let result = read_response(text, "upsert", true)?;
        let rows = result.items();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.first().map(|r| &r["created"]), Some(&Value::from("true")));
        assert_eq!(rows.get(1).map(|r| &r["success"]), Some(&Value::from("true")));
        Ok(())
    }

    #[test]
    fn test_read_response_without_result() -> Result<(), SoapError> {
        let text = "<soapenv:Envelope><soapenv:Body><logoutResponse/></soapenv:Body></soapenv:Envelope>";
        assert_eq!(read_response(text, "logout", true)?, Value::Nil);
        Ok(())
    }

    #[test]
    fn test_read_response_fault() {
        let text = "<soapenv:Envelope><soapenv:Body><soapenv:Fault>\
            <faultcode>sf:INVALID_LOGIN</faultcode>\
            <faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>\
            </soapenv:Fault></soapenv:Body></soapenv:Envelope>";
        let result = read_response(text, "login", false);
        assert!(matches!(
            &result,
            Err(SoapError::Fault { code, .. }) if code == "sf:INVALID_LOGIN"
        ));
        assert!(result.is_err_and(|err| err.to_string().starts_with("sf:INVALID_LOGIN: INVALID_LOGIN")));
    }

    #[test]
    fn test_read_response_missing_body() {
        let result = read_response("<soapenv:Envelope/>", "login", true);
        assert_eq!(
            result,
            Err(SoapError::MissingElement("soapenv:Body".to_string()))
        );
    }

    #[test]
    fn test_read_response_malformed() {
        let result = read_response("<soapenv:Envelope>", "login", true);
        assert!(matches!(result, Err(SoapError::Malformed(_))));
    }

    #[test]
    fn test_login_result() -> Result<(), SoapError> {
        let raw = Value::Complex(
            Complex::new()
                .with(
                    "serverUrl",
                    "https://na1.salesforce.com/services/Soap/u/39.0/00D000000000001",
                )
                .with("sessionId", "00D!AQ"),
        );
        let login = LoginResult::from_value(raw)?;
        assert_eq!(login.instance_host, "na1.salesforce.com");
        assert_eq!(login.session_id, "00D!AQ");
        Ok(())
    }

    #[test]
    fn test_login_result_requires_session() {
        let raw = Value::Complex(
            Complex::new().with("serverUrl", "https://na1.salesforce.com/services/Soap/u/39.0"),
        );
        assert_eq!(
            LoginResult::from_value(raw),
            Err(SoapError::MissingElement("sessionId".to_string()))
        );
    }
}
