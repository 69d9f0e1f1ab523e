// HTTP request and response types

use crate::Error;
use crate::form::{MultipartParser, UploadedFile, parse_form_map};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// How string values are cleaned when read from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SanitizeMode {
    /// Values exactly as received
    Raw,
    /// Trimmed, then HTML special characters escaped as entities
    Html,
    /// Trimmed, then quotes, backslashes and control bytes escaped for SQL
    /// string literals. Only a second line of defence; statements still bind
    /// parameters.
    Sql,
    /// Surrounding whitespace removed
    #[default]
    Trim,
}

impl SanitizeMode {
    pub fn apply_str(&self, value: &str) -> String {
        match self {
            SanitizeMode::Raw => value.to_string(),
            SanitizeMode::Trim => value.trim().to_string(),
            SanitizeMode::Html => escape_html(value.trim()),
            SanitizeMode::Sql => escape_sql(value.trim()),
        }
    }

    /// Sanitize every string inside `value`, keeping arrays and objects intact.
    pub fn apply(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.apply_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.apply(v)).collect()),
            Value::Object(map) => Value::Object(self.apply_map(map)),
            other => other.clone(),
        }
    }

    pub fn apply_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter()
            .map(|(k, v)| (k.clone(), self.apply(v)))
            .collect()
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_sql(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}

/// Where request values are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Query,
    /// Url-encoded or multipart text fields
    Form,
    Json,
    /// Form fields merged with the JSON body; JSON wins on collisions
    Input,
}

/// Canonical header spelling: `content_type` and `CONTENT-TYPE` both become
/// `Content-Type`.
pub fn canonical_header_name(name: &str) -> String {
    name.trim()
        .replace('_', "-")
        .split('-')
        .map(|part| {
            let lower = part.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Header map keyed by canonical names, so lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(canonical_header_name(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&canonical_header_name(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&canonical_header_name(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Path parameters in the order they appear in the route pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    /// Decoded path without the query string
    pub path: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub path_params: PathParams,
    pub query_params: HashMap<String, String>,
    form: Map<String, Value>,
    json: Option<Map<String, Value>>,
    files: HashMap<String, UploadedFile>,
    attributes: HashMap<String, Value>,
    sanitize: SanitizeMode,
}

impl HttpRequest {
    pub fn new(method: String, path: String) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path,
            headers: Headers::new(),
            body: Vec::new(),
            path_params: PathParams::new(),
            query_params: HashMap::new(),
            form: Map::new(),
            json: None,
            files: HashMap::new(),
            attributes: HashMap::new(),
            sanitize: SanitizeMode::default(),
        }
    }

    /// Normalize raw transport data into a request.
    ///
    /// The query string is split off and parsed (repeated keys keep the last
    /// value), the path is percent-decoded, form and multipart bodies are
    /// parsed by content type, and any non-empty body that decodes as a JSON
    /// object becomes the JSON body. A body that is not valid JSON is simply
    /// treated as having no JSON.
    pub fn from_parts<I>(method: &str, uri: &str, headers: I, body: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let (raw_path, query) = match uri.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (uri, None),
        };
        let path = urlencoding::decode(raw_path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| raw_path.to_string());

        let mut request = Self::new(method.to_string(), path);
        for (name, value) in headers {
            request.headers.insert(&name, value);
        }
        if let Some(query) = query {
            request.query_params = parse_query_string(query);
        }
        request.body = body;
        request.parse_body();
        request
    }

    fn parse_body(&mut self) {
        if self.body.is_empty() {
            return;
        }

        let content_type = self.header("Content-Type").unwrap_or_default().to_string();
        let media_type = content_type.to_ascii_lowercase();

        if media_type.starts_with("application/x-www-form-urlencoded") {
            if let Ok(form) = parse_form_map(&self.body) {
                self.form = form;
            }
        } else if media_type.starts_with("multipart/form-data")
            && let Ok(parser) = MultipartParser::from_content_type(&content_type)
            && let Ok(fields) = parser.parse(&self.body)
        {
            for field in fields {
                match (field.value, field.file) {
                    (_, Some(file)) => {
                        self.files.insert(field.name, file);
                    }
                    (Some(value), None) => {
                        self.form.insert(field.name, Value::String(value));
                    }
                    (None, None) => {}
                }
            }
        }

        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&self.body) {
            self.json = Some(map);
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Set a JSON body (also stored as raw bytes with a JSON content type)
    pub fn with_json(mut self, value: Value) -> Self {
        self.body = serde_json::to_vec(&value).unwrap_or_default();
        self.headers.insert("Content-Type", "application/json");
        self.json = match value {
            Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }

    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), Value::String(value.into()));
        self
    }

    /// Default mode used by the shorthand accessors
    pub fn with_sanitize_mode(mut self, mode: SanitizeMode) -> Self {
        self.sanitize = mode;
        self
    }

    pub fn sanitize_mode(&self) -> SanitizeMode {
        self.sanitize
    }

    fn source_map(&self, source: Source) -> Map<String, Value> {
        match source {
            Source::Query => self
                .query_params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            Source::Form => self.form.clone(),
            Source::Json => self.json.clone().unwrap_or_default(),
            Source::Input => {
                let mut merged = self.form.clone();
                if let Some(json) = &self.json {
                    for (k, v) in json {
                        merged.insert(k.clone(), v.clone());
                    }
                }
                merged
            }
        }
    }

    /// Every value of a source, sanitized with `mode`
    pub fn all(&self, source: Source, mode: SanitizeMode) -> Map<String, Value> {
        mode.apply_map(&self.source_map(source))
    }

    /// One value of a source, sanitized with `mode`
    pub fn get(&self, source: Source, key: &str, mode: SanitizeMode) -> Option<Value> {
        let value = match source {
            Source::Query => self.query_params.get(key).map(|v| Value::String(v.clone())),
            Source::Form => self.form.get(key).cloned(),
            Source::Json => self.json.as_ref().and_then(|j| j.get(key)).cloned(),
            Source::Input => self
                .json
                .as_ref()
                .and_then(|j| j.get(key))
                .or_else(|| self.form.get(key))
                .cloned(),
        };
        value.map(|v| mode.apply(&v))
    }

    /// One value of a source, or `default` when absent
    pub fn get_or(&self, source: Source, key: &str, default: Value, mode: SanitizeMode) -> Value {
        self.get(source, key, mode).unwrap_or(default)
    }

    pub fn query(&self) -> Map<String, Value> {
        self.all(Source::Query, self.sanitize)
    }

    pub fn query_value(&self, key: &str) -> Option<Value> {
        self.get(Source::Query, key, self.sanitize)
    }

    pub fn json(&self) -> Map<String, Value> {
        self.all(Source::Json, self.sanitize)
    }

    pub fn json_value(&self, key: &str) -> Option<Value> {
        self.get(Source::Json, key, self.sanitize)
    }

    pub fn input(&self) -> Map<String, Value> {
        self.all(Source::Input, self.sanitize)
    }

    pub fn input_value(&self, key: &str) -> Option<Value> {
        self.get(Source::Input, key, self.sanitize)
    }

    /// Input exactly as received
    pub fn raw_input(&self) -> Map<String, Value> {
        self.all(Source::Input, SanitizeMode::Raw)
    }

    /// Whether a JSON object body was received
    pub fn has_json(&self) -> bool {
        self.json.is_some()
    }

    /// Deserialize the raw body
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Deserialization(e.to_string()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    /// Get a path parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// True when the client reached us over HTTPS (directly or via a proxy)
    pub fn is_https(&self) -> bool {
        self.header("X-Forwarded-Proto")
            .map(|p| p.eq_ignore_ascii_case("https"))
            .unwrap_or(false)
    }
}

/// Parse a query string; repeated keys keep the last value
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

/// HTTP response wrapper
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// JSON document response
    pub fn json(value: Value, status: u16) -> Self {
        Self::new(status)
            .with_body(value.to_string().into_bytes())
            .header("Content-Type", "application/json")
    }

    pub fn html(content: impl Into<String>, status: u16) -> Self {
        Self::new(status)
            .with_body(content.into().into_bytes())
            .header("Content-Type", "text/html; charset=UTF-8")
    }

    pub fn text(content: impl Into<String>, status: u16) -> Self {
        Self::new(status)
            .with_body(content.into().into_bytes())
            .header("Content-Type", "text/plain; charset=UTF-8")
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// `{"status":"success","data":...}`
    pub fn success(data: Value, status: u16) -> Self {
        Self::json(json!({ "status": "success", "data": data }), status)
    }

    /// `{"status":"success","message":...}`
    pub fn message(message: &str, status: u16) -> Self {
        Self::json(json!({ "status": "success", "message": message }), status)
    }

    /// `{"status":"error","message":...}`
    pub fn error(message: &str, status: u16) -> Self {
        Self::json(json!({ "status": "error", "message": message }), status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// Parse the body back as JSON
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Finish the response for the transport. Consuming `self` means a
    /// response can only ever be sent once.
    pub fn send(self) -> http::Response<Bytes> {
        let mut builder = http::Response::builder().status(self.status);
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder
            .body(Bytes::from(self.body))
            .unwrap_or_else(|_| {
                let mut fallback = http::Response::new(Bytes::from_static(
                    br#"{"status":"error","message":"Internal server error"}"#,
                ));
                *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("content_type"), "Content-Type");
        assert_eq!(canonical_header_name("AUTHORIZATION"), "Authorization");
        assert_eq!(canonical_header_name("x-forwarded-proto"), "X-Forwarded-Proto");
    }

    #[test]
    fn test_headers_case_insensitive() {
        let req = HttpRequest::new("GET".into(), "/".into()).with_header("content-type", "text/html");
        assert_eq!(req.header("Content-Type"), Some("text/html"));
        assert_eq!(req.header("CONTENT_TYPE"), Some("text/html"));
    }

    #[test]
    fn test_from_parts_splits_query_and_decodes_path() {
        let req = HttpRequest::from_parts(
            "get",
            "/api/clientes/buscar%20uno?nombre=ana&nombre=eva&x=1",
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/api/clientes/buscar uno");
        assert_eq!(req.query_params.get("nombre").map(String::as_str), Some("eva"));
        assert_eq!(req.query_params.get("x").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_invalid_json_is_no_json() {
        let req = HttpRequest::from_parts(
            "POST",
            "/",
            vec![("content-type".to_string(), "application/json".to_string())],
            b"{not json".to_vec(),
        );
        assert!(!req.has_json());
        assert!(req.json().is_empty());
    }

    #[test]
    fn test_json_modes() {
        let body = br#"{"a":1,"b":" <x> "}"#.to_vec();
        let req = HttpRequest::from_parts("POST", "/", Vec::new(), body);

        let raw = req.all(Source::Json, SanitizeMode::Raw);
        assert_eq!(raw["a"], 1);
        assert_eq!(raw["b"], " <x> ");

        let html = req.all(Source::Json, SanitizeMode::Html);
        assert_eq!(html["b"], "&lt;x&gt;");

        assert_eq!(req.json()["b"], "<x>");
    }

    #[test]
    fn test_nested_sanitization_keeps_structure() {
        let value = json!({"xs": [" a ", {"q": "O'Hara"}], "n": null, "t": true});

        let sql = SanitizeMode::Sql.apply(&value);
        assert_eq!(sql, json!({"xs": ["a", {"q": "O\\'Hara"}], "n": null, "t": true}));

        let html = SanitizeMode::Html.apply(&value);
        assert_eq!(html["xs"][1]["q"], "O&#039;Hara");
    }

    #[test]
    fn test_input_merges_form_and_json() {
        let req = HttpRequest::new("POST".into(), "/".into())
            .with_form_field("a", "form")
            .with_form_field("b", "form")
            .with_json(json!({"b": "json"}));

        let input = req.input();
        assert_eq!(input["a"], "form");
        assert_eq!(input["b"], "json");
        assert_eq!(req.input_value("b"), Some(json!("json")));
        assert_eq!(
            req.get_or(Source::Input, "zz", json!("def"), SanitizeMode::Trim),
            json!("def")
        );
    }

    #[test]
    fn test_form_body_parsed_by_content_type() {
        let req = HttpRequest::from_parts(
            "POST",
            "/login",
            vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            b"email=+ana%40example.com+".to_vec(),
        );

        assert_eq!(req.get(Source::Form, "email", SanitizeMode::Trim), Some(json!("ana@example.com")));
        assert_eq!(req.raw_input()["email"], " ana@example.com ");
    }

    #[test]
    fn test_attributes() {
        let mut req = HttpRequest::new("GET".into(), "/".into());
        req.set_attribute("usuario", json!({"id": 7}));
        assert_eq!(req.attribute("usuario"), Some(&json!({"id": 7})));
        assert!(req.attribute("otro").is_none());
    }

    #[test]
    fn test_response_builders() {
        let res = HttpResponse::json(json!({"ok": true}), 201);
        assert_eq!(res.status, 201);
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.body_json(), Some(json!({"ok": true})));

        let html = HttpResponse::html("<p>hola</p>", 200);
        assert!(html.content_type().unwrap().starts_with("text/html"));

        let text = HttpResponse::text("hola", 202).header("X-Test", "1");
        assert_eq!(text.headers.get("X-Test").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_envelopes() {
        let ok = HttpResponse::success(json!([1, 2]), 200);
        assert_eq!(ok.body_json(), Some(json!({"status": "success", "data": [1, 2]})));

        let err = HttpResponse::error("mal", 400);
        assert_eq!(err.body_json(), Some(json!({"status": "error", "message": "mal"})));
    }

    #[test]
    fn test_send_produces_transport_response() {
        let sent = HttpResponse::text("hola", 203).header("X-A", "b").send();
        assert_eq!(sent.status().as_u16(), 203);
        assert_eq!(sent.headers()["X-A"], "b");
        assert_eq!(sent.body().as_ref(), b"hola");
    }
}
