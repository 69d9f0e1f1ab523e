//! Form body parsing: url-encoded fields and multipart uploads

use crate::Error;
use serde_json::{Map, Value};

/// Parse an url-encoded body into a field map; repeated keys keep the last value.
pub fn parse_form_map(body: &[u8]) -> Result<Map<String, Value>, Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))?;

    Ok(pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect())
}

/// Uploaded file descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original filename
    pub filename: String,
    /// Content type (MIME type)
    pub content_type: String,
    /// File size in bytes
    pub size: usize,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: String, content_type: String, data: Vec<u8>) -> Self {
        let size = data.len();
        Self {
            filename,
            content_type,
            size,
            data,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        self.filename.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// Save file to disk asynchronously
    pub async fn save_to(&self, path: &str) -> Result<(), Error> {
        tokio::fs::write(path, &self.data).await?;
        Ok(())
    }
}

/// One part of a multipart body
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    /// Value of a text field
    pub value: Option<String>,
    /// Payload of a file field
    pub file: Option<UploadedFile>,
}

/// Multipart form data parser
pub struct MultipartParser {
    boundary: String,
}

impl MultipartParser {
    /// Build a parser from a `multipart/form-data; boundary=...` header value
    pub fn from_content_type(content_type: &str) -> Result<Self, Error> {
        let boundary = content_type
            .split(';')
            .find_map(|part| {
                part.trim()
                    .strip_prefix("boundary=")
                    .map(|b| b.trim_matches('"').to_string())
            })
            .ok_or_else(|| Error::BadRequest("Missing boundary in Content-Type".to_string()))?;

        Ok(Self { boundary })
    }

    pub fn parse(&self, body: &[u8]) -> Result<Vec<FormField>, Error> {
        let marker = format!("--{}", self.boundary);
        let body = String::from_utf8_lossy(body);

        let mut fields = Vec::new();
        for part in body.split(marker.as_str()).skip(1) {
            let trimmed = part.trim();
            if trimmed.is_empty() || trimmed == "--" {
                continue;
            }
            if let Some(field) = parse_part(part)? {
                fields.push(field);
            }
        }

        Ok(fields)
    }
}

fn parse_part(part: &str) -> Result<Option<FormField>, Error> {
    let part = part.trim_start_matches("\r\n").trim_start_matches('\n');
    let (head, content) = match part.split_once("\r\n\r\n") {
        Some(split) => split,
        None => match part.split_once("\n\n") {
            Some(split) => split,
            None => return Ok(None),
        },
    };

    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in head.lines() {
        let Some((header, value)) = line.split_once(':') else {
            continue;
        };
        if header.trim().eq_ignore_ascii_case("content-disposition") {
            for attr in value.split(';').map(str::trim) {
                if let Some(v) = attr.strip_prefix("name=") {
                    name = Some(v.trim_matches('"').to_string());
                } else if let Some(v) = attr.strip_prefix("filename=") {
                    filename = Some(v.trim_matches('"').to_string());
                }
            }
        } else if header.trim().eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let name = name.ok_or_else(|| Error::BadRequest("Missing field name".to_string()))?;
    let content = content
        .strip_suffix("\r\n")
        .or_else(|| content.strip_suffix('\n'))
        .unwrap_or(content);

    let field = match filename {
        Some(filename) => FormField {
            name,
            value: None,
            file: Some(UploadedFile::new(
                filename,
                content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
                content.as_bytes().to_vec(),
            )),
        },
        None => FormField {
            name,
            value: Some(content.to_string()),
            file: None,
        },
    };

    Ok(Some(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_map() {
        let form = parse_form_map(b"nombre=Ana+Mar%C3%ADa&email=ana%40example.com&n=1&n=2").unwrap();

        assert_eq!(form["nombre"], "Ana María");
        assert_eq!(form["email"], "ana@example.com");
        assert_eq!(form["n"], "2");
    }

    #[test]
    fn test_multipart_text_and_file() {
        let body = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"nombre\"\r\n\r\n\
            ana\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"foto\"; filename=\"a.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            PNGDATA\r\n\
            --XyZ--\r\n";

        let parser = MultipartParser::from_content_type("multipart/form-data; boundary=XyZ").unwrap();
        let fields = parser.parse(body.as_bytes()).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "nombre");
        assert_eq!(fields[0].value.as_deref(), Some("ana"));

        let file = fields[1].file.as_ref().unwrap();
        assert_eq!(file.filename, "a.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.data, b"PNGDATA");
        assert_eq!(file.extension(), Some("png"));
    }

    #[test]
    fn test_missing_boundary() {
        assert!(MultipartParser::from_content_type("multipart/form-data").is_err());
    }
}
