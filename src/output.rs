//! Response assembly
//!
//! The output buffer collects the response body, the negotiated framing
//! mode, and any bad-request diagnostics raised while parsing. Diagnostics
//! never abort a request; they accumulate, force the status away from `Ok`,
//! and replace the normal body when the response is rendered.

use tracing::warn;

/// Status codes carried by the fixed16 response header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Ok = 200,
    BadRequest = 400,
    NotFound = 404,
    LimitExceeded = 413,
}

/// Response framing negotiated by the `ResponseHeader` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseHeader {
    /// Body only
    #[default]
    Off,
    /// 16-byte ASCII prefix: 3-digit status, space, 11-digit length, newline
    Fixed16,
}

/// Body encodings selectable by the `OutputFormat` header
///
/// `BrokenCsv` is the historical non-standard variant that predates proper
/// quoting; remote sites still request it under the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    BrokenCsv,
    Json,
    Python3,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::BrokenCsv => "csv",
            Self::Json => "json",
            Self::Python3 => "python3",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The four single-byte separators of the CSV-style encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvSeparators {
    /// Between datasets (rows)
    pub dataset: char,
    /// Between fields of a dataset
    pub field: char,
    /// Between elements of a list-valued field
    pub list: char,
    /// Between host and service in a service reference
    pub host_service: char,
}

impl Default for CsvSeparators {
    fn default() -> Self {
        Self {
            dataset: '\n',
            field: ';',
            list: ',',
            host_service: '|',
        }
    }
}

/// Accumulates one response
pub struct OutputBuffer {
    body: String,
    diagnostics: Vec<String>,
    response_code: ResponseCode,
    response_header: ResponseHeader,
    max_response_size: usize,
}

impl OutputBuffer {
    pub fn new(max_response_size: usize) -> Self {
        Self {
            body: String::new(),
            diagnostics: Vec::new(),
            response_code: ResponseCode::Ok,
            response_header: ResponseHeader::Off,
            max_response_size,
        }
    }

    /// Append body content.
    pub fn write(&mut self, content: &str) {
        self.body.push_str(content);
    }

    /// Record a diagnostic and downgrade the response status.
    ///
    /// The first error decides the status code; later diagnostics are still
    /// reported in the body.
    pub fn set_error(&mut self, code: ResponseCode, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "request error");
        if self.response_code == ResponseCode::Ok {
            self.response_code = code;
        }
        self.diagnostics.push(message);
    }

    pub fn set_response_header(&mut self, mode: ResponseHeader) {
        self.response_header = mode;
    }

    pub fn response_code(&self) -> ResponseCode {
        self.response_code
    }

    pub fn response_header(&self) -> ResponseHeader {
        self.response_header
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Render the final response, framing it if fixed16 was negotiated.
    ///
    /// An error status suppresses the normal body and ships the diagnostics
    /// instead.
    pub fn finish(mut self) -> Vec<u8> {
        if self.body.len() > self.max_response_size && !self.has_errors() {
            self.set_error(
                ResponseCode::LimitExceeded,
                format!(
                    "maximum response size of {} bytes exceeded",
                    self.max_response_size
                ),
            );
        }

        let payload = if self.has_errors() {
            let mut text = self.diagnostics.join("\n");
            text.push('\n');
            text
        } else {
            self.body
        };

        match self.response_header {
            ResponseHeader::Off => payload.into_bytes(),
            ResponseHeader::Fixed16 => {
                let mut out =
                    format!("{:03} {:11}\n", self.response_code as u16, payload.len());
                out.push_str(&payload);
                out.into_bytes()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 100 * 1024 * 1024;

    #[test]
    fn test_fixed16_header_shape() {
        let mut buffer = OutputBuffer::new(MAX);
        buffer.set_response_header(ResponseHeader::Fixed16);
        buffer.write("hello\n");
        let out = buffer.finish();

        let text = String::from_utf8(out).unwrap();
        let (header, body) = text.split_at(16);
        assert_eq!(header, "200           6\n");
        assert_eq!(body, "hello\n");
    }

    #[test]
    fn test_errors_replace_body() {
        let mut buffer = OutputBuffer::new(MAX);
        buffer.write("normal output\n");
        buffer.set_error(ResponseCode::BadRequest, "first problem");
        buffer.set_error(ResponseCode::NotFound, "second problem");
        assert_eq!(buffer.response_code(), ResponseCode::BadRequest);

        let out = String::from_utf8(buffer.finish()).unwrap();
        assert_eq!(out, "first problem\nsecond problem\n");
    }

    #[test]
    fn test_fixed16_error_status() {
        let mut buffer = OutputBuffer::new(MAX);
        buffer.set_response_header(ResponseHeader::Fixed16);
        buffer.set_error(ResponseCode::BadRequest, "bad");
        let out = String::from_utf8(buffer.finish()).unwrap();
        assert!(out.starts_with("400 "));
        assert!(out.ends_with("bad\n"));
    }

    #[test]
    fn test_oversized_body_is_rejected() {
        let mut buffer = OutputBuffer::new(8);
        buffer.write("way past the limit");
        let out = String::from_utf8(buffer.finish()).unwrap();
        assert!(out.contains("maximum response size of 8 bytes exceeded"));
    }

    #[test]
    fn test_default_separators() {
        let separators = CsvSeparators::default();
        assert_eq!(separators.dataset, '\n');
        assert_eq!(separators.field, ';');
        assert_eq!(separators.list, ',');
        assert_eq!(separators.host_service, '|');
    }
}
