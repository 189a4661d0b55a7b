//! Command and response templates.
//!
//! Command templates mix literal text with `$KEY$`, `$TEXT$` and
//! `$EXPECTED$` placeholders. Each placeholder is replaced by the raw bytes of
//! its value, so a rendered command is a byte string, not text. The literal
//! escapes `\n` and `\r` stand for the control characters.

use crate::{Error, Result};

pub const KEY_TOKEN: &str = "$KEY$";
pub const TEXT_TOKEN: &str = "$TEXT$";
pub const EXPECTED_TOKEN: &str = "$EXPECTED$";
pub const RESPONSE_TOKEN: &str = "$RESPONSE$";
pub const GLITCH_TOKEN: &str = "$GLITCH$";
pub const DEFAULT_GLITCH_BYTES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(Vec<u8>),
    Key,
    Text,
    Expected,
}

const PLACEHOLDERS: [(&str, Segment); 3] = [
    (KEY_TOKEN, Segment::Key),
    (TEXT_TOKEN, Segment::Text),
    (EXPECTED_TOKEN, Segment::Expected),
];

/// Values available for substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    pub key: Option<&'a [u8]>,
    pub text: Option<&'a [u8]>,
    pub expected: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl CommandTemplate {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            match PLACEHOLDERS.iter().find(|(token, _)| tail.starts_with(token)) {
                Some((token, segment)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(unescape(&literal)));
                        literal.clear();
                    }
                    segments.push(segment.clone());
                    rest = &tail[token.len()..];
                }
                None => {
                    literal.push('$');
                    rest = &tail[1..];
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(unescape(&literal)));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn uses(&self, segment: &Segment) -> bool {
        self.segments.contains(segment)
    }

    pub fn render(&self, vars: &TemplateVars) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for segment in &self.segments {
            let value = match segment {
                Segment::Literal(bytes) => bytes.as_slice(),
                Segment::Key => vars
                    .key
                    .ok_or_else(|| missing(KEY_TOKEN, "no encryption key loaded"))?,
                Segment::Text => vars
                    .text
                    .ok_or_else(|| missing(TEXT_TOKEN, "no input text loaded"))?,
                Segment::Expected => vars.expected.ok_or_else(|| {
                    missing(EXPECTED_TOKEN, "no reference result for this command")
                })?,
            };
            out.extend_from_slice(value);
        }
        Ok(out)
    }
}

fn missing(token: &str, why: &str) -> Error {
    Error::template(format!("{} referenced but {}", token, why))
}

/// Replace the two-character escapes `\n` and `\r` with control characters.
pub fn unescape(s: &str) -> Vec<u8> {
    s.replace("\\n", "\n").replace("\\r", "\r").into_bytes()
}

/// How the target's reply is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// The target sends nothing back.
    None,
    Response(ResponseTemplate),
    /// Forward `bytes` raw bytes to the glitch observer.
    Glitch { bytes: usize },
}

impl OutputFormat {
    pub fn parse(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Ok(Self::None);
        }

        if let Some(count) = source.strip_prefix(GLITCH_TOKEN) {
            let bytes = count.trim().parse().unwrap_or(DEFAULT_GLITCH_BYTES);
            return Ok(Self::Glitch { bytes });
        }

        let parts: Vec<&str> = source.split(RESPONSE_TOKEN).collect();
        match parts.as_slice() {
            [whole] => Ok(Self::Response(ResponseTemplate {
                prefix: unescape(whole),
                suffix: Vec::new(),
                has_payload: false,
            })),
            [prefix, suffix] => Ok(Self::Response(ResponseTemplate {
                prefix: unescape(prefix),
                suffix: unescape(suffix),
                has_payload: true,
            })),
            _ => Err(Error::template(format!(
                "output format {:?} contains more than one {}",
                source, RESPONSE_TOKEN
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    Short { expected: usize, received: usize },
    PrefixMismatch,
    SuffixMismatch,
}

/// Required prefix, a captured payload and a required suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTemplate {
    pub prefix: Vec<u8>,
    pub suffix: Vec<u8>,
    pub has_payload: bool,
}

impl ResponseTemplate {
    /// Total reply length for a payload of `output_len` bytes.
    pub fn frame_len(&self, output_len: usize) -> usize {
        let payload = if self.has_payload { output_len } else { 0 };
        self.prefix.len() + payload + self.suffix.len()
    }

    /// Check the framing of `response` and return the payload.
    pub fn extract(
        &self,
        response: &[u8],
        output_len: usize,
    ) -> std::result::Result<Vec<u8>, ResponseError> {
        let expected = self.frame_len(output_len);
        if response.len() < expected {
            return Err(ResponseError::Short {
                expected,
                received: response.len(),
            });
        }

        let (prefix, rest) = response.split_at(self.prefix.len());
        if prefix != self.prefix.as_slice() {
            return Err(ResponseError::PrefixMismatch);
        }

        let payload_len = if self.has_payload { output_len } else { 0 };
        let (payload, rest) = rest.split_at(payload_len);
        if &rest[..self.suffix.len()] != self.suffix.as_slice() {
            return Err(ResponseError::SuffixMismatch);
        }

        Ok(payload.to_vec())
    }
}
