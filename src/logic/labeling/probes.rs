//! Built-in Probes
//!
//! Shallow format checks standing in for the full metadata extractors.
//! Each one reads a bounded prefix of the file and answers "applies" or not.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::label::FileLabel;
use super::probe::{Probe, ProbeMismatch, ProbeReport};

/// Max bytes a structural parser (json/xml) will load
const MAX_STRUCTURED_BYTES: u64 = 16 * 1024 * 1024;

/// Bytes sampled by the text-oriented probes
const TEXT_SAMPLE_BYTES: u64 = 64 * 1024;

/// Keywords reported by the keyword probe
const MAX_KEYWORDS: usize = 10;

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z][A-Za-z'-]{2,}").expect("static regex")
});

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
    "was", "one", "our", "out", "has", "him", "his", "how", "its", "may", "new", "now",
    "see", "who", "did", "get", "let", "she", "too", "use", "that", "with", "have",
    "this", "will", "your", "from", "they", "been", "were", "said", "each", "which",
    "their", "there", "what", "about", "would", "these", "other", "into", "than",
    "then", "them", "some", "could", "also", "only", "over", "such",
];

// ============================================================================
// HELPERS
// ============================================================================

/// Read at most `limit` bytes; returns (bytes, whether the file was truncated)
fn read_prefix(path: &Path, limit: u64) -> std::io::Result<(Vec<u8>, bool)> {
    let file = File::open(path)?;
    let mut buf = Vec::new();
    file.take(limit + 1).read_to_end(&mut buf)?;
    let truncated = buf.len() as u64 > limit;
    buf.truncate(limit as usize);
    Ok((buf, truncated))
}

/// Decode a sample as UTF-8, tolerating a multi-byte char cut at the end
fn decode_utf8(bytes: &[u8]) -> Result<&str, ProbeMismatch> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) if e.error_len().is_none() => {
            // Safe: valid_up_to is a char boundary
            Ok(std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default())
        }
        Err(e) => Err(ProbeMismatch::new(format!("not utf-8 text: {}", e))),
    }
}

fn looks_binary(text: &str) -> bool {
    let controls = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        .count();
    text.contains('\0') || controls * 20 > text.chars().count().max(1)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}

// ============================================================================
// NETCDF
// ============================================================================

/// NetCDF classic/64-bit/CDF5 and NetCDF-4 (HDF5) signature check
pub struct NetcdfProbe;

const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";

impl Probe for NetcdfProbe {
    fn name(&self) -> &'static str {
        "netcdf"
    }

    fn label(&self) -> FileLabel {
        FileLabel::Netcdf
    }

    fn attempt(&self, path: &Path) -> Result<ProbeReport, ProbeMismatch> {
        let (head, _) = read_prefix(path, 8)?;
        if head.len() >= 4 && &head[..3] == b"CDF" && matches!(head[3], 1 | 2 | 5) {
            return Ok(ProbeReport::new(1, format!("netcdf classic v{}", head[3])));
        }
        if head.starts_with(HDF5_SIGNATURE) {
            return Ok(ProbeReport::new(1, "netcdf-4/hdf5"));
        }
        Err(ProbeMismatch::new("no netcdf signature"))
    }
}

// ============================================================================
// JSON / XML
// ============================================================================

/// Full JSON parse, or a well-formedness scan for XML
pub struct JsonXmlProbe;

impl Probe for JsonXmlProbe {
    fn name(&self) -> &'static str {
        "jsonxml"
    }

    fn label(&self) -> FileLabel {
        FileLabel::JsonXml
    }

    fn attempt(&self, path: &Path) -> Result<ProbeReport, ProbeMismatch> {
        let (bytes, truncated) = read_prefix(path, MAX_STRUCTURED_BYTES)?;
        if truncated {
            return Err(ProbeMismatch::new("file too large for structural parse"));
        }
        let bytes = strip_bom(&bytes);
        let first = bytes.iter().find(|b| !b.is_ascii_whitespace());

        match first {
            Some(b'{') | Some(b'[') => {
                let value: serde_json::Value = serde_json::from_slice(bytes)
                    .map_err(|e| ProbeMismatch::new(format!("json: {}", e)))?;
                let signal = match &value {
                    serde_json::Value::Object(map) => map.len(),
                    serde_json::Value::Array(items) => items.len(),
                    _ => 1,
                };
                Ok(ProbeReport::new(signal, "json"))
            }
            Some(b'<') => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| ProbeMismatch::new(format!("xml: {}", e)))?;
                let elements = check_xml(text).map_err(ProbeMismatch::new)?;
                Ok(ProbeReport::new(elements, "xml"))
            }
            _ => Err(ProbeMismatch::new("does not start like json or xml")),
        }
    }
}

/// Verify tags are balanced; returns the number of elements
fn check_xml(text: &str) -> Result<usize, String> {
    let mut stack: Vec<&str> = Vec::new();
    let mut elements = 0;
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        rest = &rest[start..];
        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body.find("-->").ok_or("unterminated comment")?;
            rest = &body[end + 3..];
            continue;
        }
        if let Some(body) = rest.strip_prefix("<![CDATA[") {
            let end = body.find("]]>").ok_or("unterminated cdata")?;
            rest = &body[end + 3..];
            continue;
        }
        let end = rest.find('>').ok_or("unterminated tag")?;
        let tag = &rest[1..end];
        rest = &rest[end + 1..];

        if tag.starts_with('?') || tag.starts_with('!') {
            continue;
        }
        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => return Err(format!("mismatched </{}> for <{}>", name, open)),
                None => return Err(format!("unexpected </{}>", name)),
            }
            continue;
        }

        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .ok_or("empty tag")?;
        if stack.is_empty() && elements > 0 {
            return Err("multiple root elements".to_string());
        }
        elements += 1;
        if !self_closing {
            stack.push(name);
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed <{}>", open));
    }
    if elements == 0 {
        return Err("no elements".to_string());
    }
    Ok(elements)
}

// ============================================================================
// TABULAR
// ============================================================================

/// Delimiter sniffing: consistent multi-column rows
pub struct TabularProbe;

const DELIMITERS: &[char] = &[',', '\t', ';', '|'];

/// Field count of one line, ignoring delimiters inside double quotes
fn count_fields(line: &str, delimiter: char) -> usize {
    let mut in_quotes = false;
    let mut fields = 1;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            fields += 1;
        }
    }
    fields
}

impl Probe for TabularProbe {
    fn name(&self) -> &'static str {
        "tabular"
    }

    fn label(&self) -> FileLabel {
        FileLabel::Tabular
    }

    fn attempt(&self, path: &Path) -> Result<ProbeReport, ProbeMismatch> {
        let (bytes, truncated) = read_prefix(path, TEXT_SAMPLE_BYTES)?;
        let text = decode_utf8(strip_bom(&bytes))?;
        if looks_binary(text) {
            return Err(ProbeMismatch::new("binary content"));
        }

        let mut lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if truncated {
            // Last line was cut by the sample
            lines.pop();
        }
        if lines.len() < 2 {
            return Err(ProbeMismatch::new("fewer than two rows"));
        }

        for &delimiter in DELIMITERS {
            let columns = count_fields(lines[0], delimiter);
            if columns > 1 && lines.iter().all(|l| count_fields(l, delimiter) == columns) {
                return Ok(ProbeReport::new(
                    columns,
                    format!("{} columns delimited by {:?}", columns, delimiter),
                ));
            }
        }
        Err(ProbeMismatch::new("no consistent delimiter"))
    }
}

// ============================================================================
// KEYWORD (free text)
// ============================================================================

/// Frequency-ranked keywords from UTF-8 text
pub struct KeywordProbe;

impl KeywordProbe {
    pub fn keywords(text: &str) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in WORD_RE.find_iter(text) {
            let word = word.as_str().to_lowercase();
            if STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.into_iter().take(MAX_KEYWORDS).map(|(w, _)| w).collect()
    }
}

impl Probe for KeywordProbe {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn label(&self) -> FileLabel {
        FileLabel::FreeText
    }

    fn attempt(&self, path: &Path) -> Result<ProbeReport, ProbeMismatch> {
        let (bytes, _) = read_prefix(path, TEXT_SAMPLE_BYTES)?;
        let text = decode_utf8(strip_bom(&bytes))?;
        if looks_binary(text) {
            return Err(ProbeMismatch::new("binary content"));
        }
        let keywords = Self::keywords(text);
        Ok(ProbeReport::new(keywords.len(), keywords.join(",")))
    }

    fn requires_signal(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_netcdf_signatures() {
        let dir = tempdir().unwrap();
        let classic = write(dir.path(), "a.nc", b"CDF\x01\x00\x00\x00\x00");
        let hdf5 = write(dir.path(), "b.nc", b"\x89HDF\r\n\x1a\n\x00\x00");
        let other = write(dir.path(), "c.nc", b"CDF\x09");

        assert!(NetcdfProbe.attempt(&classic).is_ok());
        assert!(NetcdfProbe.attempt(&hdf5).is_ok());
        assert!(NetcdfProbe.attempt(&other).is_err());
    }

    #[test]
    fn test_json_probe() {
        let dir = tempdir().unwrap();
        let good = write(dir.path(), "a.json", br#"{"a": 1, "b": [1, 2]}"#);
        let bad = write(dir.path(), "b.json", br#"{"a": 1,"#);

        assert_eq!(JsonXmlProbe.attempt(&good).unwrap().signal, 2);
        assert!(JsonXmlProbe.attempt(&bad).is_err());
    }

    #[test]
    fn test_xml_probe() {
        let dir = tempdir().unwrap();
        let good = write(
            dir.path(),
            "a.xml",
            b"<?xml version=\"1.0\"?>\n<!-- c --><root a=\"1\"><item/><item>x</item></root>",
        );
        let bad = write(dir.path(), "b.xml", b"<root><item></root>");

        assert_eq!(JsonXmlProbe.attempt(&good).unwrap().signal, 3);
        assert!(JsonXmlProbe.attempt(&bad).is_err());
    }

    #[test]
    fn test_tabular_probe() {
        let dir = tempdir().unwrap();
        let csv = write(dir.path(), "a.csv", b"name,age\n\"Doe, J\",42\nSmith,7\n");
        let tsv = write(dir.path(), "a.tsv", b"x\ty\tz\n1\t2\t3\n");
        let ragged = write(dir.path(), "b.csv", b"a,b,c\n1,2\n");
        let single = write(dir.path(), "c.csv", b"a,b,c\n");

        assert_eq!(TabularProbe.attempt(&csv).unwrap().signal, 2);
        assert_eq!(TabularProbe.attempt(&tsv).unwrap().signal, 3);
        assert!(TabularProbe.attempt(&ragged).is_err());
        assert!(TabularProbe.attempt(&single).is_err());
    }

    #[test]
    fn test_keyword_probe() {
        let dir = tempdir().unwrap();
        let prose = write(
            dir.path(),
            "notes.txt",
            b"Ocean temperature measurements were collected near the ocean floor.",
        );
        let empty = write(dir.path(), "empty.txt", b"a b c 1 2 3");
        let binary = write(dir.path(), "blob.bin", &[0u8, 159, 146, 150, 255, 0]);

        let report = KeywordProbe.attempt(&prose).unwrap();
        assert!(report.signal > 0);
        assert!(report.detail.starts_with("ocean"));

        assert_eq!(KeywordProbe.attempt(&empty).unwrap().signal, 0);
        assert!(KeywordProbe.attempt(&binary).is_err());
    }

    #[test]
    fn test_missing_file_is_mismatch() {
        let err = TabularProbe.attempt(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.0.starts_with("io:"));
    }
}
