//! Canonical, provider-agnostic DNS record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::native::Original;
use crate::error::Error;

/// Default TTL for records declared without one
pub const DEFAULT_TTL: u32 = 300;

/// DNS record types known to zonesync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    /// CNAME-like record permitted at the zone apex by some providers
    Alias,
    Caa,
    Cname,
    Ds,
    Loc,
    Mx,
    Ns,
    Ptr,
    Soa,
    Srv,
    Sshfp,
    Tlsa,
    Txt,
}

impl RecordType {
    /// Upper-case mnemonic as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Alias => "ALIAS",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Ds => "DS",
            RecordType::Loc => "LOC",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Srv => "SRV",
            RecordType::Sshfp => "SSHFP",
            RecordType::Tlsa => "TLSA",
            RecordType::Txt => "TXT",
        }
    }

    /// Whether the value of this type is a host name
    pub fn has_host_target(&self) -> bool {
        matches!(
            self,
            RecordType::Alias
                | RecordType::Cname
                | RecordType::Mx
                | RecordType::Ns
                | RecordType::Ptr
                | RecordType::Srv
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rtype = match s.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "ALIAS" => RecordType::Alias,
            "CAA" => RecordType::Caa,
            "CNAME" => RecordType::Cname,
            "DS" => RecordType::Ds,
            "LOC" => RecordType::Loc,
            "MX" => RecordType::Mx,
            "NS" => RecordType::Ns,
            "PTR" => RecordType::Ptr,
            "SOA" => RecordType::Soa,
            "SRV" => RecordType::Srv,
            "SSHFP" => RecordType::Sshfp,
            "TLSA" => RecordType::Tlsa,
            "TXT" => RecordType::Txt,
            _ => return Err(Error::validation(s, "unsupported record type")),
        };
        Ok(rtype)
    }
}

impl TryFrom<String> for RecordType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordType> for String {
    fn from(rtype: RecordType) -> Self {
        rtype.as_str().to_string()
    }
}

/// Key of a group of records: a label, optionally narrowed to one type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    /// Fully-qualified, lower-case owner name without trailing dot
    pub name_fqdn: String,
    /// Record type, `None` when the key covers every type at the label
    pub rtype: Option<RecordType>,
}

impl RecordKey {
    /// Key for one (label, type) record set
    pub fn new(name_fqdn: impl Into<String>, rtype: RecordType) -> Self {
        Self {
            name_fqdn: name_fqdn.into(),
            rtype: Some(rtype),
        }
    }

    /// Key for every record at a label
    pub fn label(name_fqdn: impl Into<String>) -> Self {
        Self {
            name_fqdn: name_fqdn.into(),
            rtype: None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rtype {
            Some(rtype) => write!(f, "{} {}", self.name_fqdn, rtype),
            None => f.write_str(&self.name_fqdn),
        }
    }
}

/// Canonical DNS record
///
/// Labels are stored lower-case. The exact-case label and any numeric
/// identifier the provider uses live in [`Original`], which is the only
/// authoritative source for provider lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Short label relative to the zone (`@` for the apex)
    pub name: String,

    /// Fully-qualified name, filled in by [`Record::canonicalize`]
    #[serde(default)]
    pub name_fqdn: String,

    /// Record type
    #[serde(rename = "type")]
    pub rtype: RecordType,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Record value; for TXT the concatenation of all segments
    #[serde(default)]
    pub target: String,

    /// MX preference
    #[serde(default)]
    pub mx_preference: u16,

    /// SRV priority
    #[serde(default)]
    pub srv_priority: u16,

    /// SRV weight
    #[serde(default)]
    pub srv_weight: u16,

    /// SRV port
    #[serde(default)]
    pub srv_port: u16,

    /// TXT segments
    #[serde(default)]
    pub txt: Vec<String>,

    /// Native record this one was translated from, if fetched from a provider
    #[serde(skip)]
    pub original: Option<Original>,
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

impl Record {
    /// Create a record at `label` in `zone`
    pub fn new(zone: &str, label: &str, rtype: RecordType, target: impl Into<String>) -> Self {
        let mut record = Self {
            name: String::new(),
            name_fqdn: String::new(),
            rtype,
            ttl: DEFAULT_TTL,
            target: target.into(),
            mx_preference: 0,
            srv_priority: 0,
            srv_weight: 0,
            srv_port: 0,
            txt: Vec::new(),
            original: None,
        };
        record.set_label(label, zone);
        if rtype == RecordType::Txt {
            record.txt = vec![record.target.clone()];
        }
        record
    }

    /// Create a TXT record from its segments
    pub fn txt(zone: &str, label: &str, segments: Vec<String>) -> Self {
        let mut record = Self::new(zone, label, RecordType::Txt, String::new());
        record.set_txt(segments);
        record
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the MX preference
    pub fn with_mx_preference(mut self, preference: u16) -> Self {
        self.mx_preference = preference;
        self
    }

    /// Set the SRV priority, weight and port
    pub fn with_srv(mut self, priority: u16, weight: u16, port: u16) -> Self {
        self.srv_priority = priority;
        self.srv_weight = weight;
        self.srv_port = port;
        self
    }

    /// Attach the native record this one was read from
    pub fn with_original(mut self, original: Original) -> Self {
        self.original = Some(original);
        self
    }

    /// Set the label relative to `zone`, lower-casing it
    pub fn set_label(&mut self, label: &str, zone: &str) {
        let zone = normalize_zone(zone);
        let label = label.trim_end_matches('.').to_ascii_lowercase();
        let short = if label.is_empty() || label == "@" || label == zone {
            "@".to_string()
        } else {
            label
                .strip_suffix(&format!(".{zone}"))
                .map(str::to_string)
                .unwrap_or(label)
        };
        self.name_fqdn = if short == "@" {
            zone
        } else {
            format!("{short}.{zone}")
        };
        self.name = short;
    }

    /// Replace the TXT segments, keeping `target` in sync
    pub fn set_txt(&mut self, segments: Vec<String>) {
        self.target = segments.concat();
        self.txt = segments;
    }

    /// Fill in derived fields of a record declared in configuration
    pub fn canonicalize(&mut self, zone: &str) {
        let label = self.name.clone();
        self.set_label(&label, zone);
        if self.rtype == RecordType::Txt {
            if self.txt.is_empty() {
                self.txt = vec![self.target.clone()];
            } else {
                self.set_txt(self.txt.clone());
            }
        }
        if self.rtype.has_host_target() {
            self.target = qualify(&self.target, zone);
        }
    }

    /// Whether the record sits at the zone apex
    pub fn is_apex(&self) -> bool {
        self.name == "@"
    }

    /// Key of the record set this record belongs to
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.name_fqdn.clone(), self.rtype)
    }

    /// Type-specific rdata in presentation form
    pub fn content(&self) -> String {
        match self.rtype {
            RecordType::Mx => format!("{} {}", self.mx_preference, self.target),
            RecordType::Srv => format!(
                "{} {} {} {}",
                self.srv_priority, self.srv_weight, self.srv_port, self.target
            ),
            RecordType::Txt => self
                .txt
                .iter()
                .map(|segment| quote_txt(segment))
                .collect::<Vec<_>>()
                .join(" "),
            _ => self.target.clone(),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.name_fqdn == other.name_fqdn
            && self.rtype == other.rtype
            && self.ttl == other.ttl
            && self.content() == other.content()
    }
}

impl Eq for Record {}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ttl={}",
            self.name_fqdn,
            self.rtype,
            self.content(),
            self.ttl
        )
    }
}

/// Lower-case a zone name and strip any trailing dot
pub fn normalize_zone(zone: &str) -> String {
    zone.trim_end_matches('.').to_ascii_lowercase()
}

/// Make a host name fully qualified (with trailing dot) relative to `zone`
pub fn qualify(target: &str, zone: &str) -> String {
    if target.ends_with('.') {
        return target.to_string();
    }
    let zone = normalize_zone(zone);
    if target.is_empty() || target == "@" {
        format!("{zone}.")
    } else {
        format!("{target}.{zone}.")
    }
}

/// Quote one TXT segment for presentation
pub fn quote_txt(segment: &str) -> String {
    let escaped = segment.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_lower_cased_and_qualified() {
        let record = Record::new("Example.com.", "Www", RecordType::A, "192.0.2.1");
        assert_eq!(record.name, "www");
        assert_eq!(record.name_fqdn, "www.example.com");

        let apex = Record::new("example.com", "@", RecordType::A, "192.0.2.1");
        assert!(apex.is_apex());
        assert_eq!(apex.name_fqdn, "example.com");
    }

    #[test]
    fn fqdn_labels_are_trimmed_to_short_form() {
        let record = Record::new("example.com", "mail.example.com.", RecordType::A, "192.0.2.1");
        assert_eq!(record.name, "mail");
    }

    #[test]
    fn record_type_parses_case_insensitively() {
        assert_eq!("srv".parse::<RecordType>().unwrap(), RecordType::Srv);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!("WKS".parse::<RecordType>().is_err());
    }

    #[test]
    fn content_renders_type_specific_fields() {
        let mx = Record::new("example.com", "@", RecordType::Mx, "mx.example.com.").with_mx_preference(10);
        assert_eq!(mx.content(), "10 mx.example.com.");

        let srv = Record::new("example.com", "_sip._tcp", RecordType::Srv, "sip.example.com.")
            .with_srv(10, 20, 5060);
        assert_eq!(srv.content(), "10 20 5060 sip.example.com.");

        let txt = Record::txt("example.com", "@", vec!["v=spf1".into(), "say \"hi\"".into()]);
        assert_eq!(txt.content(), r#""v=spf1" "say \"hi\"""#);
        assert_eq!(txt.target, "v=spf1say \"hi\"");
    }

    #[test]
    fn equality_ignores_original() {
        let a = Record::new("example.com", "www", RecordType::A, "192.0.2.1");
        let b = a.clone().with_original(Original::Rows(Vec::new()));
        assert_eq!(a, b);
        assert_ne!(a, b.with_ttl(60));
    }

    #[test]
    fn records_deserialize_from_config() {
        let mut record: Record = serde_json::from_str(
            r#"{"name": "Mail", "type": "mx", "target": "mx.example.com.", "mx_preference": 5}"#,
        )
        .unwrap();
        record.canonicalize("example.com");
        assert_eq!(record.name_fqdn, "mail.example.com");
        assert_eq!(record.rtype, RecordType::Mx);
        assert_eq!(record.ttl, DEFAULT_TTL);
        assert_eq!(record.mx_preference, 5);
    }

    #[test]
    fn txt_segments_from_config_fill_target() {
        let mut record: Record =
            serde_json::from_str(r#"{"name": "@", "type": "TXT", "txt": ["v=spf1", " -all"]}"#).unwrap();
        record.canonicalize("example.com");
        assert_eq!(record.target, "v=spf1 -all");
        assert_eq!(record.txt, vec!["v=spf1", " -all"]);
    }
}
