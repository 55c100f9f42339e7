//! Content records and the payload strings QR readers expect for them.
//!
//! Each [`Content`] variant maps to one of the de-facto QR payload schemes:
//! raw text, URLs, `tel:`, `mailto:`, `WIFI:`, vCard 3.0 and iCalendar
//! `VEVENT`. Encoding is total: incomplete records produce payloads with
//! blank fields rather than errors.

use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Structured content to carry in a QR symbol.
///
/// Serialized as `{ "kind": "wifi", "payload": { ... } }`, so a payload
/// whose shape does not match its kind fails to deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum Content {
    Text(String),
    Url(String),
    Phone(String),
    Email(EmailData),
    Wifi(WifiConfig),
    Vcard(VCard),
    Event(EventData),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Text,
    Url,
    Phone,
    Email,
    Wifi,
    Vcard,
    Event,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Text => "text",
            ContentKind::Url => "url",
            ContentKind::Phone => "phone",
            ContentKind::Email => "email",
            ContentKind::Wifi => "wifi",
            ContentKind::Vcard => "vcard",
            ContentKind::Event => "event",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailData {
    pub address: String,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WifiSecurity {
    #[default]
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "nopass", alias = "open")]
    Open,
}

impl WifiSecurity {
    pub fn as_str(self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::Open => "nopass",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
    #[serde(alias = "encryption")]
    pub security: WifiSecurity,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VCard {
    #[serde(alias = "firstName")]
    pub given_name: String,
    #[serde(alias = "lastName")]
    pub family_name: String,
    pub email: String,
    pub phone: String,
    #[serde(alias = "company")]
    pub organization: String,
    #[serde(alias = "title")]
    pub job_title: String,
    pub website: String,
    pub address: String,
}

impl VCard {
    /// Given and family name joined by a space, ignoring blank parts.
    pub fn full_name(&self) -> String {
        [self.given_name.trim(), self.family_name.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EventData {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(alias = "startTime", with = "local_timestamp")]
    pub start: Option<NaiveDateTime>,
    #[serde(alias = "endTime", with = "local_timestamp")]
    pub end: Option<NaiveDateTime>,
    /// IANA zone name such as `Europe/Paris`; `UTC` produces `Z` timestamps,
    /// `None` produces floating local times.
    pub timezone: Option<String>,
}

impl EventData {
    /// Parses the timestamp shapes a browser form or an ICS file produces:
    /// `2024-05-01T10:00`, `2024-05-01T10:00:30` and `20240501T100030`.
    pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ValidationError> {
        let value = value.trim();
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .ok_or_else(|| ValidationError::InvalidTimestamp(value.to_string()))
    }
}

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y%m%dT%H%M%S",
    "%Y-%m-%d %H:%M",
];

const ICAL_TIMESTAMP: &str = "%Y%m%dT%H%M%S";

mod local_timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::EventData;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => EventData::parse_timestamp(&s).map(Some).map_err(de::Error::custom),
        }
    }
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Text(_) => ContentKind::Text,
            Content::Url(_) => ContentKind::Url,
            Content::Phone(_) => ContentKind::Phone,
            Content::Email(_) => ContentKind::Email,
            Content::Wifi(_) => ContentKind::Wifi,
            Content::Vcard(_) => ContentKind::Vcard,
            Content::Event(_) => ContentKind::Event,
        }
    }

    /// Parses the JSON shape the browser form submits.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::MalformedContent(e.to_string()))
    }

    /// `true` when there is nothing worth encoding yet, e.g. an untouched form.
    pub fn is_blank(&self) -> bool {
        match self {
            Content::Text(s) | Content::Url(s) | Content::Phone(s) => s.trim().is_empty(),
            Content::Email(email) => email.address.trim().is_empty(),
            Content::Wifi(wifi) => wifi.ssid.trim().is_empty(),
            Content::Vcard(card) => [
                &card.given_name,
                &card.family_name,
                &card.email,
                &card.phone,
                &card.organization,
                &card.job_title,
                &card.website,
                &card.address,
            ]
            .iter()
            .all(|field| field.trim().is_empty()),
            Content::Event(event) => {
                [&event.title, &event.description, &event.location]
                    .iter()
                    .all(|field| field.trim().is_empty())
                    && event.start.is_none()
                    && event.end.is_none()
            }
        }
    }

    /// Short label for lists of generated codes.
    pub fn title(&self) -> String {
        match self {
            Content::Text(text) => {
                let head: String = text.chars().take(30).collect();
                if text.chars().count() > 30 {
                    format!("Text: {}...", head)
                } else {
                    format!("Text: {}", head)
                }
            }
            Content::Url(url) => format!("URL: {}", url_host(url)),
            Content::Phone(number) => format!("Phone: {}", number),
            Content::Email(email) => format!("Email: {}", email.address),
            Content::Wifi(wifi) => format!("WiFi: {}", wifi.ssid),
            Content::Vcard(card) => format!("Contact: {}", card.full_name()).trim().to_string(),
            Content::Event(event) => format!("Event: {}", event.title),
        }
    }

    pub fn to_payload(&self) -> String {
        encode(self)
    }
}

/// Produces the literal payload string for `content`.
///
/// # Example
///
/// ```rust
/// use qrcraft::payload::{encode, Content, WifiConfig, WifiSecurity};
///
/// let wifi = Content::Wifi(WifiConfig {
///     ssid: "HomeNet".into(),
///     password: "secret123".into(),
///     security: WifiSecurity::Wpa,
/// });
/// assert_eq!(encode(&wifi), "WIFI:S:HomeNet;T:WPA;P:secret123;;");
/// ```
pub fn encode(content: &Content) -> String {
    match content {
        Content::Text(text) => text.clone(),
        Content::Url(url) => encode_url(url),
        Content::Phone(number) => format!("tel:{}", number),
        Content::Email(email) => encode_email(email),
        Content::Wifi(wifi) => encode_wifi(wifi),
        Content::Vcard(card) => encode_vcard(card),
        Content::Event(event) => encode_event(event),
    }
}

fn encode_url(url: &str) -> String {
    if url.is_empty() || has_scheme(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Matches `scheme://` where scheme is ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ).
fn has_scheme(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn url_host(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let end = rest.find(|c: char| matches!(c, '/' | '?' | '#')).unwrap_or(rest.len());
    &rest[..end]
}

fn encode_email(email: &EmailData) -> String {
    let mut out = format!("mailto:{}", email.address);
    let params: Vec<String> = [("subject", &email.subject), ("body", &email.body)]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect();
    if !params.is_empty() {
        out.push('?');
        out.push_str(&params.join("&"));
    }
    out
}

fn encode_wifi(wifi: &WifiConfig) -> String {
    format!(
        "WIFI:S:{};T:{};P:{};;",
        escape_wifi(&wifi.ssid),
        wifi.security.as_str(),
        escape_wifi(&wifi.password)
    )
}

fn escape_wifi(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// TEXT value escaping shared by vCard (RFC 6350) and iCalendar (RFC 5545).
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

fn encode_vcard(card: &VCard) -> String {
    let lines = [
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{}", escape_text(&card.full_name())),
        format!("EMAIL:{}", card.email),
        format!("TEL:{}", card.phone),
        format!("ORG:{}", escape_text(&card.organization)),
        format!("TITLE:{}", escape_text(&card.job_title)),
        format!("URL:{}", card.website),
        format!("ADR:{}", escape_text(&card.address)),
        "END:VCARD".to_string(),
    ];
    lines.join("\n")
}

fn encode_event(event: &EventData) -> String {
    let zone = event.timezone.as_deref().map(str::trim).filter(|z| !z.is_empty());
    let lines = [
        "BEGIN:VEVENT".to_string(),
        format!("SUMMARY:{}", escape_text(&event.title)),
        format!("DTSTART{}", ical_timestamp(event.start, zone)),
        format!("DTEND{}", ical_timestamp(event.end, zone)),
        format!("LOCATION:{}", escape_text(&event.location)),
        format!("DESCRIPTION:{}", escape_text(&event.description)),
        "END:VEVENT".to_string(),
    ];
    lines.join("\n")
}

/// Renders the property parameters and value after the property name,
/// e.g. `:20240501T100000Z` or `;TZID=Europe/Paris:20240501T100000`.
fn ical_timestamp(ts: Option<NaiveDateTime>, zone: Option<&str>) -> String {
    let Some(ts) = ts else {
        return ":".to_string();
    };
    let value = ts.format(ICAL_TIMESTAMP);
    match zone {
        None => format!(":{}", value),
        Some(z) if is_utc(z) => format!(":{}Z", value),
        Some(z) => format!(";TZID={}:{}", z, value),
    }
}

fn is_utc(zone: &str) -> bool {
    matches!(zone.to_ascii_uppercase().as_str(), "UTC" | "Z" | "GMT" | "ETC/UTC" | "ETC/GMT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_wifi_payload() {
        let content = Content::Wifi(WifiConfig {
            ssid: "HomeNet".into(),
            password: "secret123".into(),
            security: WifiSecurity::Wpa,
        });
        assert_eq!(encode(&content), "WIFI:S:HomeNet;T:WPA;P:secret123;;");
    }

    #[test]
    fn test_wifi_escapes_delimiters() {
        let content = Content::Wifi(WifiConfig {
            ssid: r"Cafe;Bar".into(),
            password: r#"a:b,c\d"e"#.into(),
            security: WifiSecurity::Open,
        });
        assert_eq!(encode(&content), r#"WIFI:S:Cafe\;Bar;T:nopass;P:a\:b\,c\\d\"e;;"#);
    }

    #[test]
    fn test_url_gets_scheme() {
        assert_eq!(encode(&Content::Url("example.com".into())), "https://example.com");
        assert_eq!(encode(&Content::Url("http://example.com".into())), "http://example.com");
        assert_eq!(encode(&Content::Url("ftp://files.example.com".into())), "ftp://files.example.com");
        assert_eq!(encode(&Content::Url("localhost:3000/x".into())), "https://localhost:3000/x");
    }

    #[test]
    fn test_text_and_phone() {
        assert_eq!(encode(&Content::Text("  hi; there ".into())), "  hi; there ");
        assert_eq!(encode(&Content::Phone("+1 (555) 010-0199".into())), "tel:+1 (555) 010-0199");
    }

    #[test]
    fn test_email_params() {
        let mut email = EmailData {
            address: "a@b.com".into(),
            subject: Some("Hi".into()),
            body: None,
        };
        assert_eq!(encode(&Content::Email(email.clone())), "mailto:a@b.com?subject=Hi");

        email.subject = Some(String::new());
        assert_eq!(encode(&Content::Email(email.clone())), "mailto:a@b.com");

        email.subject = Some("Lunch & more".into());
        email.body = Some("See you at 12?".into());
        assert_eq!(
            encode(&Content::Email(email)),
            "mailto:a@b.com?subject=Lunch%20%26%20more&body=See%20you%20at%2012%3F"
        );
    }

    #[test]
    fn test_vcard_layout() {
        let card = VCard {
            given_name: "Ada".into(),
            family_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+44 20 7946 0000".into(),
            organization: "Analytical Engines, Ltd".into(),
            job_title: "Programmer".into(),
            website: "https://ada.example".into(),
            address: String::new(),
        };
        assert_eq!(
            encode(&Content::Vcard(card)),
            "BEGIN:VCARD\nVERSION:3.0\nFN:Ada Lovelace\nEMAIL:ada@example.com\nTEL:+44 20 7946 0000\n\
             ORG:Analytical Engines\\, Ltd\nTITLE:Programmer\nURL:https://ada.example\nADR:\nEND:VCARD"
        );
    }

    #[test]
    fn test_empty_vcard_keeps_every_tag() {
        let payload = encode(&Content::Vcard(VCard::default()));
        let tags: Vec<&str> = payload.lines().map(|l| l.split(':').next().unwrap()).collect();
        assert_eq!(
            tags,
            ["BEGIN", "VERSION", "FN", "EMAIL", "TEL", "ORG", "TITLE", "URL", "ADR", "END"]
        );
    }

    #[test]
    fn test_event_formats_timestamps() {
        let mut event = EventData {
            title: "Launch; review".into(),
            description: "Line one\nLine two".into(),
            location: "Room 4".into(),
            start: Some(at(2024, 5, 1, 10, 0)),
            end: Some(at(2024, 5, 1, 11, 30)),
            timezone: Some("UTC".into()),
        };
        assert_eq!(
            encode(&Content::Event(event.clone())),
            "BEGIN:VEVENT\nSUMMARY:Launch\\; review\nDTSTART:20240501T100000Z\nDTEND:20240501T113000Z\n\
             LOCATION:Room 4\nDESCRIPTION:Line one\\nLine two\nEND:VEVENT"
        );

        event.timezone = Some("Europe/Paris".into());
        let payload = encode(&Content::Event(event.clone()));
        assert!(payload.contains("\nDTSTART;TZID=Europe/Paris:20240501T100000\n"));

        event.timezone = None;
        event.end = None;
        let payload = encode(&Content::Event(event));
        assert!(payload.contains("\nDTSTART:20240501T100000\nDTEND:\n"));
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        let expected = at(2024, 5, 1, 10, 0);
        assert_eq!(EventData::parse_timestamp("2024-05-01T10:00").unwrap(), expected);
        assert_eq!(EventData::parse_timestamp("2024-05-01T10:00:00").unwrap(), expected);
        assert_eq!(EventData::parse_timestamp("20240501T100000").unwrap(), expected);
        assert!(matches!(
            EventData::parse_timestamp("next tuesday"),
            Err(ValidationError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_content_from_browser_json() {
        let content = Content::from_json(
            r#"{"kind":"event","payload":{"title":"Standup","startTime":"2024-05-01T09:15","endTime":"","timezone":"UTC"}}"#,
        )
        .unwrap();
        match &content {
            Content::Event(event) => {
                assert_eq!(event.start, Some(at(2024, 5, 1, 9, 15)));
                assert_eq!(event.end, None);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }

        let wifi = Content::from_json(r#"{"kind":"wifi","payload":{"ssid":"Net","password":"pw","encryption":"nopass"}}"#)
            .unwrap();
        assert_eq!(encode(&wifi), "WIFI:S:Net;T:nopass;P:pw;;");

        let card = Content::from_json(r#"{"kind":"vcard","payload":{"firstName":"Grace","lastName":"Hopper","company":"Navy"}}"#)
            .unwrap();
        assert!(encode(&card).contains("\nFN:Grace Hopper\n"));
        assert!(encode(&card).contains("\nORG:Navy\n"));
    }

    #[test]
    fn test_mismatched_shape_rejected() {
        assert!(matches!(
            Content::from_json(r#"{"kind":"wifi","payload":"just a string"}"#),
            Err(ValidationError::MalformedContent(_))
        ));
        assert!(matches!(
            Content::from_json(r#"{"kind":"text","payload":{"ssid":"x"}}"#),
            Err(ValidationError::MalformedContent(_))
        ));
    }

    #[test]
    fn test_blank_detection() {
        assert!(Content::Text("   ".into()).is_blank());
        assert!(!Content::Text("a".into()).is_blank());
        assert!(Content::Vcard(VCard::default()).is_blank());
        assert!(Content::Event(EventData::default()).is_blank());
        let located = EventData { location: "Room 4".into(), ..Default::default() };
        assert!(!Content::Event(located).is_blank());
        let described = EventData { description: "Bring slides".into(), ..Default::default() };
        assert!(!Content::Event(described).is_blank());
        assert!(!Content::Email(EmailData { address: "x@y".into(), ..Default::default() }).is_blank());
    }

    #[test]
    fn test_titles() {
        assert_eq!(Content::Url("https://example.com/a?b".into()).title(), "URL: example.com");
        assert_eq!(
            Content::Text("abcdefghijklmnopqrstuvwxyz0123456789".into()).title(),
            "Text: abcdefghijklmnopqrstuvwxyz0123..."
        );
        let card = VCard { given_name: "Grace".into(), ..Default::default() };
        assert_eq!(Content::Vcard(card).title(), "Contact: Grace");
    }
}
