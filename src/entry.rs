use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One recorded round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Older files wrote a `fr-FR` date under `date`; both spellings are read.
    #[serde(
        alias = "date",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: DateTime<Utc>,
    /// Older files may hold negative or oversized scores; they are clamped on read.
    #[serde(default, deserialize_with = "deserialize_score")]
    pub kaille: u32,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub francis: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    Kaille,
    Francis,
}

impl Player {
    /// Exact, case-sensitive match on the names the form submits.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Kaille" => Some(Player::Kaille),
            "Francis" => Some(Player::Francis),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::Kaille => "Kaille",
            Player::Francis => "Francis",
        }
    }
}

impl Entry {
    /// Build the entry for one round. An unrecognized player yields zero for both
    /// fields rather than an error.
    pub fn record(player: Option<Player>, points: u32, id: String, timestamp: DateTime<Utc>) -> Self {
        let (kaille, francis) = match player {
            Some(Player::Kaille) => (points, 0),
            Some(Player::Francis) => (0, points),
            None => (0, 0),
        };
        Self {
            id: Some(id),
            timestamp,
            kaille,
            francis,
        }
    }

    /// Player credited with this round, if any points were scored.
    pub fn scorer(&self) -> Option<Player> {
        if self.kaille > 0 {
            Some(Player::Kaille)
        } else if self.francis > 0 {
            Some(Player::Francis)
        } else {
            None
        }
    }
}

fn leading_int() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("static pattern"))
}

/// Parse points the way a browser's `parseInt` would read a form field, then clamp
/// to zero. "12abc" is 12, "abc" and "" are 0, "-4" is 0.
pub fn parse_points(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let Some(m) = leading_int().find(trimmed) else {
        return 0;
    };
    let digits = m.as_str();
    if digits.starts_with('-') {
        return 0;
    }
    let digits = digits.trim_start_matches('+').trim_start_matches('0');
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

/// Clamp a JSON number to the points range, truncating toward zero.
pub fn points_from_number(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    if value >= u32::MAX as f64 {
        return u32::MAX;
    }
    value.trunc() as u32
}

/// Time-ordered prefix plus random suffix, both base 36.
pub fn mint_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: u64 = rand::thread_rng().gen_range(0..36u64.pow(8));
    format!("{}{:0>8}", to_base36(millis), to_base36(suffix))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn deserialize_score<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    f64::deserialize(d).map(points_from_number)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

/// Accepts RFC 3339 instants and `dd/mm/yyyy` day stamps (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_points_like_parse_int() {
        assert_eq!(parse_points("5"), 5);
        assert_eq!(parse_points("  12abc"), 12);
        assert_eq!(parse_points("+7"), 7);
        assert_eq!(parse_points("007"), 7);
        assert_eq!(parse_points("abc"), 0);
        assert_eq!(parse_points(""), 0);
        assert_eq!(parse_points("3.9"), 3);
    }

    #[test]
    fn test_negative_points_clamp_to_zero() {
        assert_eq!(parse_points("-4"), 0);
        assert_eq!(points_from_number(-2.5), 0);
        assert_eq!(points_from_number(f64::NAN), 0);
        assert_eq!(points_from_number(9.99), 9);
    }

    #[test]
    fn test_record_credits_one_player() {
        let now = Utc::now();
        let k = Entry::record(Player::from_name("Kaille"), 5, "a".into(), now);
        assert_eq!((k.kaille, k.francis), (5, 0));
        let f = Entry::record(Player::from_name("Francis"), 7, "b".into(), now);
        assert_eq!((f.kaille, f.francis), (0, 7));
        assert_eq!(f.scorer(), Some(Player::Francis));
    }

    #[test]
    fn test_unknown_player_zeroes_both() {
        let e = Entry::record(Player::from_name("Unknown"), 5, "x".into(), Utc::now());
        assert_eq!((e.kaille, e.francis), (0, 0));
        assert_eq!(e.scorer(), None);
        assert!(Player::from_name("kaille").is_none());
    }

    #[test]
    fn test_ids_unique_in_burst() {
        let ids: HashSet<String> = (0..500).map(|_| mint_id()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_legacy_date_normalizes_to_midnight_utc() {
        let json = r#"{"date":"17/10/2026","kaille":3,"francis":0}"#;
        let e: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(e.id, None);
        assert_eq!(e.timestamp, Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap());
        let out = serde_json::to_string(&e).unwrap();
        assert!(out.contains(r#""timestamp":"2026-10-17T00:00:00.000Z""#));
        assert!(!out.contains("\"id\""));
    }

    #[test]
    fn test_iso_timestamp_round_trips() {
        let json = r#"{"id":"k1","timestamp":"2026-10-17T09:30:12.345Z","kaille":0,"francis":4}"#;
        let e: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&e).unwrap(), json);
    }

    #[test]
    fn test_out_of_range_scores_clamped_on_read() {
        let json = r#"{"date":"15/09/2026","kaille":-3,"francis":0}"#;
        let e: Entry = serde_json::from_str(json).unwrap();
        assert_eq!((e.kaille, e.francis), (0, 0));

        let json = r#"{"date":"15/09/2026","kaille":0,"francis":99999999999}"#;
        let e: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(e.francis, u32::MAX);
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let json = r#"{"timestamp":"yesterday","kaille":1,"francis":0}"#;
        assert!(serde_json::from_str::<Entry>(json).is_err());
    }
}
