//! Wire types for the marketplace backend.
//!
//! The backend owns every entity here; the client only reads them (and, for
//! the owning user, writes profiles back). Field names follow the backend's
//! camelCase JSON; aliases cover the older snake_case and short forms it
//! still emits on some routes.

use serde::{Deserialize, Deserializer, Serialize};

/// Open/closed state of a tryout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TryoutStatus {
    /// Accepting applications.
    Open,
    /// No longer accepting applications.
    Closed,
    /// Anything else the backend reports (draft, cancelled, ...).
    #[default]
    #[serde(other)]
    Other,
}

impl TryoutStatus {
    /// Human-readable badge text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Other => "Unavailable",
        }
    }
}

/// A promoter-run tryout event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tryout {
    #[serde(alias = "tryoutId", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default", alias = "org_name", alias = "org")]
    pub org_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TryoutStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<u32>,
}

impl Tryout {
    /// Whether applications are being accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == TryoutStatus::Open
    }
}

/// Public wrestler profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrestlerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, alias = "userId", alias = "sub", skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", alias = "stage_name", alias = "name")]
    pub stage_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gimmicks: Vec<String>,
    #[serde(default, alias = "photo_key", skip_serializing_if = "Option::is_none")]
    pub photo_key: Option<String>,
}

impl WrestlerProfile {
    /// The identifier used in public profile URLs: handle, else subject id.
    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        self.handle
            .as_deref()
            .or(self.subject_id.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// "City, Region, Country" with empty parts dropped.
    #[must_use]
    pub fn location(&self) -> String {
        join_location(&self.city, &self.region, &self.country)
    }
}

/// Promoter (organisation) profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoterProfile {
    #[serde(default, alias = "userId", alias = "sub", skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", alias = "orgName", alias = "org_name")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio: String,
    #[serde(default, alias = "photo_key", skip_serializing_if = "Option::is_none")]
    pub photo_key: Option<String>,
}

impl PromoterProfile {
    /// "City, Region, Country" with empty parts dropped.
    #[must_use]
    pub fn location(&self) -> String {
        join_location(&self.city, &self.region, &self.country)
    }
}

/// A wrestler's application to a tryout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default, deserialize_with = "null_as_default", alias = "tryout_id")]
    pub tryout_id: String,
    #[serde(default, alias = "applicantProfile", alias = "profile")]
    pub applicant: Option<WrestlerProfile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, alias = "reel", alias = "reel_link")]
    pub reel_link: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", alias = "createdAt", alias = "created_at")]
    pub timestamp: String,
}

/// Upload target issued by `/s3/presign`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedTarget {
    /// Time-limited URL accepting a direct `PUT`.
    #[serde(alias = "uploadUrl", alias = "presignedUrl")]
    pub url: String,
    /// Object key the file will be stored under.
    #[serde(default)]
    pub key: Option<String>,
}

/// Options for a presigned upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Request server-side encryption (`AES256`); required for avatars.
    pub server_side_encryption: bool,
}

impl UploadOptions {
    /// Options for profile photo uploads.
    #[must_use]
    pub fn avatar() -> Self {
        Self {
            server_side_encryption: true,
        }
    }
}

fn join_location(city: &str, region: &str, country: &str) -> String {
    [city, region, country]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids arrive as either JSON strings or numbers depending on the route.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tryout_accepts_numeric_id_and_unknown_status() {
        let t: Tryout = serde_json::from_value(json!({
            "id": 42,
            "orgName": "Iron City Wrestling",
            "city": "Pittsburgh",
            "date": "2026-11-02",
            "status": "cancelled",
        }))
        .unwrap();
        assert_eq!(t.id, "42");
        assert_eq!(t.status, TryoutStatus::Other);
        assert_eq!(t.slots, None);
        assert!(!t.is_open());
    }

    #[test]
    fn null_fields_read_as_empty() {
        let tryouts: Vec<Tryout> = serde_json::from_value(json!([
            { "id": 1, "orgName": "North Star", "requirements": null, "status": null, "city": null },
            { "id": 2, "orgName": "Iron City", "requirements": "Boots" }
        ]))
        .unwrap();
        assert_eq!(tryouts.len(), 2);
        assert_eq!(tryouts[0].requirements, "");
        assert_eq!(tryouts[0].status, TryoutStatus::Other);
        assert_eq!(tryouts[1].requirements, "Boots");

        let w: WrestlerProfile = serde_json::from_value(json!({
            "stageName": "Dynamo", "bio": null, "gimmicks": null, "country": null
        }))
        .unwrap();
        assert_eq!(w.bio, "");
        assert!(w.gimmicks.is_empty());

        let p: PromoterProfile =
            serde_json::from_value(json!({ "name": null, "city": "Leeds" })).unwrap();
        assert_eq!(p.name, "");

        let a: Application =
            serde_json::from_value(json!({ "tryoutId": "t1", "notes": null, "createdAt": null }))
                .unwrap();
        assert_eq!(a.notes, "");
        assert_eq!(a.timestamp, "");
    }

    #[test]
    fn wrestler_slug_prefers_handle() {
        let mut p = WrestlerProfile {
            subject_id: Some("sub-1".to_owned()),
            ..WrestlerProfile::default()
        };
        assert_eq!(p.slug(), Some("sub-1"));
        p.handle = Some("the-bruiser".to_owned());
        assert_eq!(p.slug(), Some("the-bruiser"));
    }

    #[test]
    fn location_skips_blank_parts() {
        let p = PromoterProfile {
            city: "Leeds".to_owned(),
            region: " ".to_owned(),
            country: "UK".to_owned(),
            ..PromoterProfile::default()
        };
        assert_eq!(p.location(), "Leeds, UK");
    }

    #[test]
    fn application_reads_legacy_field_names() {
        let a: Application = serde_json::from_value(json!({
            "tryout_id": "t1",
            "applicantProfile": { "stageName": "Dynamo", "gimmicks": ["high-flyer"] },
            "reel": "https://video.example/reel",
            "createdAt": "2026-10-01T10:00:00Z",
        }))
        .unwrap();
        assert_eq!(a.tryout_id, "t1");
        assert_eq!(a.applicant.unwrap().stage_name, "Dynamo");
        assert_eq!(a.reel_link.as_deref(), Some("https://video.example/reel"));
        assert_eq!(a.timestamp, "2026-10-01T10:00:00Z");
    }
}
