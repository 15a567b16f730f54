use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::users::dto::PublicUser;

/// `YYYY-MM-DD` on the wire, shared by stored cats and request bodies.
pub mod birthdate_format {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).map_err(S::Error::custom)?)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        Date::parse(&raw, FORMAT).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| Date::parse(&raw, FORMAT).map_err(D::Error::custom))
                .transpose()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PointKind {
    #[default]
    Point,
}

/// GeoJSON-style point, coordinates are `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    #[serde(rename = "type", default)]
    pub kind: PointKind,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            kind: PointKind::Point,
            coordinates: [lng, lat],
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.lng()) && (-90.0..=90.0).contains(&self.lat())
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        GeoPoint::new(0.0, 0.0)
    }
}

/// Axis-aligned box, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub bottom_left: GeoPoint,
    pub top_right: GeoPoint,
}

impl BoundingBox {
    pub fn contains(&self, p: &GeoPoint) -> bool {
        (self.bottom_left.lng()..=self.top_right.lng()).contains(&p.lng())
            && (self.bottom_left.lat()..=self.top_right.lat()).contains(&p.lat())
    }
}

/// Cat as returned to clients, owner projected to its public fields.
#[derive(Debug, Clone, Serialize)]
pub struct Cat {
    pub id: Uuid,
    pub cat_name: String,
    pub weight: f64,
    #[serde(with = "birthdate_format")]
    pub birthdate: Date,
    pub filename: String,
    pub location: GeoPoint,
    pub owner: PublicUser,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row of `cats` joined with its owner.
#[derive(Debug, Clone, FromRow)]
pub struct CatRow {
    pub id: Uuid,
    pub cat_name: String,
    pub weight: f64,
    pub birthdate: Date,
    pub filename: String,
    pub lng: f64,
    pub lat: f64,
    pub created_at: OffsetDateTime,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_email: String,
}

impl From<CatRow> for Cat {
    fn from(r: CatRow) -> Self {
        Self {
            id: r.id,
            cat_name: r.cat_name,
            weight: r.weight,
            birthdate: r.birthdate,
            filename: r.filename,
            location: GeoPoint::new(r.lng, r.lat),
            owner: PublicUser {
                id: r.owner_id,
                user_name: r.owner_name,
                email: r.owner_email,
            },
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCat {
    pub cat_name: String,
    pub weight: f64,
    pub birthdate: Date,
    pub filename: String,
    pub location: GeoPoint,
    pub owner_id: Uuid,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CatChanges {
    pub cat_name: Option<String>,
    pub weight: Option<f64>,
    pub birthdate: Option<Date>,
    pub filename: Option<String>,
    pub location: Option<GeoPoint>,
    pub owner_id: Option<Uuid>,
}
