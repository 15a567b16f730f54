use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::cats::repo_types::{birthdate_format, GeoPoint};

/// Request body for `POST /cat`. The owner is always the caller.
#[derive(Debug, Deserialize)]
pub struct CreateCatRequest {
    pub cat_name: String,
    pub weight: f64,
    #[serde(with = "birthdate_format")]
    pub birthdate: Date,
    #[serde(default)]
    pub filename: String,
    pub location: Option<GeoPoint>,
}

/// Request body for `PUT /cat/:id` and `PUT /cat/admin/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCatRequest {
    pub cat_name: Option<String>,
    pub weight: Option<f64>,
    #[serde(default, with = "birthdate_format::option")]
    pub birthdate: Option<Date>,
    pub filename: Option<String>,
    pub location: Option<GeoPoint>,
    pub owner: Option<Uuid>,
}

/// Query of `GET /cat/area`, each corner as `"lng,lat"`.
#[derive(Debug, Deserialize)]
pub struct AreaQuery {
    #[serde(rename = "topRight")]
    pub top_right: String,
    #[serde(rename = "bottomLeft")]
    pub bottom_left: String,
}
