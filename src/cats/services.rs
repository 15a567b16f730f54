use crate::{
    auth::extractors::AuthUser,
    cats::{
        dto::{CreateCatRequest, UpdateCatRequest},
        repo_types::{BoundingBox, Cat, CatChanges, GeoPoint, NewCat},
    },
    error::AppError,
};

/// Parses one `"lng,lat"` corner.
pub(crate) fn parse_corner(raw: &str) -> Result<GeoPoint, AppError> {
    let bad = || AppError::BadRequest(format!("Invalid coordinate pair {raw:?}"));
    let (lng, lat) = raw.split_once(',').ok_or_else(bad)?;
    let lng: f64 = lng.trim().parse().map_err(|_| bad())?;
    let lat: f64 = lat.trim().parse().map_err(|_| bad())?;
    let point = GeoPoint::new(lng, lat);
    if !point.is_valid() {
        return Err(bad());
    }
    Ok(point)
}

pub(crate) fn bounding_box(bottom_left: &str, top_right: &str) -> Result<BoundingBox, AppError> {
    let bottom_left = parse_corner(bottom_left)?;
    let top_right = parse_corner(top_right)?;
    if bottom_left.lng() > top_right.lng() || bottom_left.lat() > top_right.lat() {
        return Err(AppError::BadRequest(
            "bottomLeft must not lie above or right of topRight".into(),
        ));
    }
    Ok(BoundingBox {
        bottom_left,
        top_right,
    })
}

fn check_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("cat_name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn check_weight(weight: f64) -> Result<f64, AppError> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(AppError::BadRequest("weight must be a positive number".into()));
    }
    Ok(weight)
}

fn check_location(point: GeoPoint) -> Result<GeoPoint, AppError> {
    if !point.is_valid() {
        return Err(AppError::BadRequest("location is out of range".into()));
    }
    Ok(point)
}

pub(crate) fn new_cat(req: CreateCatRequest, owner: &AuthUser) -> Result<NewCat, AppError> {
    Ok(NewCat {
        cat_name: check_name(&req.cat_name)?,
        weight: check_weight(req.weight)?,
        birthdate: req.birthdate,
        filename: req.filename,
        location: check_location(req.location.unwrap_or_default())?,
        owner_id: owner.id,
    })
}

pub(crate) fn cat_changes(req: UpdateCatRequest) -> Result<CatChanges, AppError> {
    Ok(CatChanges {
        cat_name: req.cat_name.as_deref().map(check_name).transpose()?,
        weight: req.weight.map(check_weight).transpose()?,
        birthdate: req.birthdate,
        filename: req.filename,
        location: req.location.map(check_location).transpose()?,
        owner_id: req.owner,
    })
}

pub(crate) fn ensure_owner(caller: &AuthUser, cat: &Cat, action: &str) -> Result<(), AppError> {
    if cat.owner.id != caller.id {
        return Err(AppError::Forbidden(format!("Only owner can {action} cat")));
    }
    Ok(())
}

pub(crate) fn ensure_admin(caller: &AuthUser, action: &str) -> Result<(), AppError> {
    if !caller.is_admin() {
        return Err(AppError::Forbidden(format!("Only admin can {action}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{dto::PublicUser, repo_types::Role};
    use time::{macros::date, OffsetDateTime};
    use uuid::Uuid;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            user_name: "tom".into(),
            email: "tom@example.com".into(),
            role,
        }
    }

    fn cat_owned_by(owner: Uuid) -> Cat {
        Cat {
            id: Uuid::new_v4(),
            cat_name: "Misu".into(),
            weight: 4.0,
            birthdate: date!(2020 - 01 - 01),
            filename: String::new(),
            location: GeoPoint::default(),
            owner: PublicUser {
                id: owner,
                user_name: "x".into(),
                email: "x@example.com".into(),
            },
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn parses_corners_with_whitespace() {
        let p = parse_corner(" 24.93, 60.17 ").unwrap();
        assert_eq!(p, GeoPoint::new(24.93, 60.17));
    }

    #[test]
    fn rejects_malformed_corners() {
        for bad in ["", "1", "1;2", "a,b", "200,0", "0,-91"] {
            assert!(parse_corner(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rejects_inverted_box() {
        assert!(bounding_box("10,10", "0,0").is_err());
        assert!(bounding_box("0,10", "10,0").is_err());
        let bbox = bounding_box("0,0", "10,10").unwrap();
        assert!(bbox.contains(&GeoPoint::new(5.0, 5.0)));
    }

    #[test]
    fn new_cat_defaults_location_and_takes_caller_as_owner() {
        let me = caller(Role::User);
        let req = CreateCatRequest {
            cat_name: " Misu ".into(),
            weight: 3.5,
            birthdate: date!(2021 - 03 - 04),
            filename: "misu.jpg".into(),
            location: None,
        };
        let cat = new_cat(req, &me).unwrap();
        assert_eq!(cat.cat_name, "Misu");
        assert_eq!(cat.location, GeoPoint::new(0.0, 0.0));
        assert_eq!(cat.owner_id, me.id);
    }

    #[test]
    fn new_cat_rejects_bad_weight() {
        for weight in [0.0, -1.0, f64::INFINITY] {
            let req = CreateCatRequest {
                cat_name: "Misu".into(),
                weight,
                birthdate: date!(2021 - 03 - 04),
                filename: String::new(),
                location: None,
            };
            assert!(new_cat(req, &caller(Role::User)).is_err());
        }
    }

    #[test]
    fn changes_validate_present_fields_only() {
        let changes = cat_changes(UpdateCatRequest {
            weight: Some(6.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.weight, Some(6.0));
        assert!(changes.cat_name.is_none());

        assert!(cat_changes(UpdateCatRequest {
            cat_name: Some("  ".into()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn ownership_and_admin_checks() {
        let me = caller(Role::User);
        let admin = caller(Role::Admin);
        assert!(ensure_owner(&me, &cat_owned_by(me.id), "update").is_ok());
        assert!(matches!(
            ensure_owner(&me, &cat_owned_by(Uuid::new_v4()), "update"),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_admin(&admin, "delete cat").is_ok());
        assert!(matches!(ensure_admin(&me, "delete cat"), Err(AppError::Forbidden(_))));
    }
}
