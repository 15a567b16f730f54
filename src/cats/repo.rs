use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cats::repo_types::{BoundingBox, Cat, CatChanges, CatRow, NewCat};

/// Persistence port for cat documents. Every read joins the owner.
#[async_trait]
pub trait CatRepo: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Cat>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Cat>>;
    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Cat>>;
    async fn list_within(&self, bbox: BoundingBox) -> anyhow::Result<Vec<Cat>>;
    async fn create(&self, new: NewCat) -> anyhow::Result<Cat>;
    /// Returns `None` when no cat has this id.
    async fn update(&self, id: Uuid, changes: CatChanges) -> anyhow::Result<Option<Cat>>;
    /// Returns the removed record, `None` when no cat has this id.
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Cat>>;
}

#[derive(Clone)]
pub struct PgCats {
    db: PgPool,
}

impl PgCats {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatRepo for PgCats {
    async fn list(&self) -> anyhow::Result<Vec<Cat>> {
        let rows = sqlx::query_as::<_, CatRow>(
            r#"
            SELECT c.id, c.cat_name, c.weight, c.birthdate, c.filename, c.lng, c.lat, c.created_at,
                   u.id AS owner_id, u.user_name AS owner_name, u.email AS owner_email
            FROM cats c
            JOIN users u ON u.id = c.owner_id
            ORDER BY c.created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list cats")?;
        Ok(rows.into_iter().map(Cat::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Cat>> {
        let row = sqlx::query_as::<_, CatRow>(
            r#"
            SELECT c.id, c.cat_name, c.weight, c.birthdate, c.filename, c.lng, c.lat, c.created_at,
                   u.id AS owner_id, u.user_name AS owner_name, u.email AS owner_email
            FROM cats c
            JOIN users u ON u.id = c.owner_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find cat by id")?;
        Ok(row.map(Cat::from))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Cat>> {
        let rows = sqlx::query_as::<_, CatRow>(
            r#"
            SELECT c.id, c.cat_name, c.weight, c.birthdate, c.filename, c.lng, c.lat, c.created_at,
                   u.id AS owner_id, u.user_name AS owner_name, u.email AS owner_email
            FROM cats c
            JOIN users u ON u.id = c.owner_id
            WHERE c.owner_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list cats by owner")?;
        Ok(rows.into_iter().map(Cat::from).collect())
    }

    async fn list_within(&self, bbox: BoundingBox) -> anyhow::Result<Vec<Cat>> {
        let rows = sqlx::query_as::<_, CatRow>(
            r#"
            SELECT c.id, c.cat_name, c.weight, c.birthdate, c.filename, c.lng, c.lat, c.created_at,
                   u.id AS owner_id, u.user_name AS owner_name, u.email AS owner_email
            FROM cats c
            JOIN users u ON u.id = c.owner_id
            WHERE c.lng BETWEEN $1 AND $3
              AND c.lat BETWEEN $2 AND $4
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(bbox.bottom_left.lng())
        .bind(bbox.bottom_left.lat())
        .bind(bbox.top_right.lng())
        .bind(bbox.top_right.lat())
        .fetch_all(&self.db)
        .await
        .context("list cats within box")?;
        Ok(rows.into_iter().map(Cat::from).collect())
    }

    async fn create(&self, new: NewCat) -> anyhow::Result<Cat> {
        let row = sqlx::query_as::<_, CatRow>(
            r#"
            WITH inserted AS (
                INSERT INTO cats (cat_name, weight, birthdate, filename, lng, lat, owner_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT i.id, i.cat_name, i.weight, i.birthdate, i.filename, i.lng, i.lat, i.created_at,
                   u.id AS owner_id, u.user_name AS owner_name, u.email AS owner_email
            FROM inserted i
            JOIN users u ON u.id = i.owner_id
            "#,
        )
        .bind(&new.cat_name)
        .bind(new.weight)
        .bind(new.birthdate)
        .bind(&new.filename)
        .bind(new.location.lng())
        .bind(new.location.lat())
        .bind(new.owner_id)
        .fetch_one(&self.db)
        .await
        .context("insert cat")?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, changes: CatChanges) -> anyhow::Result<Option<Cat>> {
        let row = sqlx::query_as::<_, CatRow>(
            r#"
            WITH updated AS (
                UPDATE cats
                SET cat_name  = COALESCE($2, cat_name),
                    weight    = COALESCE($3, weight),
                    birthdate = COALESCE($4, birthdate),
                    filename  = COALESCE($5, filename),
                    lng       = COALESCE($6, lng),
                    lat       = COALESCE($7, lat),
                    owner_id  = COALESCE($8, owner_id)
                WHERE id = $1
                RETURNING *
            )
            SELECT d.id, d.cat_name, d.weight, d.birthdate, d.filename, d.lng, d.lat, d.created_at,
                   u.id AS owner_id, u.user_name AS owner_name, u.email AS owner_email
            FROM updated d
            JOIN users u ON u.id = d.owner_id
            "#,
        )
        .bind(id)
        .bind(changes.cat_name)
        .bind(changes.weight)
        .bind(changes.birthdate)
        .bind(changes.filename)
        .bind(changes.location.map(|p| p.lng()))
        .bind(changes.location.map(|p| p.lat()))
        .bind(changes.owner_id)
        .fetch_optional(&self.db)
        .await
        .context("update cat")?;
        Ok(row.map(Cat::from))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Cat>> {
        let row = sqlx::query_as::<_, CatRow>(
            r#"
            WITH deleted AS (
                DELETE FROM cats WHERE id = $1
                RETURNING *
            )
            SELECT d.id, d.cat_name, d.weight, d.birthdate, d.filename, d.lng, d.lat, d.created_at,
                   u.id AS owner_id, u.user_name AS owner_name, u.email AS owner_email
            FROM deleted d
            JOIN users u ON u.id = d.owner_id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("delete cat")?;
        Ok(row.map(Cat::from))
    }
}
