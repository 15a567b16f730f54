//! In-memory store behind both repository ports, used by handler tests.

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cats::repo::CatRepo;
use crate::cats::repo_types::{BoundingBox, Cat, CatChanges, GeoPoint, NewCat};
use crate::users::dto::PublicUser;
use crate::users::repo::{DuplicateEmail, UserRepo};
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, Clone)]
struct StoredCat {
    id: Uuid,
    cat_name: String,
    weight: f64,
    birthdate: Date,
    filename: String,
    location: GeoPoint,
    owner_id: Uuid,
    created_at: OffsetDateTime,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    cats: Vec<StoredCat>,
}

impl Tables {
    /// Inner join on the owner, like the SQL queries.
    fn joined(&self, c: &StoredCat) -> Option<Cat> {
        let owner = self.users.iter().find(|u| u.id == c.owner_id)?;
        Some(Cat {
            id: c.id,
            cat_name: c.cat_name.clone(),
            weight: c.weight,
            birthdate: c.birthdate,
            filename: c.filename.clone(),
            location: c.location,
            owner: PublicUser::from(owner.clone()),
            created_at: c.created_at,
        })
    }

    fn select(&self, pred: impl Fn(&StoredCat) -> bool) -> Vec<Cat> {
        self.cats
            .iter()
            .filter(|c| pred(*c))
            .filter_map(|c| self.joined(c))
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(DuplicateEmail(new.email).into());
        }
        let user = User {
            id: Uuid::new_v4(),
            user_name: new.user_name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.write().await;
        if let Some(email) = &changes.email {
            if t.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(DuplicateEmail(email.clone()).into());
            }
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.user_name {
            user.user_name = v;
        }
        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.password_hash {
            user.password_hash = v;
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Ok(false);
        }
        // ON DELETE CASCADE
        t.cats.retain(|c| c.owner_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CatRepo for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<Cat>> {
        Ok(self.tables.read().await.select(|_| true))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Cat>> {
        Ok(self.tables.read().await.select(|c| c.id == id).pop())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Cat>> {
        Ok(self.tables.read().await.select(|c| c.owner_id == owner_id))
    }

    async fn list_within(&self, bbox: BoundingBox) -> anyhow::Result<Vec<Cat>> {
        Ok(self.tables.read().await.select(|c| bbox.contains(&c.location)))
    }

    async fn create(&self, new: NewCat) -> anyhow::Result<Cat> {
        let mut t = self.tables.write().await;
        if !t.users.iter().any(|u| u.id == new.owner_id) {
            anyhow::bail!("owner {} does not exist", new.owner_id);
        }
        let stored = StoredCat {
            id: Uuid::new_v4(),
            cat_name: new.cat_name,
            weight: new.weight,
            birthdate: new.birthdate,
            filename: new.filename,
            location: new.location,
            owner_id: new.owner_id,
            created_at: OffsetDateTime::now_utc(),
        };
        t.cats.push(stored.clone());
        t.joined(&stored)
            .ok_or_else(|| anyhow::anyhow!("owner vanished during insert"))
    }

    async fn update(&self, id: Uuid, changes: CatChanges) -> anyhow::Result<Option<Cat>> {
        let mut t = self.tables.write().await;
        if let Some(owner_id) = changes.owner_id {
            if !t.users.iter().any(|u| u.id == owner_id) {
                anyhow::bail!("owner {owner_id} does not exist");
            }
        }
        let Some(cat) = t.cats.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.cat_name {
            cat.cat_name = v;
        }
        if let Some(v) = changes.weight {
            cat.weight = v;
        }
        if let Some(v) = changes.birthdate {
            cat.birthdate = v;
        }
        if let Some(v) = changes.filename {
            cat.filename = v;
        }
        if let Some(v) = changes.location {
            cat.location = v;
        }
        if let Some(v) = changes.owner_id {
            cat.owner_id = v;
        }
        let cat = cat.clone();
        Ok(t.joined(&cat))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Cat>> {
        let mut t = self.tables.write().await;
        let Some(pos) = t.cats.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let removed = t.cats.remove(pos);
        Ok(t.joined(&removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            user_name: "tom".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_reported_as_such() {
        let store = MemoryStore::default();
        UserRepo::create(&store, new_user("tom@example.com")).await.unwrap();
        let err = UserRepo::create(&store, new_user("tom@example.com")).await.unwrap_err();
        assert!(err.downcast_ref::<DuplicateEmail>().is_some());

        let other = UserRepo::create(&store, new_user("ann@example.com")).await.unwrap();
        let changes = UserChanges {
            email: Some("tom@example.com".into()),
            ..Default::default()
        };
        let err = UserRepo::update(&store, other.id, changes).await.unwrap_err();
        assert!(err.downcast_ref::<DuplicateEmail>().is_some());
    }
}
