//! Group repository: enumerating ledgers and their categories.
//!
//! Membership is owned by the surrounding product; this crate only reads it.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tally_core::ledger::Category;
use tally_shared::types::{CategoryId, GroupId};
use tracing::info;

use crate::entities::{categories, groups};
use crate::mapping::category_from_model;

/// Group repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns every group ID, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_group_ids(&self) -> Result<Vec<GroupId>, DbErr> {
        let groups = groups::Entity::find()
            .order_by_asc(groups::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(groups.into_iter().map(|g| g.id.into()).collect())
    }

    /// Creates a category in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_category(&self, group_id: GroupId, name: &str) -> Result<Category, DbErr> {
        let model = categories::ActiveModel {
            id: Set(CategoryId::new().into_inner()),
            group_id: Set(group_id.into_inner()),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;
        info!(category_id = %model.id, group_id = %group_id, "Category created");
        Ok(category_from_model(model))
    }

    /// Lists a group's live categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_categories(&self, group_id: GroupId) -> Result<Vec<Category>, DbErr> {
        let models = categories::Entity::find()
            .filter(categories::Column::GroupId.eq(group_id.into_inner()))
            .filter(categories::Column::DeletedAt.is_null())
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(category_from_model).collect())
    }
}
