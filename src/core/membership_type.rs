//! Membership type lookups and creation.

use crate::{
    entities::{MembershipType, membership_type},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Retrieves all membership types ordered by name.
pub async fn get_all_membership_types<C>(db: &C) -> Result<Vec<membership_type::Model>>
where
    C: ConnectionTrait,
{
    MembershipType::find()
        .order_by_asc(membership_type::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a membership type by its name.
pub async fn get_membership_type_by_name<C>(
    db: &C,
    name: &str,
) -> Result<Option<membership_type::Model>>
where
    C: ConnectionTrait,
{
    MembershipType::find()
        .filter(membership_type::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Name of the membership type with this id, if any.
pub async fn membership_type_name<C>(db: &C, type_id: Option<i64>) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let Some(type_id) = type_id else {
        return Ok(None);
    };
    Ok(MembershipType::find_by_id(type_id)
        .one(db)
        .await?
        .map(|t| t.name))
}

/// Creates a membership type. The name is trimmed and must not be empty.
pub async fn create_membership_type<C>(
    db: &C,
    name: &str,
    description: Option<String>,
) -> Result<membership_type::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Membership type name cannot be empty".to_string(),
        });
    }

    membership_type::ActiveModel {
        name: Set(name.trim().to_string()),
        description: Set(description),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
