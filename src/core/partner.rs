//! Partner business logic - Companies, contacts and their stored membership fields.
//!
//! Besides plain lookups this module holds the two partner-side rules:
//! a contact created under a member company inherits its membership
//! ([`create_partner`]), and editing a member partner refreshes the membership
//! values of its governing subscription ([`update_partner`]).

use crate::{
    core::{
        membership::{MembershipInfo, NewContactPolicy, new_contact_policy},
        subscription,
    },
    entities::{
        Partner, Subscription,
        partner::{self, AddressType},
        subscription as subscription_entity,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Values for a new partner.
#[derive(Debug, Clone)]
pub struct NewPartner {
    /// Display name
    pub name: String,
    /// Owning company
    pub parent_id: Option<i64>,
    /// Whether the partner is a company
    pub is_company: bool,
    /// Role inside the company
    pub address_type: AddressType,
    /// Street line
    pub street: Option<String>,
    /// Postal code
    pub zip: Option<String>,
    /// City
    pub city: Option<String>,
}

impl NewPartner {
    /// A top-level company without address.
    #[must_use]
    pub fn company(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent_id: None,
            is_company: true,
            address_type: AddressType::Contact,
            street: None,
            zip: None,
            city: None,
        }
    }

    /// A person working for `parent_id`.
    #[must_use]
    pub fn contact(name: &str, parent_id: i64) -> Self {
        Self {
            parent_id: Some(parent_id),
            is_company: false,
            ..Self::company(name)
        }
    }

    /// Sets the postal address.
    #[must_use]
    pub fn with_address(mut self, street: &str, zip: &str, city: &str) -> Self {
        self.street = Some(street.to_string());
        self.zip = Some(zip.to_string());
        self.city = Some(city.to_string());
        self
    }
}

/// Field changes applied by [`update_partner`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PartnerChanges {
    /// New display name
    pub name: Option<String>,
    /// New street line
    pub street: Option<Option<String>>,
    /// New postal code
    pub zip: Option<Option<String>>,
    /// New city
    pub city: Option<Option<String>>,
    /// Existing partners to attach as children of this partner
    pub new_child_ids: Vec<i64>,
}

/// Finds a partner by id.
pub async fn get_partner_by_id<C>(db: &C, partner_id: i64) -> Result<Option<partner::Model>>
where
    C: ConnectionTrait,
{
    Partner::find_by_id(partner_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a partner by id, failing when it does not exist.
pub async fn require_partner<C>(db: &C, partner_id: i64) -> Result<partner::Model>
where
    C: ConnectionTrait,
{
    get_partner_by_id(db, partner_id)
        .await?
        .ok_or_else(|| Error::PartnerNotFound {
            name: partner_id.to_string(),
        })
}

/// Finds a partner by its exact name.
pub async fn get_partner_by_name<C>(db: &C, name: &str) -> Result<Option<partner::Model>>
where
    C: ConnectionTrait,
{
    Partner::find()
        .filter(partner::Column::Name.eq(name))
        .order_by_asc(partner::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All partners ordered alphabetically.
pub async fn get_all_partners<C>(db: &C) -> Result<Vec<partner::Model>>
where
    C: ConnectionTrait,
{
    Partner::find()
        .order_by_asc(partner::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Direct children of a partner.
pub async fn get_children<C>(db: &C, partner_id: i64) -> Result<Vec<partner::Model>>
where
    C: ConnectionTrait,
{
    Partner::find()
        .filter(partner::Column::ParentId.eq(partner_id))
        .order_by_asc(partner::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of the direct children of a partner.
pub async fn child_ids<C>(db: &C, partner_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Ok(get_children(db, partner_id)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect())
}

/// Ids of every partner below `partner_id`, depth first.
pub async fn descendant_ids<C>(db: &C, partner_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let mut found = Vec::new();
    let mut frontier = vec![partner_id];
    while let Some(current) = frontier.pop() {
        for child in child_ids(db, current).await? {
            // Guard against parent cycles
            if child != partner_id && !found.contains(&child) {
                found.push(child);
                frontier.push(child);
            }
        }
    }
    Ok(found)
}

/// Writes the `is_member` flag when it differs from the stored value.
pub async fn set_member_flag<C>(db: &C, partner_id: i64, is_member: bool) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_partner(db, partner_id).await?;
    if existing.is_member == is_member {
        return Ok(());
    }

    debug!("Partner {} is_member -> {is_member}", existing.name);
    let mut model: partner::ActiveModel = existing.into();
    model.is_member = Set(is_member);
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    model.update(db).await?;
    Ok(())
}

/// Writes the membership dates and type when they differ from the stored values.
pub async fn write_membership_info<C>(db: &C, partner_id: i64, info: &MembershipInfo) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_partner(db, partner_id).await?;
    if MembershipInfo::of_partner(&existing) == *info {
        return Ok(());
    }

    let mut model: partner::ActiveModel = existing.into();
    model.date_first_start = Set(info.date_first_start);
    model.date_last_stop = Set(info.date_last_stop);
    model.membership_type = Set(info.membership_type.clone());
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    model.update(db).await?;
    Ok(())
}

/// Whether the partner's latest subscription is an individual membership.
pub async fn individual_member<C>(db: &C, partner_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(Subscription::find()
        .filter(subscription_entity::Column::PartnerId.eq(partner_id))
        .order_by_desc(subscription_entity::Column::Id)
        .one(db)
        .await?
        .is_some_and(|s| s.individual_member))
}

/// Number of membership subscriptions held by the partner.
pub async fn total_membership<C>(db: &C, partner_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(subscription_entity::Column::PartnerId.eq(partner_id))
        .filter(subscription_entity::Column::IsMembership.eq(true))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Applies the parent's membership policy to a freshly created contact.
async fn inherit_parent_membership<C>(db: &C, contact: &partner::Model, parent_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let parent = require_partner(db, parent_id).await?;
    if !parent.is_member {
        return Ok(());
    }

    let Some(latest) = subscription::latest_valid_subscription(db, parent.id).await? else {
        return Ok(());
    };

    let subscription_id = latest.subscription.id;
    match new_contact_policy(latest.subscription.all_members) {
        NewContactPolicy::Enroll => {
            set_member_flag(db, contact.id, true).await?;
            write_membership_info(db, contact.id, &MembershipInfo::of_partner(&parent)).await?;
            subscription::add_contact(db, subscription_id, contact.id).await?;
            info!(
                "Contact {} enrolled through subscription '{}' of {}",
                contact.name, latest.subscription.name, parent.name
            );
        }
        NewContactPolicy::ListOnly => {
            subscription::add_contact(db, subscription_id, contact.id).await?;
            debug!(
                "Contact {} listed on subscription '{}' without member flag",
                contact.name, latest.subscription.name
            );
        }
    }
    Ok(())
}

/// Creates a partner. A contact of a member company joins the company's latest
/// valid subscription: enrolled as member when it covers all members, only listed
/// otherwise.
pub async fn create_partner(db: &DatabaseConnection, new: NewPartner) -> Result<partner::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Partner name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    if let Some(parent_id) = new.parent_id {
        require_partner(&txn, parent_id).await?;
    }

    let now = chrono::Utc::now().naive_utc();
    let created = partner::ActiveModel {
        name: Set(new.name.trim().to_string()),
        parent_id: Set(new.parent_id),
        is_company: Set(new.is_company),
        address_type: Set(new.address_type),
        street: Set(new.street),
        zip: Set(new.zip),
        city: Set(new.city),
        is_member: Set(false),
        date_first_start: Set(None),
        date_last_stop: Set(None),
        membership_type: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(parent_id) = created.parent_id {
        inherit_parent_membership(&txn, &created, parent_id).await?;
    }

    let created = require_partner(&txn, created.id).await?;
    txn.commit().await?;
    Ok(created)
}

/// Applies changes to a partner.
///
/// When the partner holds a valid membership subscription, newly attached
/// children are enrolled if that subscription covers all members, and the
/// membership values of the partner and its member contacts are refreshed.
pub async fn update_partner(
    db: &DatabaseConnection,
    partner_id: i64,
    changes: PartnerChanges,
) -> Result<partner::Model> {
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(Error::Config {
            message: "Partner name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    let existing = require_partner(&txn, partner_id).await?;
    let mut model: partner::ActiveModel = existing.into();
    if let Some(name) = changes.name {
        model.name = Set(name.trim().to_string());
    }
    if let Some(street) = changes.street {
        model.street = Set(street);
    }
    if let Some(zip) = changes.zip {
        model.zip = Set(zip);
    }
    if let Some(city) = changes.city {
        model.city = Set(city);
    }
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    model.update(&txn).await?;

    for &child_id in &changes.new_child_ids {
        if child_id == partner_id {
            continue;
        }
        let child = require_partner(&txn, child_id).await?;
        let mut child: partner::ActiveModel = child.into();
        child.parent_id = Set(Some(partner_id));
        child.update(&txn).await?;
    }

    if let Some(latest) = subscription::latest_valid_subscription(&txn, partner_id).await? {
        if latest.subscription.all_members {
            for &child_id in changes.new_child_ids.iter().filter(|&&id| id != partner_id) {
                set_member_flag(&txn, child_id, true).await?;
                subscription::add_contact(&txn, latest.subscription.id, child_id).await?;
            }
        }
        subscription::update_membership_contacts_info(&txn, &[latest.subscription.id]).await?;
    }

    let updated = require_partner(&txn, partner_id).await?;
    txn.commit().await?;
    Ok(updated)
}
