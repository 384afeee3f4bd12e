//! Subscription business logic - Membership agreements and status propagation.
//!
//! Every create or update of a subscription re-runs two rules inside the same
//! database transaction:
//!
//! 1. [`update_subscription_member`] flags or unflags the primary partner and
//!    the eligible listed contacts depending on whether the subscription is a
//!    valid membership.
//! 2. [`update_membership_contacts_info`] recomputes the membership dates and
//!    type of the primary partner and copies them onto member contacts.
//!
//! The decisions themselves are pure functions in `core::membership`.

use crate::{
    core::{
        membership::{
            MemberPlan, MembershipInfo, SubscriptionRecord, derive_membership_info,
            latest_validated, plan_member_refresh, plan_member_updates,
        },
        membership_type, partner, stage,
    },
    entities::{
        Partner, Subscription, SubscriptionContact, SubscriptionStage, partner as partner_entity,
        subscription, subscription_contact, subscription_stage,
        subscription_stage::StageCategory,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Values for a new subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    /// Reference of the agreement
    pub name: String,
    /// Primary partner
    pub partner_id: i64,
    /// Initial stage
    pub stage_id: i64,
    /// Whether the subscription is a membership
    pub is_membership: bool,
    /// Individual (non company) membership
    pub individual_member: bool,
    /// Every listed contact is a member
    pub all_members: bool,
    /// Membership type
    pub membership_type_id: Option<i64>,
    /// First day covered
    pub date_start: NaiveDate,
    /// Last day covered
    pub date: Option<NaiveDate>,
    /// Allow-listed contacts. None lists the children of a company partner.
    pub contact_ids: Option<Vec<i64>>,
}

impl NewSubscription {
    /// A membership subscription with no type, no end date and default contacts.
    #[must_use]
    pub fn membership(name: &str, partner_id: i64, stage_id: i64, date_start: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            partner_id,
            stage_id,
            is_membership: true,
            individual_member: false,
            all_members: false,
            membership_type_id: None,
            date_start,
            date: None,
            contact_ids: None,
        }
    }
}

/// Field changes applied by [`update_subscription`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionChanges {
    /// Move to another stage
    pub stage_id: Option<i64>,
    /// Change the `all_members` policy; listed contacts follow the new value
    pub all_members: Option<bool>,
    /// Change whether this is a membership
    pub is_membership: Option<bool>,
    /// Change the individual membership flag
    pub individual_member: Option<bool>,
    /// Change or clear the membership type
    pub membership_type_id: Option<Option<i64>>,
    /// Change the start date
    pub date_start: Option<NaiveDate>,
    /// Change or clear the end date
    pub date: Option<Option<NaiveDate>>,
    /// Archive or restore
    pub active: Option<bool>,
    /// Contacts to add to the allow-list
    pub add_contact_ids: Vec<i64>,
    /// Contacts to remove from the allow-list
    pub remove_contact_ids: Vec<i64>,
}

/// Finds a subscription by id.
pub async fn get_subscription_by_id<C>(
    db: &C,
    subscription_id: i64,
) -> Result<Option<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find_by_id(subscription_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a subscription by id, failing when it does not exist.
pub async fn require_subscription<C>(db: &C, subscription_id: i64) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    get_subscription_by_id(db, subscription_id)
        .await?
        .ok_or_else(|| Error::SubscriptionNotFound {
            name: subscription_id.to_string(),
        })
}

/// Finds a subscription by its reference.
pub async fn get_subscription_by_name<C>(
    db: &C,
    name: &str,
) -> Result<Option<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(subscription::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Subscriptions of a partner and of all its descendants, newest first.
pub async fn get_subscriptions_for_partner_tree<C>(
    db: &C,
    partner_id: i64,
) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    let mut partner_ids = partner::descendant_ids(db, partner_id).await?;
    partner_ids.push(partner_id);

    Subscription::find()
        .filter(subscription::Column::PartnerId.is_in(partner_ids))
        .order_by_desc(subscription::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of the contacts allow-listed on a subscription.
pub async fn contact_ids<C>(db: &C, subscription_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Ok(SubscriptionContact::find()
        .filter(subscription_contact::Column::SubscriptionId.eq(subscription_id))
        .order_by_asc(subscription_contact::Column::PartnerId)
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.partner_id)
        .collect())
}

/// Contacts allow-listed on a subscription.
pub async fn contacts<C>(db: &C, subscription_id: i64) -> Result<Vec<partner_entity::Model>>
where
    C: ConnectionTrait,
{
    let ids = contact_ids(db, subscription_id).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Partner::find()
        .filter(partner_entity::Column::Id.is_in(ids))
        .order_by_asc(partner_entity::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists a contact on a subscription. Listing an already listed contact is a no-op.
pub async fn add_contact<C>(db: &C, subscription_id: i64, partner_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = SubscriptionContact::find_by_id((subscription_id, partner_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    partner::require_partner(db, partner_id).await?;
    subscription_contact::ActiveModel {
        subscription_id: Set(subscription_id),
        partner_id: Set(partner_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Removes a contact from a subscription allow-list.
pub async fn remove_contact<C>(db: &C, subscription_id: i64, partner_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    SubscriptionContact::delete_by_id((subscription_id, partner_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn to_records<C>(
    db: &C,
    rows: Vec<(subscription::Model, Option<subscription_stage::Model>)>,
    with_contacts: bool,
) -> Result<Vec<SubscriptionRecord>>
where
    C: ConnectionTrait,
{
    let mut records = Vec::with_capacity(rows.len());
    for (subscription, stage) in rows {
        let membership_type =
            membership_type::membership_type_name(db, subscription.membership_type_id).await?;
        let contacts = if with_contacts {
            contacts(db, subscription.id).await?
        } else {
            Vec::new()
        };
        records.push(SubscriptionRecord {
            category: stage.map(|s| s.category),
            membership_type,
            contacts,
            subscription,
        });
    }
    Ok(records)
}

/// Loads one subscription with its stage, type and contacts.
pub async fn load_record<C>(db: &C, subscription_id: i64) -> Result<SubscriptionRecord>
where
    C: ConnectionTrait,
{
    let row = Subscription::find_by_id(subscription_id)
        .find_also_related(SubscriptionStage)
        .one(db)
        .await?
        .ok_or_else(|| Error::SubscriptionNotFound {
            name: subscription_id.to_string(),
        })?;

    let mut records = to_records(db, vec![row], true).await?;
    records.pop().ok_or_else(|| Error::SubscriptionNotFound {
        name: subscription_id.to_string(),
    })
}

/// Active subscriptions where the partner is the primary partner, oldest first.
///
/// Contacts are not loaded.
pub async fn partner_history<C>(db: &C, partner_id: i64) -> Result<Vec<SubscriptionRecord>>
where
    C: ConnectionTrait,
{
    let rows = Subscription::find()
        .filter(subscription::Column::PartnerId.eq(partner_id))
        .filter(subscription::Column::Active.eq(true))
        .find_also_related(SubscriptionStage)
        .order_by_asc(subscription::Column::Id)
        .all(db)
        .await?;
    to_records(db, rows, false).await
}

/// The partner's most recently validated valid membership subscription, with contacts.
pub async fn latest_valid_subscription<C>(
    db: &C,
    partner_id: i64,
) -> Result<Option<SubscriptionRecord>>
where
    C: ConnectionTrait,
{
    let history = partner_history(db, partner_id).await?;
    match latest_validated(&history) {
        Some(latest) => load_record(db, latest.subscription.id).await.map(Some),
        None => Ok(None),
    }
}

/// Membership values of a partner derived from its own subscriptions.
pub async fn membership_info_for<C>(db: &C, partner_id: i64) -> Result<MembershipInfo>
where
    C: ConnectionTrait,
{
    let history = partner_history(db, partner_id).await?;
    Ok(derive_membership_info(&history))
}

/// Flags and unflags the partners of the given subscriptions.
///
/// Partners are collected in the order of `subscription_ids`; every member flag
/// is written before any non-member flag.
pub async fn update_subscription_member<C>(db: &C, subscription_ids: &[i64]) -> Result<MemberPlan>
where
    C: ConnectionTrait,
{
    let mut records = Vec::with_capacity(subscription_ids.len());
    for &id in subscription_ids {
        records.push(load_record(db, id).await?);
    }

    let plan = plan_member_updates(&records);
    debug!(
        "Membership plan: {} member(s), {} non-member(s)",
        plan.become_member.len(),
        plan.become_non_member.len()
    );

    for (partner_id, is_member) in plan.writes() {
        partner::set_member_flag(db, partner_id, is_member).await?;
    }
    Ok(plan)
}

/// Recomputes the membership dates and type of each subscription's partner and
/// copies them onto its member contacts. Contacts that are not members are cleared.
pub async fn update_membership_contacts_info<C>(db: &C, subscription_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    for &id in subscription_ids {
        let subscription = require_subscription(db, id).await?;
        let info = membership_info_for(db, subscription.partner_id).await?;

        let primary = partner::require_partner(db, subscription.partner_id).await?;
        // A partner without valid subscriptions of its own may still be covered as
        // someone else's contact; only clear it once it is no longer a member.
        if !info.is_empty() || !primary.is_member {
            partner::write_membership_info(db, primary.id, &info).await?;
        }

        for contact in contacts(db, id).await? {
            if contact.is_member {
                partner::write_membership_info(db, contact.id, &info).await?;
            } else {
                partner::write_membership_info(db, contact.id, &MembershipInfo::default())
                    .await?;
            }
        }
    }
    Ok(())
}

async fn propagate<C>(db: &C, subscription_ids: &[i64]) -> Result<MemberPlan>
where
    C: ConnectionTrait,
{
    let plan = update_subscription_member(db, subscription_ids).await?;
    update_membership_contacts_info(db, subscription_ids).await?;
    Ok(plan)
}

/// Creates a subscription and applies the membership rules to its partners.
///
/// When no contacts are given and the partner is a company, its children are listed.
pub async fn create_subscription(
    db: &DatabaseConnection,
    new: NewSubscription,
) -> Result<subscription::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Subscription name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    let owner = partner::require_partner(&txn, new.partner_id).await?;
    let initial_stage = stage::require_stage(&txn, new.stage_id).await?;

    let now = Utc::now();
    let validated_at = (initial_stage.category == StageCategory::Progress).then_some(now);

    let created = subscription::ActiveModel {
        name: Set(new.name.trim().to_string()),
        partner_id: Set(owner.id),
        stage_id: Set(initial_stage.id),
        is_membership: Set(new.is_membership),
        individual_member: Set(new.individual_member),
        all_members: Set(new.all_members),
        membership_type_id: Set(new.membership_type_id),
        date_start: Set(new.date_start),
        date: Set(new.date),
        active: Set(true),
        validated_at: Set(validated_at),
        created_at: Set(now.naive_utc()),
        updated_at: Set(now.naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let listed = match new.contact_ids {
        Some(ids) => ids,
        None if owner.is_company => partner::child_ids(&txn, owner.id).await?,
        None => Vec::new(),
    };
    for contact_id in listed {
        add_contact(&txn, created.id, contact_id).await?;
    }

    propagate(&txn, &[created.id]).await?;
    let created = require_subscription(&txn, created.id).await?;
    txn.commit().await?;

    info!(
        "Created subscription '{}' for partner {} in stage '{}'",
        created.name, owner.name, initial_stage.name
    );
    Ok(created)
}

/// Applies changes to a subscription and re-runs the membership rules.
pub async fn update_subscription(
    db: &DatabaseConnection,
    subscription_id: i64,
    changes: SubscriptionChanges,
) -> Result<subscription::Model> {
    let txn = db.begin().await?;

    let existing = require_subscription(&txn, subscription_id).await?;
    let previous_category = match stage::require_stage(&txn, existing.stage_id).await {
        Ok(previous) => Some(previous.category),
        Err(Error::StageNotFound { .. }) => None,
        Err(e) => return Err(e),
    };
    let all_members_toggled = changes
        .all_members
        .filter(|&flag| flag != existing.all_members);

    let now = Utc::now();
    let mut model: subscription::ActiveModel = existing.into();

    if let Some(stage_id) = changes.stage_id {
        let next = stage::require_stage(&txn, stage_id).await?;
        if next.category == StageCategory::Progress
            && previous_category != Some(StageCategory::Progress)
        {
            model.validated_at = Set(Some(now));
        }
        model.stage_id = Set(next.id);
    }
    if let Some(all_members) = changes.all_members {
        model.all_members = Set(all_members);
    }
    if let Some(is_membership) = changes.is_membership {
        model.is_membership = Set(is_membership);
    }
    if let Some(individual_member) = changes.individual_member {
        model.individual_member = Set(individual_member);
    }
    if let Some(membership_type_id) = changes.membership_type_id {
        model.membership_type_id = Set(membership_type_id);
    }
    if let Some(date_start) = changes.date_start {
        model.date_start = Set(date_start);
    }
    if let Some(date) = changes.date {
        model.date = Set(date);
    }
    if let Some(active) = changes.active {
        model.active = Set(active);
    }
    model.updated_at = Set(now.naive_utc());
    model.update(&txn).await?;

    for contact_id in changes.remove_contact_ids {
        remove_contact(&txn, subscription_id, contact_id).await?;
    }
    for contact_id in changes.add_contact_ids {
        add_contact(&txn, subscription_id, contact_id).await?;
    }

    if let Some(all_members) = all_members_toggled {
        for contact_id in contact_ids(&txn, subscription_id).await? {
            partner::set_member_flag(&txn, contact_id, all_members).await?;
        }
    }

    propagate(&txn, &[subscription_id]).await?;
    let updated = require_subscription(&txn, subscription_id).await?;
    txn.commit().await?;

    debug!("Updated subscription '{}'", updated.name);
    Ok(updated)
}

/// Moves a subscription to another stage.
pub async fn set_subscription_stage(
    db: &DatabaseConnection,
    subscription_id: i64,
    stage_id: i64,
) -> Result<subscription::Model> {
    update_subscription(
        db,
        subscription_id,
        SubscriptionChanges {
            stage_id: Some(stage_id),
            ..Default::default()
        },
    )
    .await
}

/// Re-runs both membership rules over every active subscription, oldest first.
///
/// A partner keeps its member flag while any of its subscriptions is valid.
pub async fn refresh_all_members(db: &DatabaseConnection) -> Result<MemberPlan> {
    let txn = db.begin().await?;

    let ids: Vec<i64> = Subscription::find()
        .filter(subscription::Column::Active.eq(true))
        .order_by_asc(subscription::Column::Id)
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    let mut records = Vec::with_capacity(ids.len());
    for &id in &ids {
        records.push(load_record(&txn, id).await?);
    }
    let plan = plan_member_refresh(&records);
    for (partner_id, is_member) in plan.writes() {
        partner::set_member_flag(&txn, partner_id, is_member).await?;
    }
    update_membership_contacts_info(&txn, &ids).await?;
    txn.commit().await?;

    info!("Refreshed membership of {} subscription(s)", ids.len());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_check_valid_membership_follows_stage() -> Result<()> {
        let env = setup_membership_env().await?;

        let record = load_record(&env.db, env.subscription.id).await?;
        assert!(!record.is_valid_membership());

        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;
        assert!(load_record(&env.db, env.subscription.id).await?.is_valid_membership());

        update_subscription(
            &env.db,
            env.subscription.id,
            SubscriptionChanges {
                is_membership: Some(false),
                ..Default::default()
            },
        )
        .await?;
        assert!(!load_record(&env.db, env.subscription.id).await?.is_valid_membership());
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_flags_partner_and_all_contacts() -> Result<()> {
        let env = setup_membership_env().await?;
        assert!(!reload_partner(&env.db, env.company.id).await?.is_member);

        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;

        assert!(reload_partner(&env.db, env.company.id).await?.is_member);
        for contact in &env.contacts {
            assert!(reload_partner(&env.db, contact.id).await?.is_member);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_allow_list_only_keeps_flagged_contacts() -> Result<()> {
        let env = setup_membership_env().await?;
        update_subscription(
            &env.db,
            env.subscription.id,
            SubscriptionChanges {
                all_members: Some(false),
                ..Default::default()
            },
        )
        .await?;
        partner::set_member_flag(&env.db, env.contacts[0].id, true).await?;

        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;

        assert!(reload_partner(&env.db, env.company.id).await?.is_member);
        assert!(reload_partner(&env.db, env.contacts[0].id).await?.is_member);
        assert!(!reload_partner(&env.db, env.contacts[1].id).await?.is_member);
        assert!(!reload_partner(&env.db, env.contacts[2].id).await?.is_member);
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_copies_membership_info() -> Result<()> {
        let env = setup_membership_env().await?;
        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;

        let company = reload_partner(&env.db, env.company.id).await?;
        assert_eq!(company.date_first_start, Some(env.subscription.date_start));
        assert_eq!(company.date_last_stop, env.subscription.date);
        assert_eq!(company.membership_type.as_deref(), Some("Complex"));

        for contact in &env.contacts {
            let contact = reload_partner(&env.db, contact.id).await?;
            assert_eq!(contact.date_first_start, company.date_first_start);
            assert_eq!(contact.date_last_stop, company.date_last_stop);
            assert_eq!(contact.membership_type, company.membership_type);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_closing_subscription_unflags_and_clears() -> Result<()> {
        let env = setup_membership_env().await?;
        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;
        set_subscription_stage(&env.db, env.subscription.id, env.stages.closed.id).await?;

        let company = reload_partner(&env.db, env.company.id).await?;
        assert!(!company.is_member);
        assert!(company.date_first_start.is_none());
        assert!(company.membership_type.is_none());
        for contact in &env.contacts {
            let contact = reload_partner(&env.db, contact.id).await?;
            assert!(!contact.is_member);
            assert!(contact.date_last_stop.is_none());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_propagation_is_idempotent() -> Result<()> {
        let env = setup_membership_env().await?;
        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;

        let snapshot = |partners: Vec<partner_entity::Model>| {
            partners
                .into_iter()
                .map(|p| (p.id, p.is_member))
                .collect::<Vec<_>>()
        };

        update_subscription_member(&env.db, &[env.subscription.id]).await?;
        let once = snapshot(Partner::find().all(&env.db).await?);
        update_subscription_member(&env.db, &[env.subscription.id]).await?;
        let twice = snapshot(Partner::find().all(&env.db).await?);

        assert_eq!(once, twice);
        Ok(())
    }

    #[tokio::test]
    async fn test_toggling_all_members_sets_contact_flags() -> Result<()> {
        let env = setup_membership_env().await?;
        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;

        update_subscription(
            &env.db,
            env.subscription.id,
            SubscriptionChanges {
                all_members: Some(false),
                ..Default::default()
            },
        )
        .await?;

        assert!(reload_partner(&env.db, env.company.id).await?.is_member);
        for contact in &env.contacts {
            let contact = reload_partner(&env.db, contact.id).await?;
            assert!(!contact.is_member);
            assert!(contact.membership_type.is_none());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_create_in_draft_stage_marks_non_members() -> Result<()> {
        let env = setup_membership_env().await?;
        partner::set_member_flag(&env.db, env.company.id, true).await?;

        let other = create_subscription(
            &env.db,
            NewSubscription::membership(
                "SUB-DRAFT",
                env.company.id,
                env.stages.draft.id,
                env.subscription.date_start,
            ),
        )
        .await?;

        // Children of a company are listed by default.
        assert_eq!(contact_ids(&env.db, other.id).await?.len(), env.contacts.len());
        assert!(other.validated_at.is_none());
        assert!(!reload_partner(&env.db, env.company.id).await?.is_member);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_in_progress_stage_validates_immediately() -> Result<()> {
        let env = setup_membership_env().await?;
        let mut new = NewSubscription::membership(
            "SUB-LIVE",
            env.company.id,
            env.stages.progress.id,
            env.subscription.date_start,
        );
        new.contact_ids = Some(Vec::new());

        let created = create_subscription(&env.db, new).await?;
        assert!(created.validated_at.is_some());
        assert!(reload_partner(&env.db, env.company.id).await?.is_member);
        Ok(())
    }

    #[tokio::test]
    async fn test_partner_tree_lists_descendant_subscriptions() -> Result<()> {
        let env = setup_membership_env().await?;
        let mut own = NewSubscription::membership(
            "SUB-PERSONAL",
            env.contacts[0].id,
            env.stages.draft.id,
            env.subscription.date_start,
        );
        own.individual_member = true;
        let personal = create_subscription(&env.db, own).await?;

        let tree = get_subscriptions_for_partner_tree(&env.db, env.company.id).await?;
        let ids: Vec<i64> = tree.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![personal.id, env.subscription.id]);

        let only_contact = get_subscriptions_for_partner_tree(&env.db, env.contacts[0].id).await?;
        assert_eq!(only_contact.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_all_members_restores_flags() -> Result<()> {
        let env = setup_membership_env().await?;
        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;
        partner::set_member_flag(&env.db, env.company.id, false).await?;

        let plan = refresh_all_members(&env.db).await?;
        assert!(plan.become_member.contains(&env.company.id));
        assert!(reload_partner(&env.db, env.company.id).await?.is_member);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_keeps_renewed_members() -> Result<()> {
        let env = setup_membership_env().await?;
        set_subscription_stage(&env.db, env.subscription.id, env.stages.progress.id).await?;
        set_subscription_stage(&env.db, env.subscription.id, env.stages.closed.id).await?;

        let renewal_start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let mut renewal = NewSubscription::membership(
            "SUB-0002",
            env.company.id,
            env.stages.progress.id,
            renewal_start,
        );
        renewal.all_members = true;
        renewal.date = NaiveDate::from_ymd_opt(2022, 12, 31);
        create_subscription(&env.db, renewal).await?;
        assert!(reload_partner(&env.db, env.company.id).await?.is_member);

        refresh_all_members(&env.db).await?;

        let company = reload_partner(&env.db, env.company.id).await?;
        assert!(company.is_member);
        assert_eq!(company.date_first_start, Some(renewal_start));
        assert_eq!(company.date_last_stop, NaiveDate::from_ymd_opt(2022, 12, 31));
        for contact in &env.contacts {
            let contact = reload_partner(&env.db, contact.id).await?;
            assert!(contact.is_member);
            assert_eq!(contact.date_first_start, Some(renewal_start));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_lookup_failure_is_reported() {
        let now = Utc::now().naive_utc();
        let existing = subscription::Model {
            id: 1,
            name: "SUB-0001".to_string(),
            partner_id: 1,
            stage_id: 1,
            is_membership: true,
            individual_member: false,
            all_members: false,
            membership_type_id: None,
            date_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            date: None,
            active: true,
            validated_at: None,
            created_at: now,
            updated_at: now,
        };
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Sqlite)
            .append_query_results([vec![existing]])
            .append_query_errors([DbErr::Custom("stage table unavailable".to_string())])
            .into_connection();

        let result = set_subscription_stage(&db, 1, 2).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_unknown_subscription() -> Result<()> {
        let db = setup_test_db().await?;
        let result = set_subscription_stage(&db, 404, 1).await;
        assert!(matches!(result, Err(Error::SubscriptionNotFound { .. })));
        Ok(())
    }
}
