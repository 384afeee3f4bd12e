//! Membership status derivation.
//!
//! Pure functions over loaded subscription history. Nothing here touches the
//! database: `core::subscription` and `core::partner` load the records, call
//! these rules and write the results back.

use crate::entities::{partner, subscription, subscription_stage::StageCategory};
use chrono::NaiveDate;

/// A subscription together with the related values the rules need.
#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    /// The subscription row
    pub subscription: subscription::Model,
    /// Category of its stage, None if the stage no longer exists
    pub category: Option<StageCategory>,
    /// Name of its membership type
    pub membership_type: Option<String>,
    /// Allow-listed contacts, empty when not loaded
    pub contacts: Vec<partner::Model>,
}

impl SubscriptionRecord {
    /// See [`check_valid_membership`].
    #[must_use]
    pub fn is_valid_membership(&self) -> bool {
        check_valid_membership(self.subscription.is_membership, self.category)
    }
}

/// A membership subscription is valid while its stage is in the `progress` category.
#[must_use]
pub fn check_valid_membership(is_membership: bool, category: Option<StageCategory>) -> bool {
    is_membership && category == Some(StageCategory::Progress)
}

/// Membership values stored on partners and copied to member contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipInfo {
    /// Start of the earliest valid subscription
    pub date_first_start: Option<NaiveDate>,
    /// End of the latest valid subscription
    pub date_last_stop: Option<NaiveDate>,
    /// Type of the most recently validated subscription
    pub membership_type: Option<String>,
}

impl MembershipInfo {
    /// True when no valid subscription contributed any value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date_first_start.is_none()
            && self.date_last_stop.is_none()
            && self.membership_type.is_none()
    }

    /// Reads the stored values of a partner.
    #[must_use]
    pub fn of_partner(partner: &partner::Model) -> Self {
        Self {
            date_first_start: partner.date_first_start,
            date_last_stop: partner.date_last_stop,
            membership_type: partner.membership_type.clone(),
        }
    }
}

fn valid(records: &[SubscriptionRecord]) -> impl Iterator<Item = &SubscriptionRecord> {
    records.iter().filter(|r| r.is_valid_membership())
}

/// Earliest `date_start` among the valid subscriptions.
#[must_use]
pub fn first_start(records: &[SubscriptionRecord]) -> Option<NaiveDate> {
    valid(records).map(|r| r.subscription.date_start).min()
}

/// Latest end date among the valid subscriptions. Open-ended ones are skipped.
#[must_use]
pub fn last_stop(records: &[SubscriptionRecord]) -> Option<NaiveDate> {
    valid(records).filter_map(|r| r.subscription.date).max()
}

/// The valid subscription validated last, ties broken by the highest id.
#[must_use]
pub fn latest_validated(records: &[SubscriptionRecord]) -> Option<&SubscriptionRecord> {
    valid(records).max_by_key(|r| (r.subscription.validated_at, r.subscription.id))
}

/// Derives the membership values of a partner from its own subscriptions.
#[must_use]
pub fn derive_membership_info(records: &[SubscriptionRecord]) -> MembershipInfo {
    MembershipInfo {
        date_first_start: first_start(records),
        date_last_stop: last_stop(records),
        membership_type: latest_validated(records).and_then(|r| r.membership_type.clone()),
    }
}

/// Partners to flag and unflag after a batch of subscriptions changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPlan {
    /// Partners to set `is_member = true`, in processing order
    pub become_member: Vec<i64>,
    /// Partners to set `is_member = false`, in processing order
    pub become_non_member: Vec<i64>,
}

impl MemberPlan {
    /// Writes in the order they are applied: all members first, then all non-members.
    pub fn writes(&self) -> impl Iterator<Item = (i64, bool)> + '_ {
        self.become_member
            .iter()
            .map(|&id| (id, true))
            .chain(self.become_non_member.iter().map(|&id| (id, false)))
    }

    /// Final flag per partner once every write has been applied.
    #[must_use]
    pub fn outcome(&self) -> std::collections::BTreeMap<i64, bool> {
        self.writes().collect()
    }
}

/// Partitions the partners touched by `records` into members and non-members.
///
/// The primary partner follows the validity of its subscription. Listed contacts
/// all follow it when `all_members` is set; otherwise only contacts already
/// flagged `is_member` are listed, so unflagged contacts are never enrolled.
#[must_use]
pub fn plan_member_updates(records: &[SubscriptionRecord]) -> MemberPlan {
    let mut plan = MemberPlan::default();

    for record in records {
        let target = if record.is_valid_membership() {
            &mut plan.become_member
        } else {
            &mut plan.become_non_member
        };

        target.push(record.subscription.partner_id);
        target.extend(
            record
                .contacts
                .iter()
                .filter(|contact| record.subscription.all_members || contact.is_member)
                .map(|contact| contact.id),
        );
    }

    plan
}

/// Plan for a full recompute over a partner's whole subscription history.
///
/// A partner stays a member as soon as one of the records makes it a member,
/// so a closed earlier subscription does not unflag a renewed member.
#[must_use]
pub fn plan_member_refresh(records: &[SubscriptionRecord]) -> MemberPlan {
    let mut plan = plan_member_updates(records);
    let members: std::collections::BTreeSet<i64> = plan.become_member.iter().copied().collect();
    plan.become_non_member.retain(|id| !members.contains(id));
    plan
}

/// What happens to a contact created under a member company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewContactPolicy {
    /// Flag the contact as member and list it on the subscription
    Enroll,
    /// List the contact on the subscription without flagging it
    ListOnly,
}

/// Policy for a new contact given the parent's latest valid subscription.
#[must_use]
pub const fn new_contact_policy(all_members: bool) -> NewContactPolicy {
    if all_members {
        NewContactPolicy::Enroll
    } else {
        NewContactPolicy::ListOnly
    }
}
