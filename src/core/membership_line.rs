//! Membership line business logic - Invoiced membership periods.
//!
//! A line moves `draft → to_invoice → invoiced → paid` as its invoices are
//! drafted, posted and paid, and can be canceled until it is paid. The state
//! is recomputed from the linked invoices by [`compute_state`].

use crate::{
    core::{
        invoice::{self, InvoiceAction, InvoiceRequest},
        partner, product,
    },
    entities::{
        Invoice, MembershipLine, MembershipLineContact, Partner, invoice as invoice_entity,
        invoice::{InvoiceState, PaymentState},
        membership_line::{self, LineState},
        membership_line_contact, partner as partner_entity,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Values for a new membership line.
#[derive(Debug, Clone)]
pub struct NewMembershipLine {
    /// Optional designation
    pub name: Option<String>,
    /// Member company or contact
    pub partner_id: i64,
    /// Membership product
    pub product_id: i64,
    /// First day, defaults to 1 January of the current year
    pub date_from: Option<NaiveDate>,
    /// Last day, defaults to 31 December of the current year
    pub date_to: Option<NaiveDate>,
    /// Every listed contact is a member
    pub all_members: bool,
    /// Listed contacts
    pub contact_ids: Vec<i64>,
}

impl NewMembershipLine {
    /// A line for the current calendar year without contacts.
    #[must_use]
    pub const fn for_partner(partner_id: i64, product_id: i64) -> Self {
        Self {
            name: None,
            partner_id,
            product_id,
            date_from: None,
            date_to: None,
            all_members: false,
            contact_ids: Vec::new(),
        }
    }
}

/// Default membership period: the calendar year containing `today`.
#[must_use]
pub fn default_period(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let year = today.year();
    let first = today.with_ordinal(1).unwrap_or(today);
    let last = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today);
    (first, last)
}

/// Derives the line state from its invoices, ignoring canceled ones.
///
/// A posted invoice that is paid or in payment wins over a posted unpaid one,
/// which wins over a draft. Returns None when no invoice decides, in which
/// case the stored state is kept.
#[must_use]
pub fn compute_state(invoices: &[invoice_entity::Model]) -> Option<LineState> {
    let live = || invoices.iter().filter(|i| i.state != InvoiceState::Cancel);

    if live().any(|i| {
        i.state == InvoiceState::Posted
            && matches!(i.payment_state, PaymentState::Paid | PaymentState::InPayment)
    }) {
        Some(LineState::Paid)
    } else if live().any(|i| i.state == InvoiceState::Posted) {
        Some(LineState::Invoiced)
    } else if live().any(|i| i.state == InvoiceState::Draft) {
        Some(LineState::ToInvoice)
    } else {
        None
    }
}

/// A line grants membership while invoiced or paid and `today` is inside its period.
#[must_use]
pub fn is_valid_membership(line: &membership_line::Model, today: NaiveDate) -> bool {
    matches!(line.state, LineState::Invoiced | LineState::Paid)
        && line.date_from <= today
        && today <= line.date_to
}

/// Finds a membership line by id.
pub async fn get_membership_line_by_id<C>(
    db: &C,
    line_id: i64,
) -> Result<Option<membership_line::Model>>
where
    C: ConnectionTrait,
{
    MembershipLine::find_by_id(line_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a membership line by id, failing when it does not exist.
pub async fn require_membership_line<C>(db: &C, line_id: i64) -> Result<membership_line::Model>
where
    C: ConnectionTrait,
{
    get_membership_line_by_id(db, line_id)
        .await?
        .ok_or(Error::MembershipLineNotFound { id: line_id })
}

/// Membership lines of a partner, most recent period first.
pub async fn get_lines_for_partner<C>(
    db: &C,
    partner_id: i64,
) -> Result<Vec<membership_line::Model>>
where
    C: ConnectionTrait,
{
    MembershipLine::find()
        .filter(membership_line::Column::PartnerId.eq(partner_id))
        .order_by_desc(membership_line::Column::DateFrom)
        .order_by_desc(membership_line::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Contacts listed on a membership line.
pub async fn line_contacts<C>(db: &C, line_id: i64) -> Result<Vec<partner_entity::Model>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i64> = MembershipLineContact::find()
        .filter(membership_line_contact::Column::MembershipLineId.eq(line_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.partner_id)
        .collect();
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

/// Partners the invoicing wizard may bill for a line: the line's partner, plus
/// its listed contacts when the line covers all members.
pub async fn eligible_partners<C>(db: &C, line_id: i64) -> Result<Vec<partner_entity::Model>>
where
    C: ConnectionTrait,
{
    let line = require_membership_line(db, line_id).await?;
    let mut partners = vec![partner::require_partner(db, line.partner_id).await?];
    if line.all_members {
        partners.extend(line_contacts(db, line_id).await?);
    }
    Ok(partners)
}

/// Creates a draft membership line. The fee is copied from the product list price.
pub async fn create_membership_line(
    db: &DatabaseConnection,
    new: NewMembershipLine,
) -> Result<membership_line::Model> {
    let today = Utc::now().date_naive();
    let (default_from, default_to) = default_period(today);
    let date_from = new.date_from.unwrap_or(default_from);
    let date_to = new.date_to.unwrap_or(default_to);
    if date_to < date_from {
        return Err(Error::Config {
            message: format!("Membership period ends ({date_to}) before it starts ({date_from})"),
        });
    }

    let txn = db.begin().await?;

    let member = partner::require_partner(&txn, new.partner_id).await?;
    let fee_product = product::get_product_by_id(&txn, new.product_id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::ProductNotFound {
            name: new.product_id.to_string(),
        })?;

    let created = membership_line::ActiveModel {
        name: Set(new.name),
        partner_id: Set(member.id),
        product_id: Set(fee_product.id),
        state: Set(LineState::Draft),
        date_from: Set(date_from),
        date_to: Set(date_to),
        date_cancel: Set(None),
        member_price: Set(fee_product.list_price),
        all_members: Set(new.all_members),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut contact_ids = new.contact_ids;
    contact_ids.sort_unstable();
    contact_ids.dedup();
    for contact_id in contact_ids {
        partner::require_partner(&txn, contact_id).await?;
        membership_line_contact::ActiveModel {
            membership_line_id: Set(created.id),
            partner_id: Set(contact_id),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(
        "Created membership line {} for {} ({} → {})",
        created.id, member.name, created.date_from, created.date_to
    );
    Ok(created)
}

async fn write_state<C>(
    db: &C,
    line: membership_line::Model,
    state: LineState,
    date_cancel: Option<NaiveDate>,
) -> Result<membership_line::Model>
where
    C: ConnectionTrait,
{
    debug!("Membership line {}: {} -> {state}", line.id, line.state);
    let mut model: membership_line::ActiveModel = line.into();
    model.state = Set(state);
    if date_cancel.is_some() {
        model.date_cancel = Set(date_cancel);
    }
    model.update(db).await.map_err(Into::into)
}

/// Marks a line invoiced, as the invoicing wizard does.
pub async fn mark_invoiced<C>(db: &C, line_id: i64) -> Result<membership_line::Model>
where
    C: ConnectionTrait,
{
    let line = require_membership_line(db, line_id).await?;
    if line.state == LineState::Invoiced {
        return Ok(line);
    }
    write_state(db, line, LineState::Invoiced, None).await
}

/// Recomputes and stores the state of a line from its invoices.
///
/// Canceled lines keep their state until they are reopened with [`action_post`].
pub async fn refresh_state<C>(db: &C, line_id: i64) -> Result<membership_line::Model>
where
    C: ConnectionTrait,
{
    let line = require_membership_line(db, line_id).await?;
    if line.state == LineState::Canceled {
        return Ok(line);
    }

    let invoices = Invoice::find()
        .filter(invoice_entity::Column::MembershipLineId.eq(line_id))
        .order_by_asc(invoice_entity::Column::Id)
        .all(db)
        .await?;

    match compute_state(&invoices) {
        Some(state) if state != line.state => write_state(db, line, state, None).await,
        _ => Ok(line),
    }
}

/// Cancels a line, recording `today` as the cancel date.
///
/// Paid and already canceled lines are returned unchanged.
pub async fn button_cancel(
    db: &DatabaseConnection,
    line_id: i64,
    today: NaiveDate,
) -> Result<membership_line::Model> {
    let line = require_membership_line(db, line_id).await?;
    if matches!(line.state, LineState::Paid | LineState::Canceled) {
        return Ok(line);
    }
    info!("Canceling membership line {line_id}");
    write_state(db, line, LineState::Canceled, Some(today)).await
}

/// Confirms a draft line (`to_invoice`) or reopens a canceled one (`draft`).
pub async fn action_post(db: &DatabaseConnection, line_id: i64) -> Result<membership_line::Model> {
    let line = require_membership_line(db, line_id).await?;
    match line.state {
        LineState::Draft => write_state(db, line, LineState::ToInvoice, None).await,
        LineState::Canceled => write_state(db, line, LineState::Draft, None).await,
        _ => Ok(line),
    }
}

/// Invoices the line's own partner for its product at the line's fee.
pub async fn action_create_invoice(db: &DatabaseConnection, line_id: i64) -> Result<InvoiceAction> {
    let line = require_membership_line(db, line_id).await?;
    invoice::create_membership_invoice(
        db,
        InvoiceRequest {
            partner_id: line.partner_id,
            product_id: line.product_id,
            unit_price: line.member_price,
            membership_line_id: Some(line.id),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_invoice(id: i64, state: InvoiceState, payment_state: PaymentState) -> invoice_entity::Model {
        invoice_entity::Model {
            id,
            partner_id: 1,
            invoice_address_id: 1,
            membership_line_id: Some(1),
            state,
            payment_state,
            amount_total: 100.0,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn line(state: LineState) -> membership_line::Model {
        membership_line::Model {
            id: 1,
            name: None,
            partner_id: 1,
            product_id: 1,
            state,
            date_from: date(2021, 1, 1),
            date_to: date(2021, 12, 31),
            date_cancel: None,
            member_price: 100.0,
            all_members: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_compute_state_single_invoice() {
        let paid = [sample_invoice(1, InvoiceState::Posted, PaymentState::Paid)];
        assert_eq!(compute_state(&paid), Some(LineState::Paid));

        let in_payment = [sample_invoice(1, InvoiceState::Posted, PaymentState::InPayment)];
        assert_eq!(compute_state(&in_payment), Some(LineState::Paid));

        let posted = [sample_invoice(1, InvoiceState::Posted, PaymentState::NotPaid)];
        assert_eq!(compute_state(&posted), Some(LineState::Invoiced));

        let draft = [sample_invoice(1, InvoiceState::Draft, PaymentState::NotPaid)];
        assert_eq!(compute_state(&draft), Some(LineState::ToInvoice));
    }

    #[test]
    fn test_compute_state_priorities_and_cancel() {
        let mixed = [
            sample_invoice(1, InvoiceState::Draft, PaymentState::NotPaid),
            sample_invoice(2, InvoiceState::Posted, PaymentState::Paid),
            sample_invoice(3, InvoiceState::Posted, PaymentState::NotPaid),
        ];
        assert_eq!(compute_state(&mixed), Some(LineState::Paid));

        let posted_and_draft = [
            sample_invoice(1, InvoiceState::Posted, PaymentState::NotPaid),
            sample_invoice(2, InvoiceState::Draft, PaymentState::NotPaid),
        ];
        assert_eq!(compute_state(&posted_and_draft), Some(LineState::Invoiced));

        let only_canceled = [sample_invoice(1, InvoiceState::Cancel, PaymentState::Paid)];
        assert_eq!(compute_state(&only_canceled), None);
        assert_eq!(compute_state(&[]), None);
    }

    #[test]
    fn test_is_valid_membership_window() {
        let inside = date(2021, 1, 1);
        assert!(is_valid_membership(&line(LineState::Paid), inside));
        assert!(is_valid_membership(&line(LineState::Invoiced), date(2021, 12, 31)));
        assert!(!is_valid_membership(&line(LineState::Paid), date(2022, 1, 1)));
        assert!(!is_valid_membership(&line(LineState::Paid), date(2020, 12, 31)));
        assert!(!is_valid_membership(&line(LineState::ToInvoice), inside));
        assert!(!is_valid_membership(&line(LineState::Canceled), inside));
    }

    #[test]
    fn test_default_period_is_calendar_year() {
        let (from, to) = default_period(date(2024, 6, 15));
        assert_eq!(from, date(2024, 1, 1));
        assert_eq!(to, date(2024, 12, 31));
    }

    #[tokio::test]
    async fn test_create_line_copies_product_price() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let line = create_membership_line(&db, NewMembershipLine::for_partner(company.id, fee.id)).await?;

        assert_eq!(line.state, LineState::Draft);
        assert_eq!(line.member_price, fee.list_price);
        let (from, to) = default_period(Utc::now().date_naive());
        assert_eq!((line.date_from, line.date_to), (from, to));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_line_rejects_inverted_period() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let mut new = NewMembershipLine::for_partner(company.id, fee.id);
        new.date_from = Some(date(2024, 6, 1));
        new.date_to = Some(date(2024, 1, 1));

        let result = create_membership_line(&db, new).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_post_and_cancel_transitions() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let line = create_membership_line(&db, NewMembershipLine::for_partner(company.id, fee.id)).await?;
        let today = date(2024, 3, 1);

        let line = action_post(&db, line.id).await?;
        assert_eq!(line.state, LineState::ToInvoice);
        // Posting again is a no-op
        assert_eq!(action_post(&db, line.id).await?.state, LineState::ToInvoice);

        let line = button_cancel(&db, line.id, today).await?;
        assert_eq!(line.state, LineState::Canceled);
        assert_eq!(line.date_cancel, Some(today));

        let line = action_post(&db, line.id).await?;
        assert_eq!(line.state, LineState::Draft);
        Ok(())
    }

    #[tokio::test]
    async fn test_paid_line_cannot_be_canceled() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let line = create_membership_line(&db, NewMembershipLine::for_partner(company.id, fee.id)).await?;
        let action = action_create_invoice(&db, line.id).await?;
        let created = &action.invoices[0];
        invoice::post_invoice(&db, created.id).await?;
        invoice::register_payment(&db, created.id, PaymentState::Paid).await?;

        let line = button_cancel(&db, line.id, date(2024, 3, 1)).await?;
        assert_eq!(line.state, LineState::Paid);
        assert!(line.date_cancel.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_eligible_partners_follow_all_members() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let staff = create_test_contact(&db, "Staff", company.id).await?;

        let mut listed = NewMembershipLine::for_partner(company.id, fee.id);
        listed.contact_ids = vec![staff.id];
        let restricted = create_membership_line(&db, listed.clone()).await?;
        listed.all_members = true;
        let everyone = create_membership_line(&db, listed).await?;

        let ids = |partners: Vec<partner_entity::Model>| partners.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(eligible_partners(&db, restricted.id).await?), vec![company.id]);
        assert_eq!(
            ids(eligible_partners(&db, everyone.id).await?),
            vec![company.id, staff.id]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_line() -> Result<()> {
        let db = setup_test_db().await?;
        let result = action_post(&db, 12).await;
        assert!(matches!(result, Err(Error::MembershipLineNotFound { id: 12 })));
        Ok(())
    }
}
