//! Invoice business logic - The membership invoicing wizard and invoice state setters.
//!
//! Accounting owns the invoice lifecycle. The setters here only exist so that
//! posting, payment and cancellation can be recorded and the linked membership
//! line state recomputed.

use crate::{
    core::{membership_line, partner, product},
    entities::{
        Invoice, Partner,
        invoice::{self, InvoiceState, PaymentState},
        invoice_line,
        partner::{self as partner_entity, AddressType},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Input of the invoicing wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRequest {
    /// Partner to invoice
    pub partner_id: i64,
    /// Membership product billed
    pub product_id: i64,
    /// Price of the single invoice line
    pub unit_price: f64,
    /// Membership line paid by this invoice
    pub membership_line_id: Option<i64>,
}

/// Kind of view an operator surface may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Table of records
    List,
    /// Single record
    Form,
}

/// Tells the caller which records to show after the wizard ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationDescriptor {
    /// Window title
    pub name: String,
    /// Target record type
    pub res_model: String,
    /// Ids to display
    pub domain_ids: Vec<i64>,
    /// Available views, in preference order
    pub views: Vec<ViewKind>,
}

/// Result of the invoicing wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceAction {
    /// Created invoices
    pub invoices: Vec<invoice::Model>,
    /// Where to go next
    pub navigation: NavigationDescriptor,
}

/// Resolves the partner record whose address goes on the invoice.
///
/// An `invoice` child contact with a postal address wins; otherwise the
/// partner itself is used when it has a postal address.
pub async fn find_invoice_address<C>(
    db: &C,
    invoiced: &partner_entity::Model,
) -> Result<partner_entity::Model>
where
    C: ConnectionTrait,
{
    let invoice_contacts = Partner::find()
        .filter(partner_entity::Column::ParentId.eq(invoiced.id))
        .filter(partner_entity::Column::AddressType.eq(AddressType::Invoice))
        .order_by_asc(partner_entity::Column::Id)
        .all(db)
        .await?;

    if let Some(contact) = invoice_contacts
        .into_iter()
        .find(partner_entity::Model::has_postal_address)
    {
        return Ok(contact);
    }
    if invoiced.has_postal_address() {
        return Ok(invoiced.clone());
    }
    Err(Error::MissingInvoiceAddress {
        partner: invoiced.name.clone(),
    })
}

/// Runs the invoicing wizard: one draft invoice with a single line.
///
/// When the request names a membership line, the invoice is linked to it and
/// the line is marked `invoiced`.
///
/// # Errors
/// - `InvalidAmount` for a negative or non-finite unit price
/// - `IneligiblePartner` when the line's partner list does not include the partner
/// - `MissingInvoiceAddress` when the partner has nowhere to send the invoice
/// - `*NotFound` when a referenced record does not exist
pub async fn create_membership_invoice(
    db: &DatabaseConnection,
    request: InvoiceRequest,
) -> Result<InvoiceAction> {
    if !request.unit_price.is_finite() || request.unit_price < 0.0 {
        return Err(Error::InvalidAmount {
            amount: request.unit_price,
        });
    }

    let txn = db.begin().await?;

    let invoiced = partner::require_partner(&txn, request.partner_id).await?;
    let billed = product::get_product_by_id(&txn, request.product_id)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: request.product_id.to_string(),
        })?;
    if let Some(line_id) = request.membership_line_id {
        let eligible = membership_line::eligible_partners(&txn, line_id).await?;
        if !eligible.iter().any(|p| p.id == invoiced.id) {
            return Err(Error::IneligiblePartner {
                partner: invoiced.name,
                line_id,
            });
        }
    }
    let address = find_invoice_address(&txn, &invoiced).await?;

    let created = invoice::ActiveModel {
        partner_id: Set(invoiced.id),
        invoice_address_id: Set(address.id),
        membership_line_id: Set(request.membership_line_id),
        state: Set(InvoiceState::Draft),
        payment_state: Set(PaymentState::NotPaid),
        amount_total: Set(request.unit_price),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    invoice_line::ActiveModel {
        invoice_id: Set(created.id),
        product_id: Set(billed.id),
        quantity: Set(1.0),
        price_unit: Set(request.unit_price),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(line_id) = request.membership_line_id {
        membership_line::mark_invoiced(&txn, line_id).await?;
    }

    txn.commit().await?;
    info!(
        "Created draft invoice {} for {} ({} x {:.2})",
        created.id, invoiced.name, billed.name, request.unit_price
    );

    let navigation = NavigationDescriptor {
        name: "Customer Invoices".to_string(),
        res_model: "invoice".to_string(),
        domain_ids: vec![created.id],
        views: vec![ViewKind::List, ViewKind::Form],
    };
    Ok(InvoiceAction {
        invoices: vec![created],
        navigation,
    })
}

/// Finds an invoice by id.
pub async fn get_invoice_by_id<C>(db: &C, invoice_id: i64) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find_by_id(invoice_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lines billed on an invoice.
pub async fn invoice_lines<C>(db: &C, invoice_id: i64) -> Result<Vec<invoice_line::Model>>
where
    C: ConnectionTrait,
{
    invoice_line::Entity::find()
        .filter(invoice_line::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(invoice_line::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Invoices linked to a membership line, oldest first.
pub async fn invoices_for_line<C>(db: &C, line_id: i64) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::MembershipLineId.eq(line_id))
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn set_invoice_state(
    db: &DatabaseConnection,
    invoice_id: i64,
    state: Option<InvoiceState>,
    payment_state: Option<PaymentState>,
) -> Result<invoice::Model> {
    let txn = db.begin().await?;

    let current = get_invoice_by_id(&txn, invoice_id)
        .await?
        .ok_or(Error::InvoiceNotFound { id: invoice_id })?;
    let mut model: invoice::ActiveModel = current.into();
    if let Some(state) = state {
        model.state = Set(state);
    }
    if let Some(payment_state) = payment_state {
        model.payment_state = Set(payment_state);
    }
    let updated = model.update(&txn).await?;
    debug!(
        "Invoice {}: state {:?}, payment {:?}",
        updated.id, updated.state, updated.payment_state
    );

    if let Some(line_id) = updated.membership_line_id {
        membership_line::refresh_state(&txn, line_id).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

/// Posts an invoice.
pub async fn post_invoice(db: &DatabaseConnection, invoice_id: i64) -> Result<invoice::Model> {
    set_invoice_state(db, invoice_id, Some(InvoiceState::Posted), None).await
}

/// Records a payment on an invoice.
pub async fn register_payment(
    db: &DatabaseConnection,
    invoice_id: i64,
    payment_state: PaymentState,
) -> Result<invoice::Model> {
    set_invoice_state(db, invoice_id, None, Some(payment_state)).await
}

/// Cancels an invoice.
pub async fn cancel_invoice(db: &DatabaseConnection, invoice_id: i64) -> Result<invoice::Model> {
    set_invoice_state(db, invoice_id, Some(InvoiceState::Cancel), None).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::membership_line::{NewMembershipLine, create_membership_line, refresh_state};
    use crate::core::partner::{NewPartner, create_partner};
    use crate::entities::membership_line::LineState;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    async fn billed_line(
        db: &DatabaseConnection,
        company: &partner_entity::Model,
        fee: &crate::entities::product::Model,
    ) -> Result<i64> {
        Ok(create_membership_line(db, NewMembershipLine::for_partner(company.id, fee.id))
            .await?
            .id)
    }

    #[tokio::test]
    async fn test_wizard_rejects_negative_price() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let request = InvoiceRequest {
            partner_id: 1,
            product_id: 1,
            unit_price: -5.0,
            membership_line_id: None,
        };
        let result = create_membership_invoice(&db, request).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[tokio::test]
    async fn test_wizard_creates_draft_invoice() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let line_id = billed_line(&db, &company, &fee).await?;

        let action = create_membership_invoice(
            &db,
            InvoiceRequest {
                partner_id: company.id,
                product_id: fee.id,
                unit_price: 250.0,
                membership_line_id: Some(line_id),
            },
        )
        .await?;

        assert_eq!(action.invoices.len(), 1);
        let created = &action.invoices[0];
        assert_eq!(created.state, InvoiceState::Draft);
        assert_eq!(created.payment_state, PaymentState::NotPaid);
        assert_eq!(created.amount_total, 250.0);
        assert_eq!(created.invoice_address_id, company.id);

        let lines = invoice_lines(&db, created.id).await?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 1.0);
        assert_eq!(lines[0].price_unit, 250.0);

        assert_eq!(action.navigation.domain_ids, vec![created.id]);
        assert_eq!(action.navigation.views, vec![ViewKind::List, ViewKind::Form]);

        let line = membership_line::require_membership_line(&db, line_id).await?;
        assert_eq!(line.state, LineState::Invoiced);
        Ok(())
    }

    #[tokio::test]
    async fn test_wizard_without_address_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let company = create_partner(&db, NewPartner::company("Nowhere Ltd")).await?;
        let fee = create_test_product(&db, "Annual fee").await?;

        let result = create_membership_invoice(
            &db,
            InvoiceRequest {
                partner_id: company.id,
                product_id: fee.id,
                unit_price: fee.list_price,
                membership_line_id: None,
            },
        )
        .await;

        match result {
            Err(Error::MissingInvoiceAddress { partner }) => assert_eq!(partner, "Nowhere Ltd"),
            other => panic!("expected MissingInvoiceAddress, got {other:?}"),
        }
        assert!(Invoice::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_wizard_only_bills_eligible_partners() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let staff = create_partner(
            &db,
            NewPartner::contact("Staff", company.id).with_address("3 Quai", "13002", "Marseille"),
        )
        .await?;
        let outsider = create_partner(
            &db,
            NewPartner::company("Unrelated SARL").with_address("9 Rue Haute", "69001", "Lyon"),
        )
        .await?;

        let mut new = NewMembershipLine::for_partner(company.id, fee.id);
        new.contact_ids = vec![staff.id];
        let restricted = create_membership_line(&db, new.clone()).await?;
        new.all_members = true;
        let everyone = create_membership_line(&db, new).await?;

        let request = |partner_id, line_id| InvoiceRequest {
            partner_id,
            product_id: fee.id,
            unit_price: fee.list_price,
            membership_line_id: Some(line_id),
        };

        let result = create_membership_invoice(&db, request(outsider.id, everyone.id)).await;
        assert!(matches!(result, Err(Error::IneligiblePartner { .. })));
        let result = create_membership_invoice(&db, request(staff.id, restricted.id)).await;
        assert!(matches!(result, Err(Error::IneligiblePartner { .. })));
        let line = membership_line::require_membership_line(&db, restricted.id).await?;
        assert_eq!(line.state, LineState::Draft);
        assert!(Invoice::find().all(&db).await?.is_empty());

        let action = create_membership_invoice(&db, request(staff.id, everyone.id)).await?;
        assert_eq!(action.invoices[0].partner_id, staff.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_invoice_contact_address_preferred() -> Result<()> {
        let (db, company, _) = setup_with_billable_company().await?;

        let mut no_address = NewPartner::contact("Billing (no address)", company.id);
        no_address.address_type = AddressType::Invoice;
        create_partner(&db, no_address).await?;

        let mut billing = NewPartner::contact("Billing", company.id).with_address(
            "1 Ledger Lane",
            "75002",
            "Paris",
        );
        billing.address_type = AddressType::Invoice;
        let billing = create_partner(&db, billing).await?;

        let address = find_invoice_address(&db, &company).await?;
        assert_eq!(address.id, billing.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_marks_line_paid() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let line_id = billed_line(&db, &company, &fee).await?;
        let action = membership_line::action_create_invoice(&db, line_id).await?;
        let invoice_id = action.invoices[0].id;

        post_invoice(&db, invoice_id).await?;
        let line = membership_line::require_membership_line(&db, line_id).await?;
        assert_eq!(line.state, LineState::Invoiced);

        register_payment(&db, invoice_id, PaymentState::Paid).await?;
        let line = membership_line::require_membership_line(&db, line_id).await?;
        assert_eq!(line.state, LineState::Paid);
        Ok(())
    }

    #[tokio::test]
    async fn test_draft_only_line_is_to_invoice() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let line_id = billed_line(&db, &company, &fee).await?;
        membership_line::action_create_invoice(&db, line_id).await?;

        let line = refresh_state(&db, line_id).await?;
        assert_eq!(line.state, LineState::ToInvoice);
        Ok(())
    }

    #[tokio::test]
    async fn test_canceled_invoice_is_ignored() -> Result<()> {
        let (db, company, fee) = setup_with_billable_company().await?;
        let line_id = billed_line(&db, &company, &fee).await?;

        let first = membership_line::action_create_invoice(&db, line_id).await?;
        let first_id = first.invoices[0].id;
        post_invoice(&db, first_id).await?;
        register_payment(&db, first_id, PaymentState::Paid).await?;
        cancel_invoice(&db, first_id).await?;

        let second = membership_line::action_create_invoice(&db, line_id).await?;
        post_invoice(&db, second.invoices[0].id).await?;

        let line = membership_line::require_membership_line(&db, line_id).await?;
        assert_eq!(line.state, LineState::Invoiced);
        assert_eq!(invoices_for_line(&db, line_id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_invoice() -> Result<()> {
        let db = setup_test_db().await?;
        let result = post_invoice(&db, 99).await;
        assert!(matches!(result, Err(Error::InvoiceNotFound { id: 99 })));
        Ok(())
    }
}
