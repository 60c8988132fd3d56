//! Purchase order business logic.
//!
//! Orders are created with nothing delivered. After that, only invoice
//! transactions move `delivered_qty`, through an [`OrderBook`] loaded inside the
//! invoice's own transaction.

use crate::{
    core::quantity::{EPSILON, is_positive_quantity, round1},
    entities::{
        PoFulfillment, PurchaseOrder, PurchaseOrderItem, po_fulfillment, purchase_order,
        purchase_order::PurchaseOrderStatus, purchase_order_item,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::{BTreeMap, BTreeSet};

/// One line of a new purchase order.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    /// Ordered product
    pub product_id: i64,
    /// Ordered quantity
    pub total_qty: f64,
    /// Agreed unit rate
    pub rate: f64,
}

/// Input for [`create_purchase_order`].
#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    /// Customer-facing PO number
    pub po_number: String,
    /// Customer that placed the order
    pub customer_id: String,
    /// Order date
    pub date: NaiveDate,
    /// Ordered lines, at most one per product
    pub items: Vec<NewOrderLine>,
}

/// An order with its lines and fulfillment history.
#[derive(Debug, Clone)]
pub struct PurchaseOrderDetail {
    /// Header
    pub order: purchase_order::Model,
    /// Lines
    pub items: Vec<purchase_order_item::Model>,
    /// Fulfillments across all lines, oldest first
    pub fulfillments: Vec<po_fulfillment::Model>,
}

/// Derives the order status from its lines.
///
/// Completed when no line has anything left, Partially Fulfilled when anything
/// was delivered, Open otherwise.
#[must_use]
pub fn derive_status(items: &[purchase_order_item::Model]) -> PurchaseOrderStatus {
    if items.iter().all(|i| i.remaining_qty <= 0.0) {
        PurchaseOrderStatus::Completed
    } else if items.iter().any(|i| i.delivered_qty > 0.0) {
        PurchaseOrderStatus::PartiallyFulfilled
    } else {
        PurchaseOrderStatus::Open
    }
}

/// Creates a purchase order with every line undelivered.
///
/// # Errors
/// Returns an error if:
/// - The PO number is empty or there are no lines
/// - A line quantity is not strictly positive, or a rate is negative
/// - The same product appears on two lines
/// - The database insert fails
pub async fn create_purchase_order(
    db: &DatabaseConnection,
    input: NewPurchaseOrder,
) -> Result<PurchaseOrderDetail> {
    if input.po_number.trim().is_empty() {
        return Err(Error::validation("PO number cannot be empty"));
    }
    if input.items.is_empty() {
        return Err(Error::validation("A purchase order needs at least one line"));
    }

    let mut seen = BTreeSet::new();
    for line in &input.items {
        if !is_positive_quantity(line.total_qty) {
            return Err(Error::InvalidAmount {
                amount: line.total_qty,
            });
        }
        if line.rate < 0.0 || !line.rate.is_finite() {
            return Err(Error::InvalidAmount { amount: line.rate });
        }
        if !seen.insert(line.product_id) {
            return Err(Error::validation(format!(
                "Product {} appears on more than one line",
                line.product_id
            )));
        }
    }

    let txn = db.begin().await?;
    let now = chrono::Utc::now();

    let order = purchase_order::ActiveModel {
        po_number: Set(input.po_number.trim().to_string()),
        customer_id: Set(input.customer_id),
        date: Set(input.date),
        status: Set(PurchaseOrderStatus::Open),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(input.items.len());
    for line in input.items {
        let total = round1(line.total_qty);
        let item = purchase_order_item::ActiveModel {
            purchase_order_id: Set(order.id),
            product_id: Set(line.product_id),
            total_qty: Set(total),
            delivered_qty: Set(0.0),
            remaining_qty: Set(total),
            rate: Set(line.rate),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;
    tracing::info!(po_number = %order.po_number, lines = items.len(), "Purchase order created");

    Ok(PurchaseOrderDetail {
        order,
        items,
        fulfillments: Vec::new(),
    })
}

/// Retrieves an order with its lines and fulfillments.
pub async fn get_purchase_order<C>(db: &C, order_id: i64) -> Result<Option<PurchaseOrderDetail>>
where
    C: ConnectionTrait,
{
    let Some(order) = PurchaseOrder::find_by_id(order_id).one(db).await? else {
        return Ok(None);
    };
    let items = PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(order_id))
        .order_by_asc(purchase_order_item::Column::Id)
        .all(db)
        .await?;
    let fulfillments = PoFulfillment::find()
        .filter(po_fulfillment::Column::PoItemId.is_in(items.iter().map(|i| i.id)))
        .order_by_asc(po_fulfillment::Column::Id)
        .all(db)
        .await?;

    Ok(Some(PurchaseOrderDetail {
        order,
        items,
        fulfillments,
    }))
}

/// Lists orders for a customer, newest first.
pub async fn list_purchase_orders_for_customer(
    db: &DatabaseConnection,
    customer_id: &str,
) -> Result<Vec<purchase_order::Model>> {
    PurchaseOrder::find()
        .filter(purchase_order::Column::CustomerId.eq(customer_id))
        .order_by_desc(purchase_order::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A fulfillment to append when the book is written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFulfillment {
    /// PO line
    pub po_item_id: i64,
    /// Delivering invoice
    pub invoice_no: String,
    /// Delivered quantity
    pub quantity: f64,
    /// Invoice date
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
struct OrderState {
    order: purchase_order::Model,
    items: Vec<purchase_order_item::Model>,
    changed_items: BTreeSet<i64>,
}

/// Working copy of the purchase orders an invoice transaction touches.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: BTreeMap<i64, OrderState>,
    removed: BTreeSet<(i64, String)>,
    appended: Vec<NewFulfillment>,
}

impl OrderBook {
    /// Adds an order and its lines to the book.
    pub fn insert(&mut self, order: purchase_order::Model, items: Vec<purchase_order_item::Model>) {
        self.orders.insert(
            order.id,
            OrderState {
                order,
                items,
                changed_items: BTreeSet::new(),
            },
        );
    }

    /// The line for `product_id` on order `order_id`, as currently planned.
    #[must_use]
    pub fn line(&self, order_id: i64, product_id: i64) -> Option<&purchase_order_item::Model> {
        self.orders
            .get(&order_id)?
            .items
            .iter()
            .find(|i| i.product_id == product_id)
    }

    /// Status the order will be written with.
    #[must_use]
    pub fn status(&self, order_id: i64) -> Option<PurchaseOrderStatus> {
        self.orders.get(&order_id).map(|s| derive_status(&s.items))
    }

    /// Records delivery of `quantity` against the order's line for `product_id`.
    ///
    /// # Errors
    /// - `NotFound` if the order is not in the book or has no line for the product
    /// - `ExceedsPurchaseOrder` if `quantity` exceeds the remaining balance by
    ///   more than [`EPSILON`]
    pub fn deliver(
        &mut self,
        order_id: i64,
        product_id: i64,
        product_name: &str,
        quantity: f64,
        invoice_no: &str,
        date: NaiveDate,
    ) -> Result<()> {
        let state = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| Error::not_found("Purchase order", order_id))?;
        let po_number = state.order.po_number.clone();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| {
                Error::not_found("Purchase order line", format!("{po_number}/{product_name}"))
            })?;

        if quantity > item.remaining_qty + EPSILON {
            return Err(Error::ExceedsPurchaseOrder {
                product: product_name.to_string(),
                po_number,
                requested: quantity,
                remaining: item.remaining_qty,
                excess: round1(quantity - item.remaining_qty),
            });
        }

        item.delivered_qty = round1(item.delivered_qty + quantity);
        item.remaining_qty = round1(item.total_qty - item.delivered_qty);
        state.changed_items.insert(item.id);
        self.appended.push(NewFulfillment {
            po_item_id: item.id,
            invoice_no: invoice_no.to_string(),
            quantity,
            date,
        });
        Ok(())
    }

    /// Undoes an invoice's delivery of `quantity` against the order's line for
    /// `product_id` and drops that invoice's fulfillment entries on the line.
    ///
    /// An order or line that no longer exists is skipped. Delivered quantity
    /// never drops below zero.
    pub fn reverse(&mut self, order_id: i64, product_id: i64, quantity: f64, invoice_no: &str) {
        let Some(state) = self.orders.get_mut(&order_id) else {
            tracing::warn!(order_id, "Reversal skipped: purchase order no longer exists");
            return;
        };
        let Some(item) = state.items.iter_mut().find(|i| i.product_id == product_id) else {
            tracing::warn!(order_id, product_id, "Reversal skipped: no matching PO line");
            return;
        };

        item.delivered_qty = round1(item.delivered_qty - quantity).max(0.0);
        item.remaining_qty = round1(item.total_qty - item.delivered_qty);
        state.changed_items.insert(item.id);

        let item_id = item.id;
        self.appended
            .retain(|f| !(f.po_item_id == item_id && f.invoice_no == invoice_no));
        self.removed.insert((item_id, invoice_no.to_string()));
    }
}

/// Reads the given orders and their lines into an [`OrderBook`].
///
/// Ids that do not exist are left out; [`OrderBook::deliver`] reports them.
pub async fn load_order_book<C, I>(db: &C, order_ids: I) -> Result<OrderBook>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i64>,
{
    let ids: BTreeSet<i64> = order_ids.into_iter().collect();
    let mut book = OrderBook::default();
    if ids.is_empty() {
        return Ok(book);
    }

    let orders = PurchaseOrder::find()
        .filter(purchase_order::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;
    let items = PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.is_in(ids.iter().copied()))
        .order_by_asc(purchase_order_item::Column::Id)
        .all(db)
        .await?;

    for order in orders {
        let lines = items
            .iter()
            .filter(|i| i.purchase_order_id == order.id)
            .cloned()
            .collect();
        book.insert(order, lines);
    }
    Ok(book)
}

/// Writes changed lines, removed and appended fulfillments, and refreshed statuses.
///
/// Removals run before appends, so an invoice edit that re-delivers against the
/// same line under the same invoice number ends with exactly its new entry.
pub async fn write_order_book<C>(db: &C, book: &OrderBook) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();

    for state in book.orders.values() {
        if state.changed_items.is_empty() {
            continue;
        }
        for item in state
            .items
            .iter()
            .filter(|i| state.changed_items.contains(&i.id))
        {
            let mut active: purchase_order_item::ActiveModel = item.clone().into();
            active.delivered_qty = Set(item.delivered_qty);
            active.remaining_qty = Set(item.remaining_qty);
            active.update(db).await?;
        }

        let mut order: purchase_order::ActiveModel = state.order.clone().into();
        order.status = Set(derive_status(&state.items));
        order.updated_at = Set(now);
        order.update(db).await?;
    }

    for (item_id, invoice_no) in &book.removed {
        PoFulfillment::delete_many()
            .filter(
                Condition::all()
                    .add(po_fulfillment::Column::PoItemId.eq(*item_id))
                    .add(po_fulfillment::Column::InvoiceNo.eq(invoice_no.as_str())),
            )
            .exec(db)
            .await?;
    }

    for fulfillment in &book.appended {
        po_fulfillment::ActiveModel {
            po_item_id: Set(fulfillment.po_item_id),
            invoice_no: Set(fulfillment.invoice_no.clone()),
            quantity: Set(fulfillment.quantity),
            date: Set(fulfillment.date),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn item(id: i64, total: f64, delivered: f64) -> purchase_order_item::Model {
        purchase_order_item::Model {
            id,
            purchase_order_id: 1,
            product_id: id,
            total_qty: total,
            delivered_qty: delivered,
            remaining_qty: total - delivered,
            rate: 1.0,
        }
    }

    #[test]
    fn test_derive_status() {
        assert_eq!(
            derive_status(&[item(1, 10.0, 0.0), item(2, 5.0, 0.0)]),
            PurchaseOrderStatus::Open
        );
        assert_eq!(
            derive_status(&[item(1, 10.0, 10.0), item(2, 5.0, 0.0)]),
            PurchaseOrderStatus::PartiallyFulfilled
        );
        assert_eq!(
            derive_status(&[item(1, 10.0, 10.0), item(2, 5.0, 5.0)]),
            PurchaseOrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_create_purchase_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = new_purchase_order("", &[(1, 10.0)]);
        let err = create_purchase_order(&db, input.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        input = new_purchase_order("PO-1", &[]);
        let err = create_purchase_order(&db, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        input = new_purchase_order("PO-1", &[(1, 0.0)]);
        let err = create_purchase_order(&db, input).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { amount: 0.0 }));

        input = new_purchase_order("PO-1", &[(1, 5.0), (1, 6.0)]);
        let err = create_purchase_order(&db, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_purchase_order() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_stocked_product(&db, "Cement", &[]).await?;

        let created =
            create_purchase_order(&db, new_purchase_order("PO-7", &[(product.id, 50.0)])).await?;
        assert_eq!(created.order.status, PurchaseOrderStatus::Open);
        assert_eq!(created.items[0].remaining_qty, 50.0);
        assert_eq!(created.items[0].delivered_qty, 0.0);

        let fetched = get_purchase_order(&db, created.order.id).await?.unwrap();
        assert_eq!(fetched.order.po_number, "PO-7");
        assert_eq!(fetched.items.len(), 1);
        assert!(fetched.fulfillments.is_empty());

        let listed = list_purchase_orders_for_customer(&db, "CUST-1").await?;
        assert_eq!(listed.len(), 1);

        assert!(get_purchase_order(&db, 999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_order_book_deliver_reverse_roundtrip() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_stocked_product(&db, "Cement", &[]).await?;
        let po =
            create_purchase_order(&db, new_purchase_order("PO-7", &[(product.id, 50.0)])).await?;
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let mut book = load_order_book(&db, [po.order.id]).await?;
        book.deliver(po.order.id, product.id, "Cement", 50.0, "INV-1", date)?;
        assert_eq!(
            book.status(po.order.id),
            Some(PurchaseOrderStatus::Completed)
        );
        write_order_book(&db, &book).await?;

        let after = get_purchase_order(&db, po.order.id).await?.unwrap();
        assert_eq!(after.order.status, PurchaseOrderStatus::Completed);
        assert_eq!(after.items[0].remaining_qty, 0.0);
        assert_eq!(after.fulfillments.len(), 1);
        assert_eq!(after.fulfillments[0].invoice_no, "INV-1");

        let mut book = load_order_book(&db, [po.order.id]).await?;
        let err = book
            .deliver(po.order.id, product.id, "Cement", 1.0, "INV-2", date)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ExceedsPurchaseOrder { remaining, .. } if remaining == 0.0
        ));

        book.reverse(po.order.id, product.id, 50.0, "INV-1");
        write_order_book(&db, &book).await?;

        let reverted = get_purchase_order(&db, po.order.id).await?.unwrap();
        assert_eq!(reverted.order.status, PurchaseOrderStatus::Open);
        assert_eq!(reverted.items[0].delivered_qty, 0.0);
        assert_eq!(reverted.items[0].remaining_qty, 50.0);
        assert!(reverted.fulfillments.is_empty());

        Ok(())
    }

    #[test]
    fn test_deliver_tolerates_float_slack() {
        let mut book = OrderBook::default();
        let now = chrono::Utc::now();
        book.insert(
            purchase_order::Model {
                id: 1,
                po_number: "PO-1".to_string(),
                customer_id: "CUST-1".to_string(),
                date: now.date_naive(),
                status: PurchaseOrderStatus::Open,
                created_at: now,
                updated_at: now,
            },
            vec![item(3, 0.3, 0.0)],
        );

        assert!(
            book.deliver(1, 3, "Sand", 0.1 + 0.2, "INV-1", now.date_naive())
                .is_ok()
        );
        assert_eq!(book.line(1, 3).unwrap().remaining_qty, 0.0);
        assert!(book.deliver(9, 3, "Sand", 1.0, "INV-1", now.date_naive()).is_err());
    }
}
