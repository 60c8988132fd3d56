//! In-memory planning for ledger transactions.
//!
//! A transaction reads the products it touches into a [`StockBook`], applies
//! every credit and debit to that working copy, and only when all of them
//! validated does it write the changed rows back. Nothing here touches the
//! database, so the rules can be tested directly.

use crate::{
    core::quantity::round1,
    entities::{invoice_item, product},
    errors::{Error, Result},
};
use std::collections::{BTreeMap, BTreeSet};

/// Quantity on hand per location name.
pub type Locations = BTreeMap<String, f64>;

/// Net stock change per `(product_id, location)`.
pub type StockDeltas = BTreeMap<(i64, String), f64>;

/// Whether a debit may take a location below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Reject any debit that exceeds the quantity on hand
    #[default]
    Strict,
    /// Let the location go negative
    AllowNegative,
}

impl StockPolicy {
    /// Maps the `allow_negative_stock` setting onto a policy.
    #[must_use]
    pub const fn from_allow_negative(allow: bool) -> Self {
        if allow {
            Self::AllowNegative
        } else {
            Self::Strict
        }
    }
}

/// Working copy of one product's stock.
#[derive(Debug, Clone)]
pub struct ProductStock {
    /// Product row as read inside the transaction
    pub product: product::Model,
    locations: Locations,
    changed: BTreeSet<String>,
}

impl ProductStock {
    /// Wraps a product and its location rows.
    #[must_use]
    pub const fn new(product: product::Model, locations: Locations) -> Self {
        Self {
            product,
            locations,
            changed: BTreeSet::new(),
        }
    }

    /// Quantity at `location`, zero when the product was never stocked there.
    #[must_use]
    pub fn quantity_at(&self, location: &str) -> f64 {
        self.locations.get(location).copied().unwrap_or(0.0)
    }

    /// All location quantities.
    #[must_use]
    pub const fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Sum over every location, rounded to one decimal.
    #[must_use]
    pub fn total(&self) -> f64 {
        round1(self.locations.values().sum())
    }

    /// Locations whose quantity changed, with their new value.
    pub fn changed_locations(&self) -> impl Iterator<Item = (&str, f64)> {
        self.changed
            .iter()
            .map(|loc| (loc.as_str(), self.quantity_at(loc)))
    }

    /// Whether any location changed.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.changed.is_empty()
    }

    fn set(&mut self, location: &str, quantity: f64) {
        self.locations.insert(location.to_string(), round1(quantity));
        self.changed.insert(location.to_string());
    }
}

/// Working copy of every product a transaction touches.
#[derive(Debug, Default)]
pub struct StockBook {
    products: BTreeMap<i64, ProductStock>,
}

impl StockBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the book.
    pub fn insert(&mut self, stock: ProductStock) {
        self.products.insert(stock.product.id, stock);
    }

    /// Looks a product up, failing with `NotFound` naming the id.
    pub fn get(&self, product_id: i64) -> Result<&ProductStock> {
        self.products
            .get(&product_id)
            .ok_or_else(|| Error::not_found("Product", product_id))
    }

    fn get_mut(&mut self, product_id: i64) -> Result<&mut ProductStock> {
        self.products
            .get_mut(&product_id)
            .ok_or_else(|| Error::not_found("Product", product_id))
    }

    /// Adds `quantity` at `location`, returning the new level.
    pub fn credit(&mut self, product_id: i64, location: &str, quantity: f64) -> Result<f64> {
        let stock = self.get_mut(product_id)?;
        let new_quantity = round1(stock.quantity_at(location) + quantity);
        stock.set(location, new_quantity);
        Ok(new_quantity)
    }

    /// Removes `quantity` from `location`, returning the new level.
    ///
    /// Under [`StockPolicy::Strict`] the debit fails with `InsufficientStock`
    /// when the location holds less than `quantity`.
    pub fn debit(
        &mut self,
        product_id: i64,
        location: &str,
        quantity: f64,
        policy: StockPolicy,
    ) -> Result<f64> {
        let stock = self.get_mut(product_id)?;
        let available = stock.quantity_at(location);
        let new_quantity = round1(available - quantity);
        if new_quantity < 0.0 && policy == StockPolicy::Strict {
            return Err(Error::InsufficientStock {
                product: stock.product.name.clone(),
                location: location.to_string(),
                available,
                requested: quantity,
            });
        }
        stock.set(location, new_quantity);
        Ok(new_quantity)
    }

    /// Sets `location` to an absolute level.
    pub fn set_level(&mut self, product_id: i64, location: &str, quantity: f64) -> Result<()> {
        self.get_mut(product_id)?.set(location, quantity);
        Ok(())
    }

    /// Applies a net delta map.
    ///
    /// Credits are applied before debits so a line that only moved between
    /// locations, or shrank, never trips the sufficiency check on its way.
    pub fn apply_deltas(&mut self, deltas: &StockDeltas, policy: StockPolicy) -> Result<()> {
        for ((product_id, location), delta) in deltas.iter().filter(|(_, d)| **d > 0.0) {
            self.credit(*product_id, location, *delta)?;
        }
        for ((product_id, location), delta) in deltas.iter().filter(|(_, d)| **d < 0.0) {
            self.debit(*product_id, location, -delta, policy)?;
        }
        Ok(())
    }

    /// Products with at least one changed location.
    pub fn touched(&self) -> impl Iterator<Item = &ProductStock> {
        self.products.values().filter(|s| s.is_changed())
    }
}

/// A validated invoice line, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine {
    /// Product id
    pub product_id: i64,
    /// Product name at invoicing time
    pub product_name: String,
    /// HSN code at invoicing time
    pub hsn_code: String,
    /// Parsed quantity
    pub quantity: f64,
    /// Unit price
    pub price: f64,
    /// Linked purchase order
    pub purchase_order_id: Option<i64>,
}

/// Tax and total for one dispatched line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchAmounts {
    /// `quantity * price`
    pub subtotal: f64,
    /// `subtotal * tax_rate / 100`
    pub tax_amount: f64,
    /// `subtotal + tax_amount`
    pub item_total: f64,
}

/// Computes the reporting amounts for a dispatch row.
#[must_use]
pub fn dispatch_amounts(quantity: f64, price: f64, tax_rate: f64) -> DispatchAmounts {
    let subtotal = quantity * price;
    let tax_amount = subtotal * tax_rate / 100.0;
    DispatchAmounts {
        subtotal,
        tax_amount,
        item_total: subtotal + tax_amount,
    }
}

/// How one product's invoiced quantity changed between the stored invoice and an edit.
#[derive(Debug, Clone, PartialEq)]
pub enum LineChange {
    /// Product appears only in the new lines
    Added {
        /// Product id
        product_id: i64,
        /// New quantity
        quantity: f64,
    },
    /// Product appears only in the old lines
    Removed {
        /// Product id
        product_id: i64,
        /// Old quantity
        quantity: f64,
    },
    /// Same location, different quantity
    QuantityChanged {
        /// Product id
        product_id: i64,
        /// Old quantity
        from: f64,
        /// New quantity
        to: f64,
    },
    /// Goods now leave from a different location
    LocationChanged {
        /// Product id
        product_id: i64,
        /// Old location
        from: String,
        /// New location
        to: String,
        /// Old quantity
        old_quantity: f64,
        /// New quantity
        new_quantity: f64,
    },
    /// Nothing changed for this product
    Unchanged {
        /// Product id
        product_id: i64,
    },
}

/// Before/after comparison of an invoice edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceDiff {
    /// Per-product classification
    pub changes: Vec<LineChange>,
    /// Net stock change per `(product, location)`; zero entries are dropped
    pub stock_deltas: StockDeltas,
}

fn totals_by_product<I>(lines: I) -> BTreeMap<i64, f64>
where
    I: IntoIterator<Item = (i64, f64)>,
{
    let mut totals = BTreeMap::new();
    for (product_id, quantity) in lines {
        *totals.entry(product_id).or_insert(0.0) += quantity;
    }
    totals
}

impl InvoiceDiff {
    /// Diffs the stored lines (leaving `old_location`) against the edited lines
    /// (leaving `new_location`).
    ///
    /// Old lines are credited back where they left from and new lines debited
    /// where they now leave from, so a location change moves stock instead of
    /// subtracting twice from the same place.
    #[must_use]
    pub fn compute(
        old_location: &str,
        old_items: &[invoice_item::Model],
        new_location: &str,
        new_lines: &[ResolvedLine],
    ) -> Self {
        let mut stock_deltas = StockDeltas::new();

        for item in old_items {
            *stock_deltas
                .entry((item.product_id, old_location.to_string()))
                .or_insert(0.0) += item.quantity;
        }
        for line in new_lines {
            *stock_deltas
                .entry((line.product_id, new_location.to_string()))
                .or_insert(0.0) -= line.quantity;
        }

        stock_deltas.retain(|_, delta| {
            *delta = round1(*delta);
            *delta != 0.0
        });

        let old_totals = totals_by_product(old_items.iter().map(|i| (i.product_id, i.quantity)));
        let new_totals = totals_by_product(new_lines.iter().map(|l| (l.product_id, l.quantity)));
        let products: BTreeSet<i64> = old_totals.keys().chain(new_totals.keys()).copied().collect();

        let changes = products
            .into_iter()
            .map(|product_id| {
                match (old_totals.get(&product_id), new_totals.get(&product_id)) {
                    (None, Some(&quantity)) => LineChange::Added {
                        product_id,
                        quantity,
                    },
                    (Some(&quantity), None) => LineChange::Removed {
                        product_id,
                        quantity,
                    },
                    (Some(&old_quantity), Some(&new_quantity)) if old_location != new_location => {
                        LineChange::LocationChanged {
                            product_id,
                            from: old_location.to_string(),
                            to: new_location.to_string(),
                            old_quantity,
                            new_quantity,
                        }
                    }
                    (Some(&from), Some(&to)) if round1(from - to) != 0.0 => {
                        LineChange::QuantityChanged {
                            product_id,
                            from,
                            to,
                        }
                    }
                    _ => LineChange::Unchanged { product_id },
                }
            })
            .collect();

        Self {
            changes,
            stock_deltas,
        }
    }

    /// Whether the edit leaves every stock level untouched.
    #[must_use]
    pub fn is_stock_neutral(&self) -> bool {
        self.stock_deltas.is_empty()
    }
}
