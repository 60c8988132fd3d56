//! Entity module - SeaORM definitions for every ledger table.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod dispatch;
pub mod expense;
pub mod invoice;
pub mod invoice_item;
pub mod invoice_number;
pub mod po_fulfillment;
pub mod product;
pub mod product_stock;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod recycle_bin;
pub mod stock_movement;
pub mod stock_receipt;
pub mod stock_transfer;
pub mod system_state;

// Re-export specific types to avoid conflicts
pub use dispatch::{Entity as Dispatch, Model as DispatchModel};
pub use expense::{Entity as Expense, Model as ExpenseModel};
pub use invoice::{Entity as Invoice, Model as InvoiceModel};
pub use invoice_item::{Entity as InvoiceItem, Model as InvoiceItemModel};
pub use invoice_number::Entity as InvoiceNumber;
pub use po_fulfillment::{Entity as PoFulfillment, Model as PoFulfillmentModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_stock::Entity as ProductStock;
pub use purchase_order::{Entity as PurchaseOrder, Model as PurchaseOrderModel};
pub use purchase_order_item::{Entity as PurchaseOrderItem, Model as PurchaseOrderItemModel};
pub use recycle_bin::{Entity as RecycleBin, Model as RecycleBinModel};
pub use stock_movement::{Entity as StockMovement, Model as StockMovementModel};
pub use stock_receipt::{Entity as StockReceipt, Model as StockReceiptModel};
pub use stock_transfer::{Entity as StockTransfer, Model as StockTransferModel};
pub use system_state::{Entity as SystemState, Model as SystemStateModel};
