//! # Repository Modules
//!
//! One repository per persisted collection:
//!
//! - [`ledger`] - append-only stock movements and derived stock reads
//! - [`order`] - the order lifecycle state machine (submit / validate / cancel)
//! - [`sale`] - end-customer sales and invoice numbering
//! - [`product`] - read-only product price reference
//!
//! Composite effects (order validation's dual movement, a sale and its exit
//! movement) always run inside a single transaction owned by the repository
//! that initiates them.

pub mod ledger;
pub mod order;
pub mod product;
pub mod sale;
