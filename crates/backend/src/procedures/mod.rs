//! JSON-RPC procedures over the JD client and the local database.
//!
//! Each group owns a set of `jd.<area>.<action>` method names; the
//! [`Registry`] routes a request to its group. Read procedures that hit JD
//! go through the response cache, write procedures drop the account's
//! cached entries.

pub mod account;
pub mod address;
pub mod after_sales;
pub mod category;
pub mod comment;
pub mod context;
pub mod invoice;
pub mod logistics;
pub mod order;
pub mod params;
pub mod registry;
pub mod sku;

pub use context::ProcedureContext;
pub use registry::{ProcedureError, ProcedureGroup, Registry};
