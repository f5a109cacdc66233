//! Service layer: the EDI gateway client and the reconciliation orchestrator

pub mod edi_client;
pub mod reconciler;

pub use edi_client::{EdiClient, EdiError};
pub use reconciler::{CoverReconciler, LinkError};
