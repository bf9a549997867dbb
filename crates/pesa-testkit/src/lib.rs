//! pesa-testkit
//!
//! In-memory [`OrderStore`] implementations and gateway payload builders for
//! the scenario suite in `tests/`. Nothing here touches a real database.

mod memory;
mod payloads;

pub use memory::{FailingOrderStore, InMemoryOrderStore};
pub use payloads::{failure_callback, success_callback};
