//! SQLite-backed audit log of permission decisions.
//!
//! Every check made through the operator tooling can be appended here, so a
//! denial reported by a user can be traced back to the rule (or missing rule)
//! that produced it.
//!
//! # Example
//!
//! ```no_run
//! use access::{get_user_from_role, Action, PolicyTable, Resource};
//! use audit::{AuditStore, DecisionRecord};
//!
//! let store = AuditStore::open("audit.db")?;
//!
//! let subject = get_user_from_role(Some("student"));
//! let resource = Resource::grades().owned_by("student-1");
//! let decision = PolicyTable::standard().evaluate(&subject, &resource, Action::View, None);
//! store.append(&DecisionRecord::new(&subject, &resource, Action::View, &decision))?;
//!
//! for record in store.recent(20)? {
//!     println!("{} {} {:?}", record.timestamp, record.subject_id, record.outcome);
//! }
//! # Ok::<(), audit::Error>(())
//! ```

mod error;
mod record;
mod store;

pub use error::{Error, Result};
pub use record::{DecisionRecord, Outcome, RecordId};
pub use store::AuditStore;
