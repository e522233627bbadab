//! Local-first cloud mirroring
//!
//! ```text
//! service write ──► Repository (must succeed)
//!                      │ ok
//!                      ▼
//!               SyncDispatcher::dispatch ──► detached task
//!                                              ├── gate closed → Skipped
//!                                              └── RemoteMirror → RemoteStore
//!                                                    ├── Succeeded
//!                                                    └── Failed (logged)
//! ```

pub mod dispatcher;
pub mod firestore;
pub mod gate;
pub mod identity;
pub mod memory;
pub mod mirror;
pub mod remote;

pub use dispatcher::{SyncDispatcher, SyncEvent};
pub use firestore::FirestoreStore;
pub use gate::AvailabilityGate;
pub use identity::{remote_key_for, EntityKind, SyncEntity};
pub use memory::{CallCounts, MemoryStore};
pub use mirror::{RemoteMirror, SyncOutcome};
pub use remote::{CollectionPath, DocumentPath, RemoteDocument, RemoteError, RemoteStore};
