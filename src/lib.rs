//! # Cart Sync
//!
//! > **The cart state/sync engine of a storefront.**
//!
//! A shopper's cart lives in three places: in memory (what the UI shows),
//! in a local store (so it survives reloads), and on the server (once the
//! shopper signs in). This crate keeps them in step.
//!
//! ## 🏗️ Design
//!
//! ### Local first
//! Every mutation is applied in memory and written to the [`LocalStore`](store::LocalStore)
//! before the call returns. The UI never waits on the network.
//!
//! ### Best-effort mirroring
//! While the session is authenticated, each mutation is also handed to the
//! [`SyncActor`](sync_actor::SyncActor), a Tokio task that owns the
//! [`RemoteCartService`](remote::RemoteCartService). The actor applies
//! mutations in arrival order; a failure is logged and discarded. Local and
//! server state may drift apart until the next login sync or refresh.
//!
//! ### One merge per login
//! When the session becomes authenticated, a non-empty guest cart is sent to
//! the server in a single merge request and the merged cart is adopted. With
//! no guest cart the server cart is simply fetched. A flag prevents a second
//! sync from starting while one is outstanding.
//!
//! ### Injected collaborators
//! The [`CartCoordinator`](coordinator::CartCoordinator) is constructed with
//! its store and sync client; there is no global cart. Tests substitute
//! [`MemoryStore`](store::MemoryStore) and
//! [`MockCartService`](remote::mock::MockCartService).
//!
//! ## 🗺️ Module Tour
//!
//! - [`model`]: `CartLine`, `CartItem` and the line identity rules.
//! - [`coordinator`]: the cart API UI callers use.
//! - [`store`]: local persistence (`MemoryStore`, `FileStore`).
//! - [`remote`]: the server cart contract and its HTTP client.
//! - [`sync_actor`]: background mirroring of mutations.
//! - [`server_actor`]: an in-process server cart, used by the demo and tests.
//! - [`lifecycle`]: wiring, shutdown and tracing setup.
//! - [`config`]: environment-based configuration.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Demo against the in-process server cart
//! RUST_LOG=info cargo run
//!
//! # Demo against a REST cart service
//! CART_API_BASE_URL=https://shop.example.com/api CART_API_TOKEN=... cargo run
//! ```

pub mod config;
pub mod coordinator;
pub mod lifecycle;
pub mod model;
pub mod remote;
pub mod server_actor;
pub mod store;
pub mod sync_actor;
