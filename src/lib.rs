//! # horizon-trust
//!
//! Campaign moderation, trust scoring, and donation service for the
//! Blessed Horizon fundraising platform.
//!
//! Recipients draft campaigns and submit them for review. Submitted
//! campaigns are screened against keyword lists and scored from their
//! verification, age, story, media, updates, and donations; reviewers
//! then approve, reject, or ask for changes. Approved campaigns accept
//! donations through the payment processor until the goal is reached.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers + JWT auth (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── ModerationService / TrustService / DonationService (service/)
//!     │       ├── ContentChecker (content/)
//!     │       ├── Trust calculator (trust/)
//!     │       └── PaymentProcessor (Stripe)
//!     ├── EventBus (domain/)
//!     │
//!     └── CampaignRepository (persistence/): PostgreSQL or in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod content;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod trust;
pub mod ws;
