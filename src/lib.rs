//! # hotplug-gateway
//!
//! USB hotplug observer with a WebSocket broadcast gateway.
//!
//! The service polls the host's USB inventory, turns the difference between
//! consecutive snapshots into connect/disconnect events, and broadcasts
//! those events to every WebSocket listener. Listeners can also broadcast
//! to each other through the same hub.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Registrar (ws/)
//!     │
//!     ├── ConnectionHub (hub/)  ◀── DeviceRelay (service/)
//!     │                                  ▲
//!     │                             Subscription
//!     │                                  │
//!     └── DeviceObserver (observer/) ── DeviceSource (nusb)
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod observer;
pub mod service;
pub mod ws;
