// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-directional signalling between sessions and their observers.
//!
//! - [`SettledBus`] broadcasts every applied settlement, keyed by database.
//! - [`HistoryCorrelator`] turns execution settlements into per-database
//!   history refresh tokens; [`HistoryFeed`] is the consumer side.
//! - [`commands`] carries export requests from decoupled notifiers.

pub mod commands;
pub mod events;
pub mod history;

pub use commands::{export_command_channel, ExportCommand, ExportCommandReceiver, ExportCommandSender};
pub use events::{SessionKind, SettledBus, SettledEvent, SettledOutcome, SettledSubscription};
pub use history::{HistoryCorrelator, HistoryFeed};
