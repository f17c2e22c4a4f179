// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proof-of-Work Stamps
//!
//! Mines NIP-13 style proof of work on letter events without blocking the
//! caller:
//! - [`PowMiner`] runs a single job to completion, cancellation or timeout
//! - [`MiningSupervisor`] drives a dedicated mining thread over channels and
//!   enforces one active job at a time

mod config;
mod error;
mod messages;
mod miner;
mod supervisor;

pub use config::{MiningConfig, MAX_HASH_BITS};
pub use error::MiningError;
pub use messages::{MiningRequest, MiningResponse, MiningResult, PowNoteRequest, RequestId};
pub use miner::{Checkpoint, JobState, MiningJob, MiningOutcome, PowMiner};
pub use supervisor::MiningSupervisor;
