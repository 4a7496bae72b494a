// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `LeakGuard` Lib - A Rust library to poll and control JUDO ZEWA i-SAFE
//! leak guards.
//!
//! The device exposes a local REST API: every command is a GET to
//! `/api/rest/<opcode><payload>` answering with hex-encoded bytes, plus a few
//! optional JSON endpoints. This library provides an async client for both.
//!
//! # Supported Features
//!
//! - **Identity**: device type, serial number, firmware, installation date
//! - **Water usage**: total counter, day/week/month/year statistics
//! - **Settings**: sleep duration, absence limits and windows, vacation and
//!   micro-leak modes, device clock
//! - **Actions**: valve open/close, sleep, vacation, micro-leak test, learn
//!   mode, alarm acknowledgement
//! - **Snapshots**: one merged, normalized view of everything a poll cycle
//!   collected
//!
//! Requests to one device are serialized and retried with exponential
//! backoff when the device answers `429 Too Many Requests`.
//!
//! # Quick Start
//!
//! ```no_run
//! use leakguard_lib::HttpConfig;
//!
//! #[tokio::main]
//! async fn main() -> leakguard_lib::Result<()> {
//!     let client = HttpConfig::new("192.168.1.60")
//!         .with_credentials("admin", "Connectivity")
//!         .into_client()?;
//!
//!     let snapshot = client.fetch_snapshot().await?;
//!     if let Some(total) = snapshot.get_f64("total_water_m3") {
//!         println!("Total water: {total} m³");
//!     }
//!
//!     client.set_sleep_hours(4).await?;
//!     client.close_valve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Raw Commands
//!
//! ```no_run
//! use leakguard_lib::{Command, HttpConfig};
//!
//! #[tokio::main]
//! async fn main() -> leakguard_lib::Result<()> {
//!     let client = HttpConfig::new("192.168.1.60").into_client()?;
//!
//!     let response = client.send(&Command::bare(0xFF)).await?;
//!     println!("Device type payload: {:?}", response.data());
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod protocol;
pub mod snapshot;
pub mod types;

pub use command::{Command, CommandKind, CommandSpec};
pub use error::{ConnectionError, DecodeError, Error, ProtocolError, Result, ValueError};
pub use protocol::{
    Credentials, HttpConfig, HttpReply, HttpTransport, LeakGuardClient, RetryPolicy, Transport,
    WireResponse,
};
pub use snapshot::{DeviceSnapshot, SnapshotOptions};
pub use types::{
    AbsenceLimits, AbsenceWindow, DeviceClock, DeviceType, FirmwareVersion, InstallationDate,
    LeakPreset, LearnStatus, SerialNumber, TotalWater, UpdateTimestamp, UsageStatistics,
};
