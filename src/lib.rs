//! # Vessel Safety Systems Simulator
//!
//! A maritime safety systems simulation library providing real-time subsystem
//! management, command processing, status reporting, and alarm panel logic.
//!
//! ## Features
//!
//! - **Real-time subsystem simulation**: Fire detection, emergency shutdown, and bilge alarm systems
//! - **Command processing**: JSON-based command parsing with ACK/NACK semantics
//! - **Central alarm panel**: Alarm aggregation with per-subsystem maintenance mode
//! - **Automated diagnostics**: Stimulus-and-verify checks across all subsystems
//! - **Command scheduling**: Time-tagged command execution
//! - **Compliance tooling**: Test-result reporting and Jira-backed CMDB access
//!
//! ## Quick Start
//!
//! ```rust
//! use vesselsim::SafetyAgent;
//!
//! // Create the safety systems agent
//! let mut agent = SafetyAgent::new();
//! agent.start();
//!
//! // Update subsystems and generate a status packet
//! if let Ok(Some(status)) = agent.update() {
//!     println!("Status: {}", status);
//! }
//!
//! // Process any queued commands
//! if let Err(e) = agent.process_commands() {
//!     println!("Command processing error: {:?}", e);
//! }
//! ```
//!
//! ## Architecture
//!
//! The simulator is organized into several key modules:
//!
//! - [`agent`] - Main orchestrator and public API
//! - [`subsystems`] - Individual subsystem implementations
//! - [`protocol`] - Command/response protocol handling
//! - [`alarm`] - Central alarm panel and maintenance mode
//! - [`diagnostics`] - Automated subsystem self-tests
//! - [`scheduler`] - Time-tagged command scheduling
//! - [`telemetry`] - Status packet generation
//! - [`report`] - Compliance report generation
//! - [`cmdb`] - Jira-backed configuration database client

#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod alarm;
pub mod cmdb;
pub mod diagnostics;
pub mod fault_injection;
pub mod protocol;
pub mod report;
pub mod scheduler;
pub mod subsystems;
pub mod telemetry;

// Re-export main public types for convenience
pub use agent::SafetyAgent;
pub use protocol::{Command, StatusPacket};
pub use subsystems::{BilgeAlarmSystem, EmergencyShutdownSystem, FireDetectionSystem};
