//! A2A (Agent-to-Agent) support for Parley
//!
//! Serves an agent card and chat tasks over HTTP, talks to peer agents, and
//! runs autonomous outreach: discovering peers from a static candidate list
//! and relaying a message to each of them.

pub mod autonomy;
pub mod client;
pub mod directory;
pub mod executor;
pub mod protocol;
pub mod server;

#[cfg(test)]
mod testing;

pub use autonomy::{AutonomousRequest, AutonomyConfig, OutreachReply, OutreachState};
pub use client::{A2aClient, PeerMessenger};
pub use directory::{AgentDirectory, DiscoveredAgent, HttpDirectory};
pub use executor::{ChatExecutor, ExecuteError};
pub use protocol::{AgentCard, AuthConfig, TaskRequest, TaskResponse, TaskStatus};
pub use server::A2aServer;
