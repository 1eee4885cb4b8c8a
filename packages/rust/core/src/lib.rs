//! Step catalogue, job state and runner for the Azure graph ingestion.
//!
//! Each step reads one kind of Azure resource through
//! [`cloudgraph_client::AzureClient`], converts it into graph entities and
//! relationships, and records them in a shared [`job_state::JobState`]. The
//! [`runner`] executes the steps selected for a run in dependency order.

pub mod job_state;
pub mod registry;
pub mod resource_id;
pub mod runner;
pub mod steps;
pub mod web_linker;
