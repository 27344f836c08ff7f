#![doc = "knowledge-sync-core: core sync engine for knowledge-sync."]

//! This crate contains the data model, capability traits and the two-phase
//! sync pipeline that moves object-storage files into a document-ingestion
//! service and assigns the processed ones to a knowledge collection.
//!
//! # Pipeline
//! listing → [`upload`] → [`readiness`] (only with a collection target) →
//! [`assign`] → [`report`]. The entrypoint is [`synchronise::run_sync`].
//!
//! # Usage
//! Add this as a dependency for anything that drives a sync run. Concrete
//! downstream clients implement [`contract::KnowledgeClient`]; the object
//! storage side is served by [`download::BlobStoreClient`].

pub mod assign;
pub mod classify;
pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod policy;
pub mod readiness;
pub mod report;
pub mod synchronise;
pub mod upload;
