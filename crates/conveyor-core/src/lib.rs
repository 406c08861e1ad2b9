//! conveyor-core
//!
//! Core building blocks for the conveyor job runtime: turn an action
//! invocation into a durable, trackable job, execute it through a registered
//! handler, and chain a follow-up job from the outcome.
//!
//! - **domain**: domain model (ids, codes, priorities, envelopes, records,
//!   routing)
//! - **registry**: reloadable action defaults registry
//! - **settings**: reloadable runtime settings surface
//! - **action**: handler trait and factory
//! - **store**: durable job store port + in-memory implementation
//! - **queue**: submission queue port + in-memory implementation
//! - **processor**: job lifecycle manager (compact/expand, submit, enqueue,
//!   run, chaining)
//! - **worker**: worker group draining the queue into the processor

pub mod action;
pub mod domain;
pub mod processor;
pub mod queue;
pub mod registry;
pub mod settings;
pub mod store;
pub mod worker;
