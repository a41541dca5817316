#![doc = "folio-publish-core: core logic library for folio-publish."]

//! This crate holds the publishing workflow and everything it needs that does not touch the
//! network: submission decoding and validation, WebP conversion, path and file naming, markdown
//! generation, and the orchestration over an abstract [`contract::ContentStore`].
//!
//! The GitHub client, configuration loading and the HTTP/CLI front ends live in the
//! `folio-publish` binary crate.
//!
//! # Usage
//! Build a [`publish::Publisher`] from a store, an encoder and a [`config::PublishConfig`], then
//! call [`publish::Publisher::publish`] once per submission.

pub mod codec;
pub mod config;
pub mod contract;
pub mod error;
pub mod markdown;
pub mod paths;
pub mod publish;
pub mod submission;
