//! Core library for the quartz-sync command line application.
//!
//! The library keeps a Quartz content folder in step with Notion database
//! exports. Readers for the exports and the content folder live under
//! [`quartz::content::io`], page and record types inside
//! [`quartz::content::model`], the matching rules in
//! [`quartz::content::reconcile`], remote cover and geocoder lookups in
//! [`quartz::content::lookup`], and the per-collection runs under
//! [`quartz::content::sync`].

pub mod quartz;

pub use quartz::content::{Result, SyncError, config, error, io, lookup, model, reconcile, sync, text};
