//! # Leadsplit
//!
//! A contact-list ingestion and distribution service for sales agent teams.
//!
//! Leadsplit accepts uploaded CSV/XLSX/XLS contact files, normalizes their
//! columns onto three canonical fields (name, phone, notes), splits the
//! resulting records evenly across the active agents, and persists each
//! distribution in SQLite. Agents and ingestion results are managed over an
//! authenticated JSON HTTP API.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌───────────┐   ┌────────────┐   ┌────────┐
//! │ Upload   │──▶│  Spool  │──▶│  Parser   │──▶│ Distribute │──▶│ SQLite │
//! │ (HTTP)   │   │ (disk)  │   │ CSV/XLSX  │   │ round-robin│   │        │
//! └──────────┘   └────┬────┘   └───────────┘   └────────────┘   └────────┘
//!                     │
//!                     └── deleted on every path, success or failure
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! leadsplit init                        # create database
//! leadsplit agents add --name "Ada" --email ada@example.com --mobile +1555...
//! leadsplit serve                       # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and field validation |
//! | [`normalize`] | Header classification and row normalization |
//! | [`parse`] | CSV and workbook parsing |
//! | [`distribute`] | Even split of records across agents |
//! | [`ingest`] | Per-request ingestion orchestration |
//! | [`spool`] | Transient upload storage |
//! | [`store`] | Agent directory and ingestion-result persistence |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod distribute;
pub mod error;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod server;
pub mod spool;
pub mod store;
