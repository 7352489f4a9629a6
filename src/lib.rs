//! Account and session backend for the chirpy micro-blogging service.
//!
//! The `auth` module holds password hashing, access and refresh tokens and
//! the session flows; `chirps` owns posting and deleting messages;
//! `storage` abstracts persistence; `routes` and
//! `startup` expose everything over HTTP.

pub mod auth;
pub mod chirps;
pub mod configuration;
pub mod domain;
pub mod error;
pub mod logger;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod telemetry;
pub mod validators;
