#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::multiple_crate_versions)]

//! Core of the Ayna Chat clients.
//!
//! Everything in this crate is platform neutral: the browser app and the
//! terminal client plug their own storage and socket transports into the
//! traits defined here.

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod models;
pub mod relay;
pub mod session;
