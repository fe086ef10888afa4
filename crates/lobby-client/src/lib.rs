//! Nox Lobby HTTP Client
//!
//! This crate provides the client for talking to a remote Nox lobby.
//! The client implements the lobby traits, so a remote lobby can be
//! cached and overlaid like any other listing source.

pub mod client;
pub mod error;

pub use client::LobbyClient;
pub use error::ClientError;
