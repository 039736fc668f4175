//! Mensageiro do Bem - AI-generated "Bom dia" / "Boa noite" greetings
//!
//! A small HTTP proxy that turns a greeting type and theme into text
//! suggestions and a matching illustration, using interchangeable AI
//! providers, plus a client library that drives a greeting form and plans
//! how the result is shared.

pub mod ai;
pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod proxy;
pub mod startup;

pub use error::{Error, Result};
