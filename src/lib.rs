//! # Escaperoom - LLM-narrated text escape room
//!
//! Escaperoom is a text adventure in which a hosted language model plays game
//! master. A small relay server turns player actions into prompts, salvages
//! the JSON the model writes back and validates it; a terminal client reveals
//! each turn's narrative one display-sized segment at a time with a
//! typewriter effect before offering the next choices.
//!
//! ## Features
//!
//! - **Segmented Reveal**: Narrative split on sentence terminators into segments of at most 70 characters, measured in characters so CJK text is sized by what the player sees.
//! - **Typewriter Protocol**: Tick-driven reveal with click-to-skip, click-to-advance and a single completion event per turn.
//! - **Relay Server**: `axum` HTTP API in front of the Anthropic Messages API, with tolerant JSON salvage and strict validation of model output.
//! - **Themes**: Five built-in worlds with starting kits, plus free-form custom themes.
//! - **Dice**: Sinner rank and per-turn NPC/item encounters rolled server-side with injectable RNGs.
//! - **Terminal Client**: Countdown clock, inventory use, free-text actions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use escaperoom::config::Config;
//! use escaperoom::relay::{client::AnthropicClient, Relay};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default("config.toml").await?.with_env_overrides();
//!     let relay = Relay::new(Arc::new(AnthropicClient::new(&config.model)));
//!     escaperoom::server::serve(&config.server, Arc::new(relay)).await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`story`] - Segmenter, reveal controller and the timer driver
//! - [`relay`] - Prompts, model client, JSON salvage and validation
//! - [`server`] - HTTP routes for the relay
//! - [`game`] - Client game state, reducer and countdown
//! - [`shell`] - Terminal client
//! - [`config`] - Configuration management and validation
//! - [`logutil`] - Log-safe previews of model output
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐      HTTP      ┌─────────────────┐
//! │  Terminal Shell │ ─────────────▶ │  Relay Server   │ ─▶ Messages API
//! └─────────────────┘                └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Reveal Driver  │ ← segmenter + controller, one task per session
//! └─────────────────┘
//! ```

pub mod config;
pub mod game;
pub mod logutil;
pub mod relay;
pub mod server;
pub mod shell;
pub mod story;
