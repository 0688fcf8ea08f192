//! # Hanzi Tutor
//!
//! Core of a children's Chinese character handwriting and pronunciation
//! tutor.
//!
//! **Purpose:** Score handwritten characters against reference stroke
//! geometry, rate pronunciation clips, decide what to practise next and
//! persist per-user progress and rewards.
//!
//! **Architecture:** One `LearningSession` per logged-in user drives the
//! progression state machine; collaborators (recognizer, reference data,
//! speech, audio device) sit behind traits; an axum HTTP/SSE layer exposes
//! the session to the UI.

pub mod api;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod ink;
pub mod profile;
pub mod recognition;
pub mod reference;
pub mod scoring;
pub mod session;
pub mod speech;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
