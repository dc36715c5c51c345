// src/lib.rs

//! Reposter Library
//!
//! Walks a community's history in fixed windows, keeps eligible media
//! submissions whose source and media are still online, and republishes
//! them to another community with an attribution comment.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
