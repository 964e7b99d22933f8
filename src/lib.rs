// src/lib.rs
pub mod api;
pub mod auth;
pub mod chart;
pub mod config;
pub mod error;
pub mod forms;
pub mod ledger;
pub mod models;
pub mod pages;
pub mod seed;
pub mod store;
pub mod views;
pub mod watchlist;
