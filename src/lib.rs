//! Fleet operations coordination service
//!
//! Trip and maintenance lifecycles over a transactional entity store, with
//! the cross-entity status rules that keep vehicles, drivers and trips
//! consistent: a vehicle or driver is held by at most one dispatched trip,
//! a vehicle in the shop cannot be dispatched, and every operation commits
//! or rolls back as a whole.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
