//! Order lifecycle and matching.
//!
//! `service` is the caller-facing surface (submit / cancel / list / book);
//! `engine` drives a taker through the book inside one transaction;
//! `reservation` debits cash or locks inventory at order entry and refunds on
//! cancel; `book` owns the eligibility rules for counter-orders.

pub mod book;
pub mod engine;
pub mod reservation;
pub mod service;

pub use engine::MatchingEngine;
pub use reservation::ReservationService;
pub use service::{NewOrder, OrderService};
