//! The three dataset generators, one module per domain.

pub mod crm;
pub mod sales;
pub mod web;
