//! Itinerary step sequencing for étape.
//!
//! The sequencing module keeps a strictly ordered list of itinerary steps
//! and derives everything else from it: consecutive same-destination
//! display groups, calendar-month buckets, and the "current" step for
//! today's date. Mutation of the order goes through the reorder
//! coordinator, which applies the new order optimistically and rolls back
//! when persistence fails.

pub mod model;
pub mod reorder;
pub mod sequence;
pub mod service;
pub mod store;
