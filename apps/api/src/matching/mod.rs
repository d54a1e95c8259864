//! Text matching and scoring primitives shared by retrieval, ranking and
//! case memory. Everything here is pure and synchronous, except vocabulary loading.

pub mod dedup;
pub mod gaps;
pub mod geo;
pub mod normalize;
pub mod overlap;
pub mod profile;
pub mod ranking;
pub mod recency;
pub mod skills;
