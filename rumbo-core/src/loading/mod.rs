//! This module is responsible for loading venue documents and building
//! the immutable venue model from them.

mod builder;
mod raw_types;

pub use builder::{
    VenueDataSource, load_venue, venue_from_json, venue_from_json_with_updates, venue_from_source,
};
