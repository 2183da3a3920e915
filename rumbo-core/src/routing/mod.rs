//! Route planning over the venue graph
//!
//! Reachability checks answer "can I get there at all"; the shortest
//! route planner returns the segment sequence a guidance session walks.

mod dijkstra;
mod reachability;
mod route;

pub use dijkstra::shortest_route;
pub use reachability::can_route;
pub use route::Route;
