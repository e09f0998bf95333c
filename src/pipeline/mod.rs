// Request-level pipelines: one per view.
//
// Each takes the shared AppContext plus a request and returns a
// serialisable view. Degenerate data yields an empty view with a status
// message, never an error.

pub mod centroid_plot;
pub mod item_plot;
