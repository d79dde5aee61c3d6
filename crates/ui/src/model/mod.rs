pub mod results;
pub mod state;

pub use results::{AggregatedResultSet, PAGE_SIZE, RawPayloads, normalize, normalize_capped};
pub use state::{QueryController, WidgetState};
