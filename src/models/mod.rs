mod change_point;
mod event;
mod price_point;

pub use change_point::{
    ChangePointDate, ChangePointPosterior, ChangePointRecord, ChangePointSummary,
    ParameterSummary, PosteriorDraw,
};
pub use event::EventRecord;
pub use price_point::{PricePoint, PriceSeries};
