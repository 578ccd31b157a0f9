pub mod dispatcher;
pub mod hall_calls;

pub use dispatcher::Dispatcher;
pub use hall_calls::DispatchStats;
pub use hall_calls::HallCallQueue;
