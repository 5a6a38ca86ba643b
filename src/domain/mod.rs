//! Domain types shared by the indicator engine and the simulator.

pub mod candle;
pub mod position;
pub mod trade;

pub use candle::{validate_series, Candle, SeriesError};
pub use position::{Position, TakeProfit};
pub use trade::{ExitReason, Trade};
