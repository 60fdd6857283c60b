//! Utility modules for wire-format encoding.

pub mod datetime;

pub use datetime::{
    date_to_days, format_date, format_datetime, format_time, format_timestamp, MAX_DATE_DAYS,
    MAX_EPOCH_MICROS, MAX_TIME_MICROS, MIN_DATE_DAYS, MIN_EPOCH_MICROS,
};
