mod number;

pub use number::{format_f64, write_f64, write_i64, write_usize};
