#![doc = include_str!("../README.md")]
#![no_std]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::len_without_is_empty)]

extern crate alloc;

pub(crate) type Kbn<T> = compensated_summation::KahanBabuskaNeumaier<T>;

mod utils;
pub(crate) use utils::{helper, special};

mod aggregate;
pub use aggregate::{Aggregate, Emitted, Evaluator, Mode, merge_all};

mod moments;
pub use moments::{Moments, merge_moments};

mod students_t;
pub use students_t::StudentsT;

mod welch;
pub use welch::{Alternative, TTestResult, welch_t_test};

pub use t_test::{TTest, TTestPartial};

mod combine_map;
pub use combine_map::{CombineMap, ValueMap};

mod scale_map;
pub use scale_map::scale_map;
