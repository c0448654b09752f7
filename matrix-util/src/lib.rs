pub mod common_io;
pub mod dmatrix_io;
pub mod dmatrix_util;
pub mod membership;
pub mod traits;
pub mod utils;
