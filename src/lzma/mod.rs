//! LZMA2 compression (module C2): range coding, the probability model,
//! bit pricing, price-guided parsing, LZMA2 chunk framing, and the
//! top-level multi-threaded encoder that ties them together.

pub mod encoder;
pub mod lzma2;
pub mod optimizer;
pub mod price;
pub mod range_coder;
pub mod state;

pub use encoder::{coder_info, encode_parallel, encode_range, Lzma2Params};
pub use optimizer::{choose_edge, Edge};
pub use price::PriceTable;
pub use range_coder::RangeEncoder;
pub use state::LzmaState;
