//! Wire data models for the venue REST API.
//!
//! This module defines the request and response shapes exchanged with the
//! `/info` and `/exchange` endpoints.
//!
//! # Submodules
//!
//! - `meta`: the asset universe returned by `{"type": "meta"}`.
//! - `order`: order/cancel actions and the exchange response envelope.
//! - `book`: L2 book snapshots returned by `{"type": "l2Book"}` (also the
//!     shape of the WebSocket `l2Book` channel).
//!

mod meta;
pub use meta::{AssetMeta, Meta};

mod order;
pub use order::{
    CancelAction, ExchangeResponse, ExchangeResponseBody, ExchangeResponseData,
    ExchangeResponseValue, OrderAction, TaggedStatus, Tif, WireCancel, WireLimit, WireOrder,
    WireOrderStatus, WireOrderType,
};

mod book;
pub use book::{L2Book, L2Level};
