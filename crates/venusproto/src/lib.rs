//! Wire protocol types for the Marstek Venus local UDP API.
//!
//! The Venus E speaks a JSON-RPC-flavored request/response protocol over
//! UDP datagrams: requests are `{id, method, params?}` objects, responses
//! carry either a `result` or an `error` key. There is no version field,
//! no batching, and no ordering beyond what one datagram exchange gives
//! you — this crate only models the shapes and the handful of quirks the
//! firmware has (loose success booleans, per-mode set payloads).
//!
//! Transport, scheduling, and everything stateful lives in `venuslink`;
//! this crate stays serde + thiserror only so it can be imported anywhere.

pub mod mode;
pub mod value;
pub mod wire;

pub use mode::{DeviceMode, UnsupportedMode};
pub use value::{dig, is_trueish};
pub use wire::{method, DeviceRequest, DeviceResponse};
