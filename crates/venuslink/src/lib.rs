//! Rate-limited UDP polling scheduler for the Marstek Venus battery inverter.
//!
//! The device's local API is a single UDP request/response exchange, and
//! its firmware misbehaves under back-to-back requests. Everything in this
//! crate exists to respect that constraint while multiplexing several
//! logically distinct queries onto the one channel:
//!
//! - [`transport`]: one lazily-created UDP socket, one request in flight,
//!   socket discarded and recreated on any failure.
//! - [`gate`]: global minimum spacing between any two outgoing requests.
//! - [`poll`]: priority-ordered due-clock table deciding which query (if
//!   any) a tick is allowed to send.
//! - [`scheduler`] + [`command`]: the composition root. `tick()` sends at
//!   most one request; `set_mode()` runs a set-then-verify sequence that
//!   trusts only a read-back, never the set command's own acknowledgment.
//!
//! The remaining modules ([`discovery`], [`diagnostics`], [`readings`])
//! are one-shot I/O or plain formatting over the scheduler's snapshot.
//!
//! No failure in here is fatal: polls and mode changes record their error
//! into the snapshot and leave the scheduler retryable.

pub mod command;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod gate;
pub mod poll;
pub mod readings;
pub mod scheduler;
pub mod snapshot;
pub mod transport;

pub use diagnostics::DiagnosticsReport;
pub use discovery::{discover, DiscoveredDevice};
pub use error::{CallError, ProtocolError, TransportError};
pub use gate::RequestGate;
pub use poll::{PollTable, QueryKind};
pub use readings::{extract, Reading, ReadingSpec, READINGS};
pub use scheduler::Scheduler;
pub use snapshot::{DeviceIdentity, DeviceSnapshot};
pub use transport::{probe, DeviceTransport, UdpTransport};
