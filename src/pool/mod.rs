pub mod callback;
pub mod cl_pool;
pub mod clock;
pub mod event;
pub mod flash;
pub mod ledger;
mod liquidity;
pub mod oracle;
pub mod position;
pub mod swap;
pub mod tick;


pub use callback::{FlashCallback, MintCallback, SwapCallback};
pub use cl_pool::{ClPool, CumulativesInside, Slot0};
pub use clock::{Clock, ManualClock, SystemClock};
pub use event::PoolEvent;
pub use flash::FlashResult;
pub use ledger::{AssetLedger, InMemoryLedger};
pub use oracle::Observation;
pub use position::{PositionInfo, PositionKey};
pub use swap::{SwapParams, SwapResult};
pub use tick::TickInfo;
