//! In-memory collaborators for rollover strategies: a pro-rata AMM pool, a
//! vault ladle and a rewards treasury, plus fixtures wiring them together.
//! Used by the integration tests and the keeper's simulation mode.

pub mod constants;
pub mod helpers;
pub mod ladle;
pub mod pool;
pub mod treasury;

pub use helpers::{new_strategy, Market};
pub use ladle::{LadleMock, VaultMock};
pub use pool::PoolMock;
pub use treasury::TreasuryMock;
