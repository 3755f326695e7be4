//! # rangeplasma-settlement
//!
//! **Settlement Plane**: the deposited-range ledger, the block log, the exit
//! game, and the sequential reducer that ties them together.
//!
//! ## Architecture
//!
//! 1. **RangeLedger**: sorted, linked partition of the coordinate space
//! 2. **BlockLog**: committed roots, spaced by a minimum host-block interval
//! 3. **ExitGame**: opens, challenges and finalizes exits in priority order
//! 4. **ChallengeRule**: decides whether evidence refutes an exit
//! 5. **InvariantChecker**: partition and supply checks after every step
//! 6. **PlasmaState**: owns all of the above; the only mutation path
//!
//! ## Operation Flow
//!
//! ```text
//! host tx → PlasmaState::apply(now, op)
//!     Deposit       → RangeLedger::deposit()
//!     SubmitBlock   → BlockLog::submit_block()
//!     BeginExit     → ExitGame::begin_exit()     (reads ledger + block log)
//!     ChallengeExit → ExitGame::challenge_exit() (ChallengeRule)
//!     FinalizeExit  → ExitGame::finalize_exit()  → RangeLedger::remove_range()
//!   → InvariantChecker::verify_all()
//! ```
//!
//! The host ledger's block count is the only clock. It is passed into every
//! call that depends on it and is never advanced here.

pub mod block_log;
pub mod challenge;
pub mod exit_game;
pub mod invariants;
pub mod range_ledger;
pub mod state;

pub use block_log::BlockLog;
pub use challenge::{ChallengeRule, SpentRangeChallenge};
pub use exit_game::{ExitClaim, ExitGame};
pub use invariants::InvariantChecker;
pub use range_ledger::{Credit, OwnedSegment, RangeLedger};
pub use state::{Operation, PlasmaState, Receipt, StateSnapshot};
