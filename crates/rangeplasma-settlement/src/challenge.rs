//! Challenge rules: what evidence refutes a pending exit.
//!
//! The exit game only enforces the challenge window and the state
//! transition. Whether a piece of evidence actually invalidates an exit is
//! decided by a [`ChallengeRule`].

use rangeplasma_commitment::verifier;
use rangeplasma_types::{Exit, PlasmaError, Result, TransferProof};

use crate::block_log::BlockLog;

/// Decides whether `evidence` refutes `exit`.
pub trait ChallengeRule {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// `Ok(())` if the challenge is valid.
    ///
    /// # Errors
    /// Any error rejects the challenge and leaves the exit untouched.
    fn check(&self, exit: &Exit, evidence: &TransferProof, blocks: &BlockLog) -> Result<()>;
}

/// The exit owner already spent part of the range.
///
/// Valid when the evidence is a committed transfer signed away by the exit
/// owner, overlapping the exit, and included in a block at or after the
/// exit's `spendable_from`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpentRangeChallenge;

impl ChallengeRule for SpentRangeChallenge {
    fn name(&self) -> &'static str {
        "spent-range"
    }

    fn check(&self, exit: &Exit, evidence: &TransferProof, blocks: &BlockLog) -> Result<()> {
        let root = blocks.root(evidence.block_number)?;
        let spend = verifier::verify_transfer_proof(&root, evidence)?;
        let transfer = spend.transfer;

        if transfer.sender != exit.owner {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!(
                    "transfer sender {} is not exit owner {}",
                    transfer.sender, exit.owner
                ),
            });
        }
        if transfer.token != exit.token {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!("token {} differs from exit token {}", transfer.token, exit.token),
            });
        }
        if !exit.overlaps(transfer.start, transfer.end) {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!(
                    "transfer [{}, {}) does not touch exit range [{}, {})",
                    transfer.start, transfer.end, exit.start, exit.end
                ),
            });
        }
        if spend.block_number < exit.spendable_from {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!(
                    "spend in {} predates ownership from {}",
                    spend.block_number, exit.spendable_from
                ),
            });
        }
        Ok(())
    }
}
