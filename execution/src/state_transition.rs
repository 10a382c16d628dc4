//! Apply a batch of transactions to state.
//!
//! Batches are numbered. Re-running a height that is already committed is a no-op so a
//! caller can safely retry after a crash; skipping a height is an error.

use crate::{state, Environment, Layer, State};
use anyhow::{bail, Context as _};
use oddsbook_types::execution::{Key, Output, Transaction, Value, MAX_BATCH_TRANSACTIONS};
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

/// A batch that stopped on a storage failure.
///
/// Transactions before `position` are committed under `height` and `outputs` holds what
/// they produced. The transaction at `position` and everything after it did not apply and
/// must be resubmitted in a later batch.
#[derive(Debug, ThisError)]
#[error("batch {height} stopped at transaction {position}: {cause:#}")]
pub struct BatchInterrupted {
    pub height: u64,
    pub position: usize,
    pub outputs: Vec<Output>,
    pub cause: anyhow::Error,
}

/// Executes `transactions` as batch `height` at logical time `now_ms`.
///
/// Returns every event produced, each transaction after its events, and a closing
/// `Output::Commit`.
///
/// Transfers are not reversible, so a storage failure part way through still commits the
/// transactions that completed before it, along with the height, and is reported as a
/// [`BatchInterrupted`]. Retrying that height is then a no-op. `state.apply` must itself be
/// all-or-nothing.
pub fn execute_batch<S: State>(
    state: &mut S,
    env: Environment<'_>,
    height: u64,
    now_ms: u64,
    transactions: Vec<Transaction>,
) -> anyhow::Result<Vec<Output>> {
    let committed = state::committed_height(state).context("read committed height")?;
    if height <= committed {
        debug!(height, committed, "batch already applied");
        return Ok(Vec::new());
    }
    if height != committed + 1 {
        bail!("height gap: committed {committed}, got {height}");
    }
    if transactions.len() > MAX_BATCH_TRANSACTIONS {
        bail!(
            "batch {height} carries {} transactions (max {MAX_BATCH_TRANSACTIONS})",
            transactions.len()
        );
    }

    let count = transactions.len();
    let (mut outputs, interrupted, changes) = {
        let mut layer = Layer::new(&*state, env, now_ms);
        let (outputs, interrupted) = layer.execute(transactions);
        (outputs, interrupted, layer.commit())
    };
    state.apply(changes).context("apply batch changes")?;
    state
        .insert(Key::Commit, Value::Commit { height })
        .context("record commit")?;

    if let Some((position, cause)) = interrupted {
        warn!(
            height,
            position,
            skipped = count - position,
            error = %cause,
            "batch interrupted"
        );
        return Err(BatchInterrupted {
            height,
            position,
            outputs,
            cause,
        }
        .into());
    }
    outputs.push(Output::Commit { height });

    info!(height, transactions = count, outputs = outputs.len(), "batch committed");
    Ok(outputs)
}
