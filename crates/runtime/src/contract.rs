//! Typed `eth_call` helper over `sol!` bindings.

use alloy_sol_types::SolCall;
use client_blockchain_core::{Address, ChainReader, TxError};

/// Call a view function and decode its return values.
///
/// Provider errors are classified into [`TxError`]; malformed return data
/// becomes [`TxError::Unknown`].
pub async fn call_view<R, C>(reader: &R, to: Address, call: C) -> Result<C::Return, TxError>
where
    R: ChainReader + ?Sized,
    C: SolCall + Send,
{
    let data = reader.call(to, call.abi_encode().into()).await?;
    C::abi_decode_returns(&data, false)
        .map_err(|e| TxError::Unknown(format!("failed to decode {} result: {e}", C::SIGNATURE)))
}
