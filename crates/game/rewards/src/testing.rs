//! Connected runtime over a scripted wallet.

use std::sync::Arc;
use std::time::Duration;

use alloy_sol_types::abi::TokenSeq;
use alloy_sol_types::{SolEvent, SolType, SolValue};
use client_blockchain_core::{Address, Bytes, ChainDescriptor, Log, MockWallet, ProviderError};
use runtime::{ManualClock, Runtime, RuntimeConfig, RuntimeHandle, TxConfig};

pub const NOW: u64 = 1_700_000_000;

pub struct Fixture {
    pub wallet: MockWallet,
    pub clock: Arc<ManualClock>,
    pub user: Address,
    pub runtime: Runtime,
}

impl Fixture {
    pub fn handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }
}

/// Runtime connected as `0x11..11` on chain 56. `script` runs before the
/// connection so status fetches see its responses.
pub async fn connected(script: impl FnOnce(&MockWallet, Address)) -> Fixture {
    let user = Address::repeat_byte(0x11);
    let wallet = MockWallet::with_account(56, user);
    script(&wallet, user);

    let clock = Arc::new(ManualClock::at_secs(NOW));
    let config = RuntimeConfig {
        tx: TxConfig::default().with_receipt_poll_interval(Duration::from_millis(10)),
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::builder()
        .config(config)
        .provider(Arc::new(wallet.clone()))
        .clock(clock.clone())
        .chain(ChainDescriptor {
            chain_id: 56,
            name: "BNB Smart Chain".into(),
            rpc_url: "https://bsc-dataseed.binance.org".into(),
            explorer_url: "https://bscscan.com".into(),
            native_symbol: "BNB".into(),
            native_decimals: 18,
        })
        .build()
        .await
        .expect("runtime builds");
    runtime.handle().connect().await.expect("connects");

    Fixture {
        wallet,
        clock,
        user,
        runtime,
    }
}

/// ABI-encoded single return value.
pub fn ret<T: SolValue>(value: T) -> Result<Bytes, ProviderError> {
    Ok(value.abi_encode().into())
}

/// ABI-encoded tuple of named return values.
pub fn rets<T>(values: T) -> Result<Bytes, ProviderError>
where
    T: SolValue,
    for<'a> <T::SolType as SolType>::Token<'a>: TokenSeq<'a>,
{
    Ok(values.abi_encode_params().into())
}

/// Log as emitted by `address`; the mock fills in block and hash when mined.
pub fn event_log<E: SolEvent>(address: Address, event: &E) -> Log {
    let data = event.encode_log_data();
    Log {
        address,
        topics: data.topics().to_vec(),
        data: data.data,
        block_number: None,
        transaction_hash: None,
    }
}
