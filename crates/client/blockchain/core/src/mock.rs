//! Mock wallet for testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::traits::{ChainReader, ProviderError, WalletProvider};
use crate::types::{
    Address, Bytes, ChainDescriptor, ChainId, Log, LogFilter, TransactionReceipt,
    TransactionRequest, TxHash, U256, WalletEvent,
};

/// Scripted in-memory wallet.
///
/// Contract reads are answered from responses registered per exact calldata
/// or per 4-byte selector. Every sent transaction is mined immediately into a
/// fresh block; receipts and event logs can be delayed to mimic lagging nodes.
#[derive(Clone)]
pub struct MockWallet {
    state: Arc<Mutex<MockState>>,
    events: broadcast::Sender<WalletEvent>,
}

struct PendingLog {
    log: Log,
    visible_after: usize,
}

struct MockState {
    accounts: Vec<Address>,
    request_error: Option<ProviderError>,
    accounts_error: Option<ProviderError>,
    chain_id: ChainId,
    known_chains: HashSet<ChainId>,
    native_balances: HashMap<Address, U256>,
    balance_error: Option<ProviderError>,
    exact_calls: HashMap<(Address, Bytes), Result<Bytes, ProviderError>>,
    selector_calls: HashMap<(Address, [u8; 4]), Result<Bytes, ProviderError>>,
    call_log: Vec<(Address, Bytes)>,
    balance_reads: usize,
    sent: Vec<TransactionRequest>,
    send_error: Option<ProviderError>,
    next_status: u64,
    next_logs: Vec<(Log, usize)>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    receipt_delay: u32,
    receipt_polls: HashMap<TxHash, u32>,
    block_number: u64,
    logs: Vec<PendingLog>,
    log_queries: usize,
}

impl MockWallet {
    pub fn new(chain_id: ChainId) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(MockState {
                accounts: Vec::new(),
                request_error: None,
                accounts_error: None,
                chain_id,
                known_chains: HashSet::from([chain_id]),
                native_balances: HashMap::new(),
                balance_error: None,
                exact_calls: HashMap::new(),
                selector_calls: HashMap::new(),
                call_log: Vec::new(),
                balance_reads: 0,
                sent: Vec::new(),
                send_error: None,
                next_status: TransactionReceipt::STATUS_SUCCESS,
                next_logs: Vec::new(),
                receipts: HashMap::new(),
                receipt_delay: 0,
                receipt_polls: HashMap::new(),
                block_number: 100,
                logs: Vec::new(),
                log_queries: 0,
            })),
            events,
        }
    }

    /// Wallet with one authorized account.
    pub fn with_account(chain_id: ChainId, account: Address) -> Self {
        let wallet = Self::new(chain_id);
        wallet.set_accounts(vec![account]);
        wallet
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub fn set_chain_id(&self, chain_id: ChainId) {
        self.state.lock().unwrap().chain_id = chain_id;
    }

    pub fn fail_request_accounts(&self, err: Option<ProviderError>) {
        self.state.lock().unwrap().request_error = err;
    }

    pub fn fail_accounts(&self, err: Option<ProviderError>) {
        self.state.lock().unwrap().accounts_error = err;
    }

    pub fn set_native_balance(&self, address: Address, wei: U256) {
        self.state
            .lock()
            .unwrap()
            .native_balances
            .insert(address, wei);
    }

    pub fn fail_native_balance(&self, err: Option<ProviderError>) {
        self.state.lock().unwrap().balance_error = err;
    }

    /// Answer any call to `to` whose calldata starts with `selector`.
    pub fn on_call(&self, to: Address, selector: [u8; 4], response: Result<Bytes, ProviderError>) {
        self.state
            .lock()
            .unwrap()
            .selector_calls
            .insert((to, selector), response);
    }

    /// Answer a call with exactly this calldata. Takes precedence over selector responses.
    pub fn on_exact_call(
        &self,
        to: Address,
        calldata: impl Into<Bytes>,
        response: Result<Bytes, ProviderError>,
    ) {
        self.state
            .lock()
            .unwrap()
            .exact_calls
            .insert((to, calldata.into()), response);
    }

    pub fn fail_send(&self, err: Option<ProviderError>) {
        self.state.lock().unwrap().send_error = err;
    }

    /// Status code for receipts of subsequently sent transactions.
    pub fn set_receipt_status(&self, status: u64) {
        self.state.lock().unwrap().next_status = status;
    }

    /// Number of receipt polls that return `None` before a receipt appears.
    pub fn set_receipt_delay(&self, polls: u32) {
        self.state.lock().unwrap().receipt_delay = polls;
    }

    /// Emit `log` in the block of the next sent transaction. The log becomes
    /// queryable through [`ChainReader::logs`] only after `hidden_queries`
    /// log queries have been answered without it.
    pub fn emit_log_on_next_tx(&self, log: Log, hidden_queries: usize) {
        self.state
            .lock()
            .unwrap()
            .next_logs
            .push((log, hidden_queries));
    }

    /// Push a wallet notification to every subscriber.
    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    /// Switch the authorized accounts and notify subscribers.
    pub fn change_accounts(&self, accounts: Vec<Address>) {
        self.set_accounts(accounts.clone());
        self.emit(WalletEvent::AccountsChanged(accounts));
    }

    /// Switch the selected chain and notify subscribers.
    pub fn change_chain(&self, chain_id: ChainId) {
        self.set_chain_id(chain_id);
        self.emit(WalletEvent::ChainChanged(chain_id));
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn calls(&self) -> Vec<(Address, Bytes)> {
        self.state.lock().unwrap().call_log.clone()
    }

    pub fn balance_reads(&self) -> usize {
        self.state.lock().unwrap().balance_reads
    }

    pub fn log_queries(&self) -> usize {
        self.state.lock().unwrap().log_queries
    }

    pub fn current_chain(&self) -> ChainId {
        self.state.lock().unwrap().chain_id
    }
}

#[async_trait]
impl ChainReader for MockWallet {
    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn balance(&self, address: Address) -> Result<U256, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.balance_reads += 1;
        if let Some(err) = state.balance_error.clone() {
            return Err(err);
        }
        Ok(state
            .native_balances
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.call_log.push((to, data.clone()));

        if let Some(response) = state.exact_calls.get(&(to, data.clone())) {
            return response.clone();
        }
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .unwrap_or_default();
        state
            .selector_calls
            .get(&(to, selector))
            .cloned()
            .unwrap_or_else(|| {
                Err(ProviderError::rpc(
                    -32000,
                    format!("no mock response for {to} selector {selector:02x?}"),
                ))
            })
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let delay = state.receipt_delay;
        let polls = state.receipt_polls.entry(hash).or_insert(0);
        *polls += 1;
        if *polls <= delay {
            return Ok(None);
        }
        Ok(state.receipts.get(&hash).cloned())
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.log_queries += 1;
        let queries = state.log_queries;
        Ok(state
            .logs
            .iter()
            .filter(|pending| queries > pending.visible_after && filter.matches(&pending.log))
            .map(|pending| pending.log.clone())
            .collect())
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let state = self.state.lock().unwrap();
        match &state.request_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.accounts.clone()),
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let state = self.state.lock().unwrap();
        match &state.accounts_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.accounts.clone()),
        }
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.send_error.clone() {
            return Err(err);
        }
        state.sent.push(tx);
        state.block_number += 1;

        let block = state.block_number;
        let hash = TxHash::from(U256::from(state.sent.len()));
        let base_queries = state.log_queries;

        let mut receipt_logs = Vec::new();
        for (mut log, hidden) in std::mem::take(&mut state.next_logs) {
            log.block_number = Some(block);
            log.transaction_hash = Some(hash);
            receipt_logs.push(log.clone());
            state.logs.push(PendingLog {
                log,
                visible_after: base_queries + hidden,
            });
        }

        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: block,
            status: state.next_status,
            logs: receipt_logs,
        };
        state.receipts.insert(hash, receipt);
        Ok(hash)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        let known = self.state.lock().unwrap().known_chains.contains(&chain_id);
        if !known {
            return Err(ProviderError::rpc(
                crate::error::CODE_UNRECOGNIZED_CHAIN,
                "Unrecognized chain ID",
            ));
        }
        self.change_chain(chain_id);
        Ok(())
    }

    async fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
        self.state
            .lock()
            .unwrap()
            .known_chains
            .insert(chain.chain_id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::B256;

    #[tokio::test]
    async fn receipts_follow_configured_status() {
        let wallet = MockWallet::with_account(56, Address::repeat_byte(1));
        wallet.set_receipt_status(0);
        let hash = wallet
            .send_transaction(TransactionRequest::new(
                Address::repeat_byte(1),
                Address::repeat_byte(2),
                Bytes::new(),
            ))
            .await
            .unwrap();

        let receipt = wallet.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(!receipt.succeeded());
    }

    #[tokio::test]
    async fn delayed_logs_become_visible() {
        let contract = Address::repeat_byte(9);
        let wallet = MockWallet::with_account(56, Address::repeat_byte(1));
        wallet.emit_log_on_next_tx(
            Log {
                address: contract,
                topics: vec![B256::repeat_byte(3)],
                data: Bytes::new(),
                block_number: None,
                transaction_hash: None,
            },
            2,
        );
        let hash = wallet
            .send_transaction(TransactionRequest::new(
                Address::repeat_byte(1),
                contract,
                Bytes::new(),
            ))
            .await
            .unwrap();
        let block = wallet
            .transaction_receipt(hash)
            .await
            .unwrap()
            .unwrap()
            .block_number;
        let filter = LogFilter::in_block(contract, block);

        assert!(wallet.logs(&filter).await.unwrap().is_empty());
        assert!(wallet.logs(&filter).await.unwrap().is_empty());
        assert_eq!(wallet.logs(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_chain_requires_add() {
        let wallet = MockWallet::new(1);
        let err = wallet.switch_chain(56).await.unwrap_err();
        assert_eq!(err.code(), Some(4902));

        let chain = ChainDescriptor {
            chain_id: 56,
            name: "BSC".into(),
            rpc_url: "http://localhost".into(),
            explorer_url: "http://localhost".into(),
            native_symbol: "BNB".into(),
            native_decimals: 18,
        };
        wallet.add_chain(&chain).await.unwrap();
        wallet.switch_chain(56).await.unwrap();
        assert_eq!(wallet.current_chain(), 56);
    }
}
