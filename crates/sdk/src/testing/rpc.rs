//! Scripted JSON-RPC responses for provider-backed code.
//!
//! Responses are answered strictly in request order, so push them in the
//! order the code under test issues its calls.

use alloy::{
    primitives::{Address, B256, Bytes, TxHash},
    providers::{Provider, ProviderBuilder},
    sol_types::SolCall,
    transports::mock::Asserter,
};
use serde_json::json;

/// Provider answering every request from `asserter`.
pub fn mocked_provider(asserter: &Asserter) -> impl Provider + Clone + Sync + 'static {
    ProviderBuilder::new().connect_mocked_client(asserter.clone())
}

/// `eth_getCode` answer.
pub fn push_code(asserter: &Asserter, code: &[u8]) {
    asserter.push_success(&Bytes::copy_from_slice(code));
}

/// `eth_call` answer with the ABI-encoded return value of `C`.
pub fn push_return<C: SolCall>(asserter: &Asserter, ret: &C::Return) {
    asserter.push_success(&Bytes::from(C::abi_encode_returns(ret)));
}

/// Failing `eth_call`.
pub fn push_revert(asserter: &Asserter) { asserter.push_failure_msg("execution reverted"); }

/// `eth_getTransactionReceipt` answer for a transaction not yet included.
pub fn push_pending(asserter: &Asserter) { asserter.push_success(&serde_json::Value::Null); }

/// `eth_getTransactionReceipt` answer for an included transaction.
pub fn push_receipt(asserter: &Asserter, tx_hash: TxHash, success: bool) {
    let status = if success { "0x1" } else { "0x0" };
    asserter.push_success(&json!({
        "type": "0x2",
        "status": status,
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": B256::repeat_byte(0xbb),
        "blockNumber": "0x10",
        "from": Address::repeat_byte(0xaa),
        "to": Address::repeat_byte(0xff),
        "contractAddress": null,
        "gasUsed": "0x5208",
        "cumulativeGasUsed": "0x5208",
        "effectiveGasPrice": "0x1",
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
    }));
}
