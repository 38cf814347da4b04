//! JSON-RPC chain client for ERC-20 allowance reads and approvals.
//!
//! Reads use `eth_call` against the read RPC. Approvals are handed to the
//! signing endpoint as `eth_sendTransaction`; that endpoint owns the wallet
//! key and nonce sequencing. No receipt is awaited.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use promptgate_core::allowance::{address_hex, to_hex};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::config::ChainConfig;
use super::downstream::{DownstreamFailure, DownstreamResult};
use crate::traits::AllowanceChain;

/// `allowance(address,address)`
const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];
/// `approve(address,uint256)`
const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// ABI-encode `allowance(owner, spender)` calldata.
#[must_use]
pub fn encode_allowance_call(owner: Address, spender: Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&ALLOWANCE_SELECTOR);
    data.extend_from_slice(&address_word(owner));
    data.extend_from_slice(&address_word(spender));
    data
}

/// ABI-encode `approve(spender, amount)` calldata.
#[must_use]
pub fn encode_approve_call(spender: Address, amount: U256) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&APPROVE_SELECTOR);
    data.extend_from_slice(&address_word(spender));
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    data
}

fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// `AllowanceChain` over Ethereum JSON-RPC.
pub struct JsonRpcChainClient {
    client: Client,
    rpc_url: String,
    signer_url: String,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ChainConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to create chain HTTP client: {e}"))?;
        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            signer_url: config.signer_url.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn rpc_call(&self, url: &str, method: &str, params: Value) -> DownstreamResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        debug!(method, id, "JSON-RPC call");

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DownstreamFailure::status(
                status.as_u16(),
                format!("{method}: {text}"),
            ));
        }

        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            DownstreamFailure::malformed(format!("{method} response is not JSON: {e}"))
        })?;
        if let Some(error) = value.get("error") {
            return Err(DownstreamFailure::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown rpc error")
                    .to_string(),
            });
        }
        value
            .get("result")
            .cloned()
            .ok_or_else(|| DownstreamFailure::malformed(format!("{method} result was missing")))
    }
}

#[async_trait]
impl AllowanceChain for JsonRpcChainClient {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> DownstreamResult<U256> {
        let calldata = to_hex(&encode_allowance_call(owner, spender));
        let result = self
            .rpc_call(
                &self.rpc_url,
                "eth_call",
                json!([{ "to": address_hex(&token), "data": calldata }, "latest"]),
            )
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| DownstreamFailure::malformed("eth_call result is not a string"))?;
        parse_word(raw)
    }

    async fn send_approval(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> DownstreamResult<B256> {
        let calldata = to_hex(&encode_approve_call(spender, amount));
        let result = self
            .rpc_call(
                &self.signer_url,
                "eth_sendTransaction",
                json!([{
                    "from": address_hex(&owner),
                    "to": address_hex(&token),
                    "value": "0x0",
                    "data": calldata,
                }]),
            )
            .await?;
        let raw = result.as_str().ok_or_else(|| {
            DownstreamFailure::malformed("eth_sendTransaction result is not a string")
        })?;
        B256::from_str(raw.trim())
            .map_err(|e| DownstreamFailure::malformed(format!("invalid transaction hash: {e}")))
    }
}

/// Decode a 0x-prefixed `uint256` return word.
fn parse_word(raw: &str) -> DownstreamResult<U256> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| DownstreamFailure::malformed("eth_call result must be 0x-prefixed"))?;
    if digits.is_empty() {
        // Calls to an address without code return "0x".
        return Err(DownstreamFailure::malformed(
            "eth_call returned no data; is the token address a contract?",
        ));
    }
    if digits.len() > 64 {
        return Err(DownstreamFailure::malformed("eth_call result exceeds 32 bytes"));
    }
    let padded = format!("{digits:0>64}");
    let bytes = hex::decode(&padded)
        .map_err(|e| DownstreamFailure::malformed(format!("eth_call result is not hex: {e}")))?;
    Ok(U256::from_be_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use parking_lot::Mutex;

    use super::*;

    const TX: &str = "0x8f1b2b4e5c4f7a3d9e0b6c2a1d4e7f8091a2b3c4d5e6f708192a3b4c5d6e7f80";

    async fn spawn_rpc(answer: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/",
                post(
                    |State((seen, answer)): State<(Arc<Mutex<Vec<Value>>>, Value)>,
                     Json(body): Json<Value>| async move {
                        seen.lock().push(body.clone());
                        let mut reply = answer.clone();
                        reply["id"] = body["id"].clone();
                        reply["jsonrpc"] = json!("2.0");
                        Json(reply)
                    },
                ),
            )
            .with_state((Arc::clone(&seen), answer));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}/"), seen)
    }

    fn client(url: &str) -> JsonRpcChainClient {
        JsonRpcChainClient::new(&ChainConfig {
            rpc_url: url.to_string(),
            signer_url: url.to_string(),
            request_timeout: Duration::from_secs(5),
            ..ChainConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn allowance_calldata_layout() {
        let data = encode_allowance_call(Address::repeat_byte(0xaa), Address::repeat_byte(0xbb));
        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &[0xdd, 0x62, 0xed, 0x3e]);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], &[0xaa; 20]);
        assert_eq!(&data[48..68], &[0xbb; 20]);
    }

    #[test]
    fn approve_calldata_encodes_max_amount() {
        let data = encode_approve_call(Address::repeat_byte(0xcc), U256::MAX);
        assert_eq!(&data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(&data[36..68], &[0xff; 32]);
    }

    #[test]
    fn parse_word_handles_short_and_full_words() {
        assert_eq!(parse_word("0x2a").unwrap(), U256::from(42u64));
        let full = format!("0x{}", "f".repeat(64));
        assert_eq!(parse_word(&full).unwrap(), U256::MAX);
        assert!(parse_word("0x").is_err());
        assert!(parse_word("2a").is_err());
        assert!(parse_word(&format!("0x{}", "0".repeat(66))).is_err());
    }

    #[tokio::test]
    async fn allowance_uses_eth_call() {
        let word = format!("0x{:064x}", 1_000_000u64);
        let (url, seen) = spawn_rpc(json!({ "result": word })).await;

        let value = client(&url)
            .allowance(
                Address::repeat_byte(0x11),
                Address::repeat_byte(0x22),
                Address::repeat_byte(0x33),
            )
            .await
            .unwrap();
        assert_eq!(value, U256::from(1_000_000u64));

        let requests = seen.lock();
        assert_eq!(requests[0]["method"], "eth_call");
        assert_eq!(
            requests[0]["params"][0]["to"],
            "0x1111111111111111111111111111111111111111"
        );
        let data = requests[0]["params"][0]["data"].as_str().unwrap();
        assert!(data.starts_with("0xdd62ed3e"));
        assert_eq!(requests[0]["params"][1], "latest");
    }

    #[tokio::test]
    async fn approval_uses_eth_send_transaction() {
        let (url, seen) = spawn_rpc(json!({ "result": TX })).await;

        let hash = client(&url)
            .send_approval(
                Address::repeat_byte(0x11),
                Address::repeat_byte(0x22),
                Address::repeat_byte(0x33),
                U256::MAX,
            )
            .await
            .unwrap();
        assert_eq!(hash, B256::from_str(TX).unwrap());

        let requests = seen.lock();
        let tx = &requests[0]["params"][0];
        assert_eq!(requests[0]["method"], "eth_sendTransaction");
        assert_eq!(tx["from"], "0x2222222222222222222222222222222222222222");
        assert_eq!(tx["to"], "0x1111111111111111111111111111111111111111");
        assert!(tx["data"].as_str().unwrap().starts_with("0x095ea7b3"));
        assert!(tx["data"].as_str().unwrap().ends_with(&"f".repeat(64)));
    }

    #[tokio::test]
    async fn rpc_error_object_is_typed() {
        let (url, _) = spawn_rpc(json!({
            "error": { "code": -32000, "message": "insufficient funds for gas" }
        }))
        .await;

        let err = client(&url)
            .send_approval(Address::ZERO, Address::ZERO, Address::ZERO, U256::from(1u64))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DownstreamFailure::Rpc {
                code: -32000,
                message: "insufficient funds for gas".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_result_is_malformed() {
        let (url, _) = spawn_rpc(json!({})).await;
        let err = client(&url)
            .allowance(Address::ZERO, Address::ZERO, Address::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, DownstreamFailure::Malformed { .. }));
    }
}
