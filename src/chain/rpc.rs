use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use thiserror::Error;

use super::{BalanceSource, Holder, HolderSource};

const SPL_TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
const TOKEN_2022_PROGRAM: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
/// Fixed size of a classic SPL token account.
const SPL_ACCOUNT_SIZE: u64 = 165;
const LAMPORTS_PER_SOL: i64 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Minimal Solana JSON-RPC client.
#[derive(Debug, Clone)]
pub struct SolanaRpc {
    http: Client,
    url: String,
}

impl SolanaRpc {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let resp: Value = self
            .http
            .post(&self.url)
            .timeout(Duration::from_secs(60))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = resp.get("error") {
            return Err(RpcError::Rpc {
                code: err.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }

        resp.get("result")
            .cloned()
            .ok_or_else(|| RpcError::Unexpected(format!("{method}: missing result")))
    }

    /// Wallet balance in SOL.
    pub async fn get_balance(&self, wallet: &str) -> Result<Decimal, RpcError> {
        let result = self.call("getBalance", json!([wallet])).await?;
        let lamports = result
            .get("value")
            .and_then(Value::as_u64)
            .ok_or_else(|| RpcError::Unexpected("getBalance: missing value".into()))?;
        Ok(Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL))
    }

    /// Parsed token accounts for `mint` under one token program.
    async fn token_accounts(&self, program: &str, mint: &str) -> Result<Vec<Value>, RpcError> {
        let mut filters = vec![json!({ "memcmp": { "offset": 0, "bytes": mint } })];
        // Token-2022 accounts carry extensions, so only classic accounts have a fixed size.
        if program == SPL_TOKEN_PROGRAM {
            filters.insert(0, json!({ "dataSize": SPL_ACCOUNT_SIZE }));
        }

        let result = self
            .call(
                "getProgramAccounts",
                json!([program, { "encoding": "jsonParsed", "filters": filters }]),
            )
            .await?;

        match result {
            Value::Array(accounts) => Ok(accounts),
            other => Err(RpcError::Unexpected(format!(
                "getProgramAccounts: expected array, got {other}"
            ))),
        }
    }

    /// Holder snapshot, summed per owner, zero balances dropped.
    pub async fn get_holders(&self, mint: &str) -> Result<Vec<Holder>, RpcError> {
        let mut accounts = self.token_accounts(SPL_TOKEN_PROGRAM, mint).await?;
        if accounts.is_empty() {
            accounts = self.token_accounts(TOKEN_2022_PROGRAM, mint).await?;
        }
        Ok(holders_from_accounts(&accounts))
    }
}

/// Fold parsed token accounts into one balance per owner, largest first.
pub fn holders_from_accounts(accounts: &[Value]) -> Vec<Holder> {
    let mut by_owner: HashMap<String, Decimal> = HashMap::new();

    for account in accounts {
        let Some(info) = account.pointer("/account/data/parsed/info") else {
            continue;
        };
        let Some(owner) = info.get("owner").and_then(Value::as_str) else {
            continue;
        };
        let Some(amount) = info
            .pointer("/tokenAmount/amount")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Decimal>().ok())
        else {
            continue;
        };
        if amount > Decimal::ZERO {
            *by_owner.entry(owner.to_string()).or_insert(Decimal::ZERO) += amount;
        }
    }

    let mut holders: Vec<Holder> = by_owner
        .into_iter()
        .map(|(address, balance)| Holder { address, balance })
        .collect();
    holders.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.address.cmp(&b.address)));
    holders
}

#[async_trait]
impl BalanceSource for SolanaRpc {
    async fn sol_balance(&self, wallet: &str) -> anyhow::Result<Decimal> {
        Ok(self.get_balance(wallet).await?)
    }
}

#[async_trait]
impl HolderSource for SolanaRpc {
    async fn holders(&self, mint: &str) -> anyhow::Result<Vec<Holder>> {
        Ok(self.get_holders(mint).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(owner: &str, amount: &str) -> Value {
        json!({
            "pubkey": "acct",
            "account": {
                "data": {
                    "parsed": {
                        "info": {
                            "owner": owner,
                            "tokenAmount": { "amount": amount, "decimals": 6, "uiAmount": 0.0 }
                        },
                        "type": "account"
                    },
                    "program": "spl-token"
                }
            }
        })
    }

    #[test]
    fn test_holders_merge_accounts_per_owner() {
        let accounts = vec![
            account("alice", "600"),
            account("bob", "300"),
            account("alice", "100"),
            account("carol", "0"),
            json!({ "account": { "data": "garbage" } }),
        ];

        let holders = holders_from_accounts(&accounts);
        assert_eq!(
            holders,
            vec![
                Holder { address: "alice".into(), balance: Decimal::from(700) },
                Holder { address: "bob".into(), balance: Decimal::from(300) },
            ]
        );
    }
}
