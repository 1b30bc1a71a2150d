//! Account state records

use serde::{Deserialize, Serialize};

pub type Accounts = Vec<Account>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub nonce: u64,
    pub balance: u64,
}

impl Account {
    pub fn new(address: impl Into<String>, nonce: u64, balance: u64) -> Self {
        Account {
            address: address.into(),
            nonce,
            balance,
        }
    }
}

/// First account whose address matches exactly.
pub fn find_account<'a>(accounts: &'a [Account], address: &str) -> Option<&'a Account> {
    accounts.iter().find(|acc| acc.address == address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_exact_match() {
        let accounts = vec![Account::new("0xabc", 3, 100), Account::new("0xABC", 9, 1)];
        assert_eq!(find_account(&accounts, "0xabc").map(|a| a.nonce), Some(3));
        assert_eq!(find_account(&accounts, "0xABC").map(|a| a.nonce), Some(9));
        assert!(find_account(&accounts, "0xab").is_none());
    }

    #[test]
    fn test_parse_accounts_file() {
        let accounts: Accounts = serde_json::from_str(
            r#"[{"address":"0x1","balance":50,"nonce":2},{"address":"0x2","balance":0,"nonce":0}]"#,
        )
        .unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0], Account::new("0x1", 2, 50));
    }
}
