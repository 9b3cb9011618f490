/// Wallet balance view. The two balances fail independently: a token read
/// failure never blanks the native balance, and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletBalances {
    /// Native currency balance as a decimal string.
    pub native: String,
    /// Marketplace token balance as a decimal string.
    pub token: String,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for WalletBalances {
    fn default() -> Self {
        Self {
            native: "0".to_string(),
            token: "0".to_string(),
            is_loading: false,
            error: None,
        }
    }
}
