use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use alloy::{
    primitives::{
        Address, U256, address,
        utils::{format_ether, format_units},
    },
    providers::Provider,
};
use async_trait::async_trait;
use futures::join;
use gavel_abi::IERC20Minimal;
use tokio::sync::watch;
use tracing::warn;

use crate::{error::BalanceError, types::WalletBalances};

/// Error surfaced when the native balance read fails.
pub const BALANCES_ERROR: &str = "Failed to load wallet balances";

/// Marketplace token on public networks.
pub const DEPLOYED_TOKEN: Address = address!("0x5ae1b16c2e2dd7ab7e0c4e2c764efc9f7de2f472");

const TOKEN_DECIMALS: u8 = 18;

/// Pick the token contract for the connected network. Loopback RPC hosts
/// get the locally-deployed token supplied by configuration; any other
/// host uses the fixed deployment.
pub fn resolve_token_address(rpc_host: &str, local_token: Option<Address>) -> Address {
    let loopback = matches!(rpc_host, "localhost" | "127.0.0.1" | "[::1]" | "::1" | "0.0.0.0");
    match (loopback, local_token) {
        (true, Some(token)) => token,
        _ => DEPLOYED_TOKEN,
    }
}

/// The two balance reads the wallet feed fans out.
#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn native_balance(&self, account: Address) -> Result<U256, BalanceError>;

    async fn token_balance(
        &self,
        token: Address,
        account: Address,
    ) -> Result<U256, BalanceError>;
}

/// [`BalanceReader`] over a live RPC provider.
#[derive(Clone)]
pub struct RpcBalanceReader<P>
where
    P: Provider + Clone,
{
    provider: P,
}

impl<P> RpcBalanceReader<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> BalanceReader for RpcBalanceReader<P>
where
    P: Provider + Clone + 'static,
{
    async fn native_balance(&self, account: Address) -> Result<U256, BalanceError> {
        Ok(self.provider.get_balance(account).await?)
    }

    async fn token_balance(
        &self,
        token: Address,
        account: Address,
    ) -> Result<U256, BalanceError> {
        let contract = IERC20Minimal::new(token, &self.provider);
        Ok(contract.balanceOf(account).call().await?)
    }
}

struct Shared {
    state: watch::Sender<WalletBalances>,
    generation: AtomicU64,
}

impl Shared {
    fn publish_if_current(
        &self,
        generation: u64,
        update: impl FnOnce(&mut WalletBalances),
    ) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) == generation {
                update(state);
                true
            } else {
                false
            }
        })
    }
}

/// Aggregated wallet balances for one account.
///
/// The native and token reads are fanned out together but fail
/// independently: a native failure surfaces [`BALANCES_ERROR`] and leaves
/// both balances at their last known values, while a token failure is
/// silently coerced to "0". `refresh()` is idempotent and safe to call
/// while a fetch is in flight; last write wins via the generation counter.
pub struct WalletFeed<B> {
    reader: Arc<B>,
    token: Address,
    account: Option<Address>,
    shared: Arc<Shared>,
}

impl<B> WalletFeed<B>
where
    B: BalanceReader + 'static,
{
    pub fn new(reader: Arc<B>, token: Address) -> Self {
        let (state, _) = watch::channel(WalletBalances::default());
        Self {
            reader,
            token,
            account: None,
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletBalances> {
        self.shared.state.subscribe()
    }

    pub fn current(&self) -> WalletBalances {
        self.shared.state.borrow().clone()
    }

    /// Track a connected account; `None` (disconnected) resets the view.
    pub fn set_account(&mut self, account: Option<Address>) {
        self.account = account;
        self.refresh();
    }

    /// Re-read both balances. Safe to call concurrently with an automatic
    /// fetch; the superseded fetch is discarded on arrival.
    pub fn refresh(&self) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(account) = self.account else {
            self.shared
                .publish_if_current(generation, |state| *state = WalletBalances::default());
            return;
        };

        self.shared.publish_if_current(generation, |state| {
            state.is_loading = true;
        });

        let reader = Arc::clone(&self.reader);
        let token = self.token;
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            let (native, token_balance) = join!(
                reader.native_balance(account),
                read_token_balance(reader.as_ref(), token, account),
            );

            match native {
                Ok(raw) => {
                    shared.publish_if_current(generation, |state| {
                        state.native = format_ether(raw);
                        state.token = token_balance;
                        state.error = None;
                        state.is_loading = false;
                    });
                }
                Err(error) => {
                    warn!(%account, %error, "native balance read failed");
                    shared.publish_if_current(generation, |state| {
                        state.error = Some(BALANCES_ERROR.to_string());
                        state.is_loading = false;
                    });
                }
            }
        });
    }
}

/// Token-balance failures are cosmetic: coerce to the zero string rather
/// than surfacing an error.
async fn read_token_balance<B>(reader: &B, token: Address, account: Address) -> String
where
    B: BalanceReader + ?Sized,
{
    match reader.token_balance(token, account).await {
        Ok(raw) => format_units(raw, TOKEN_DECIMALS).unwrap_or_else(|_| "0".to_string()),
        Err(error) => {
            warn!(%token, %account, %error, "token balance read failed, defaulting to zero");
            "0".to_string()
        }
    }
}
