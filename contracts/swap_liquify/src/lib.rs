#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// # SwapAndLiquify — fee-to-liquidity module
///
/// Receives the ALDN liquidity fee and turns it into pool depth: half of an
/// accumulated batch is swapped for native currency, then both halves are
/// paired into the AMM pool.
///
/// The AMM itself is an opaque backend satisfying [`LiquidityBackend`] —
/// swap and add-liquidity primitives behind a versioned interface. The
/// backend is chosen by configuration (`set_backend`), never by runtime
/// delegation, so swapping implementations is an owner call away.
#[ink::contract]
mod swap_liquify {
    use ink::env::{
        call::{build_call, ExecutionInput, Selector},
        DefaultEnvironment,
    };
    use ink::prelude::vec::Vec;

    /// Backend interface version spoken by this module.
    pub const BACKEND_INTERFACE_VERSION: u32 = 1;

    /// Router calls expire this many milliseconds after submission.
    pub const CALL_DEADLINE_MS: Timestamp = 300_000;

    // =========================================================================
    // CROSS-CONTRACT INTERFACE
    // =========================================================================

    /// Capability surface the configured AMM router must provide. Pricing
    /// is entirely the backend's business.
    #[ink::trait_definition]
    pub trait LiquidityBackend {
        #[ink(message)]
        fn interface_version(&self) -> u32;

        #[ink(message, payable)]
        fn add_liquidity_native(
            &mut self,
            token: AccountId,
            amount_token_desired: Balance,
            amount_token_min: Balance,
            amount_native_min: Balance,
            to: AccountId,
            deadline: Timestamp,
        ) -> (Balance, Balance, Balance);

        #[ink(message)]
        fn swap_exact_tokens_for_native(
            &mut self,
            amount_in: Balance,
            amount_out_min: Balance,
            path: Vec<AccountId>,
            to: AccountId,
            deadline: Timestamp,
        ) -> Vec<Balance>;
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct SwapLiquify {
        token: Option<AccountId>,
        router: Option<AccountId>,
        backend_version: u32,
        /// LP tokens credited by the backend.
        pair_balance: Balance,
        /// Lifetime token amount converted into liquidity.
        total_liquified: Balance,
        owner: AccountId,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct BackendConfigured {
        #[ink(topic)]
        token: AccountId,
        #[ink(topic)]
        router: AccountId,
        version: u32,
    }

    #[ink(event)]
    pub struct LiquidityInitialized {
        token_amount: Balance,
        native_amount: Balance,
        pair_tokens: Balance,
    }

    #[ink(event)]
    pub struct SwapAndLiquified {
        tokens_swapped: Balance,
        native_received: Balance,
        tokens_paired: Balance,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        NotOwner,
        NotInitialized,
        ZeroAmount,
        TransferFailed,
        SwapFailed,
        LiquidityFailed,
        MathOverflow,
    }

    pub type Result<T> = core::result::Result<T, Error>;

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl SwapLiquify {
        #[ink(constructor)]
        pub fn new() -> Self {
            Self {
                token: None,
                router: None,
                backend_version: 0,
                pair_balance: 0,
                total_liquified: 0,
                owner: Self::env().caller(),
            }
        }

        // =================================================================
        // CONFIGURATION
        // =================================================================

        /// Wire the fee token and the AMM backend.
        #[ink(message)]
        pub fn initialize(&mut self, token: AccountId, router: AccountId) -> Result<()> {
            self.only_owner()?;
            self.token = Some(token);
            self.router = Some(router);
            self.backend_version = BACKEND_INTERFACE_VERSION;
            self.env().emit_event(BackendConfigured {
                token,
                router,
                version: BACKEND_INTERFACE_VERSION,
            });
            Ok(())
        }

        /// Swap the backend for another implementation of the same
        /// capability interface.
        #[ink(message)]
        pub fn set_backend(&mut self, router: AccountId, version: u32) -> Result<()> {
            self.only_owner()?;
            let token = self.token.ok_or(Error::NotInitialized)?;
            self.router = Some(router);
            self.backend_version = version;
            self.env().emit_event(BackendConfigured {
                token,
                router,
                version,
            });
            Ok(())
        }

        // =================================================================
        // LIQUIDITY OPERATIONS
        // =================================================================

        /// Seed the pool: pull `token_amount` from the caller and pair it
        /// with the attached native value.
        #[ink(message, payable)]
        pub fn initialize_liquidity(&mut self, token_amount: Balance) -> Result<()> {
            self.only_owner()?;
            let token = self.token.ok_or(Error::NotInitialized)?;
            let router = self.router.ok_or(Error::NotInitialized)?;
            let native_amount = self.env().transferred_value();
            if token_amount == 0 || native_amount == 0 {
                return Err(Error::ZeroAmount);
            }

            self.pull_token(token, self.env().caller(), token_amount)?;
            self.approve_token(token, router, token_amount)?;
            let (_, _, pair_tokens) =
                self.add_liquidity(router, token, token_amount, native_amount)?;

            self.pair_balance = self
                .pair_balance
                .checked_add(pair_tokens)
                .ok_or(Error::MathOverflow)?;
            self.total_liquified = self
                .total_liquified
                .checked_add(token_amount)
                .ok_or(Error::MathOverflow)?;

            self.env().emit_event(LiquidityInitialized {
                token_amount,
                native_amount,
                pair_tokens,
            });
            Ok(())
        }

        /// Convert `token_amount` of accumulated fee tokens into pool depth:
        /// swap half for native, pair the rest.
        #[ink(message)]
        pub fn swap_and_liquify(&mut self, token_amount: Balance) -> Result<()> {
            let token = self.token.ok_or(Error::NotInitialized)?;
            let router = self.router.ok_or(Error::NotInitialized)?;
            if token_amount == 0 {
                return Err(Error::ZeroAmount);
            }

            let half = token_amount / 2;
            let other_half = token_amount - half;

            self.approve_token(token, router, token_amount)?;
            let native_received = self.swap_tokens_for_native(router, token, half)?;
            let (_, _, pair_tokens) =
                self.add_liquidity(router, token, other_half, native_received)?;

            self.pair_balance = self
                .pair_balance
                .checked_add(pair_tokens)
                .ok_or(Error::MathOverflow)?;
            self.total_liquified = self
                .total_liquified
                .checked_add(token_amount)
                .ok_or(Error::MathOverflow)?;

            self.env().emit_event(SwapAndLiquified {
                tokens_swapped: half,
                native_received,
                tokens_paired: other_half,
            });
            Ok(())
        }

        // =================================================================
        // VIEWS
        // =================================================================

        #[ink(message)]
        pub fn token_address(&self) -> Option<AccountId> {
            self.token
        }

        #[ink(message)]
        pub fn router_address(&self) -> Option<AccountId> {
            self.router
        }

        #[ink(message)]
        pub fn backend_version(&self) -> u32 {
            self.backend_version
        }

        #[ink(message)]
        pub fn get_pair_balance(&self) -> Balance {
            self.pair_balance
        }

        #[ink(message)]
        pub fn total_liquified(&self) -> Balance {
            self.total_liquified
        }

        #[ink(message)]
        pub fn owner(&self) -> AccountId {
            self.owner
        }

        // =================================================================
        // BACKEND CALLS
        // =================================================================

        fn pull_token(&self, token: AccountId, from: AccountId, amount: Balance) -> Result<()> {
            let outcome = build_call::<DefaultEnvironment>()
                .call(token)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer_from")))
                        .push_arg(from)
                        .push_arg(self.env().account_id())
                        .push_arg(amount),
                )
                .returns::<Result<()>>()
                .try_invoke()
                .map_err(|_| Error::TransferFailed)?
                .map_err(|_| Error::TransferFailed)?;
            outcome.map_err(|_| Error::TransferFailed)
        }

        fn approve_token(&self, token: AccountId, spender: AccountId, amount: Balance) -> Result<()> {
            let outcome = build_call::<DefaultEnvironment>()
                .call(token)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("approve")))
                        .push_arg(spender)
                        .push_arg(amount),
                )
                .returns::<Result<()>>()
                .try_invoke()
                .map_err(|_| Error::TransferFailed)?
                .map_err(|_| Error::TransferFailed)?;
            outcome.map_err(|_| Error::TransferFailed)
        }

        fn add_liquidity(
            &self,
            router: AccountId,
            token: AccountId,
            token_amount: Balance,
            native_amount: Balance,
        ) -> Result<(Balance, Balance, Balance)> {
            let deadline = self.env().block_timestamp() + CALL_DEADLINE_MS;
            build_call::<DefaultEnvironment>()
                .call(router)
                .transferred_value(native_amount)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!(
                        "add_liquidity_native"
                    )))
                    .push_arg(token)
                    .push_arg(token_amount)
                    .push_arg(0u128) // amount_token_min: backend prices the pair
                    .push_arg(0u128) // amount_native_min
                    .push_arg(self.env().account_id())
                    .push_arg(deadline),
                )
                .returns::<(Balance, Balance, Balance)>()
                .try_invoke()
                .map_err(|_| Error::LiquidityFailed)?
                .map_err(|_| Error::LiquidityFailed)
        }

        fn swap_tokens_for_native(
            &self,
            router: AccountId,
            token: AccountId,
            amount_in: Balance,
        ) -> Result<Balance> {
            let deadline = self.env().block_timestamp() + CALL_DEADLINE_MS;
            let path = Vec::from([token]);
            let amounts = build_call::<DefaultEnvironment>()
                .call(router)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!(
                        "swap_exact_tokens_for_native"
                    )))
                    .push_arg(amount_in)
                    .push_arg(0u128) // amount_out_min
                    .push_arg(path)
                    .push_arg(self.env().account_id())
                    .push_arg(deadline),
                )
                .returns::<Vec<Balance>>()
                .try_invoke()
                .map_err(|_| Error::SwapFailed)?
                .map_err(|_| Error::SwapFailed)?;
            amounts.last().copied().ok_or(Error::SwapFailed)
        }

        fn only_owner(&self) -> Result<()> {
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
        }
    }

    impl Default for SwapLiquify {
        fn default() -> Self {
            Self::new()
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

    #[cfg(test)]
    mod tests {
        use super::*;
        use ink::env::{test, DefaultEnvironment};

        type Env = DefaultEnvironment;

        fn accounts() -> test::DefaultAccounts<Env> {
            test::default_accounts::<Env>()
        }

        fn set_caller(a: AccountId) {
            test::set_caller::<Env>(a);
        }

        fn deploy() -> SwapLiquify {
            set_caller(accounts().alice);
            SwapLiquify::new()
        }

        #[ink::test]
        fn starts_unconfigured() {
            let swap = deploy();
            assert_eq!(swap.token_address(), None);
            assert_eq!(swap.router_address(), None);
            assert_eq!(swap.backend_version(), 0);
            assert_eq!(swap.get_pair_balance(), 0);
        }

        #[ink::test]
        fn initialize_wires_token_and_backend() {
            let mut swap = deploy();
            let accs = accounts();
            swap.initialize(accs.bob, accs.charlie).unwrap();
            assert_eq!(swap.token_address(), Some(accs.bob));
            assert_eq!(swap.router_address(), Some(accs.charlie));
            assert_eq!(swap.backend_version(), BACKEND_INTERFACE_VERSION);
        }

        #[ink::test]
        fn initialize_is_owner_only() {
            let mut swap = deploy();
            let accs = accounts();
            set_caller(accs.bob);
            assert_eq!(swap.initialize(accs.bob, accs.charlie), Err(Error::NotOwner));
        }

        #[ink::test]
        fn set_backend_requires_initialization() {
            let mut swap = deploy();
            let accs = accounts();
            assert_eq!(
                swap.set_backend(accs.django, 2),
                Err(Error::NotInitialized)
            );

            swap.initialize(accs.bob, accs.charlie).unwrap();
            swap.set_backend(accs.django, 2).unwrap();
            assert_eq!(swap.router_address(), Some(accs.django));
            assert_eq!(swap.backend_version(), 2);
            // The token binding survives backend swaps.
            assert_eq!(swap.token_address(), Some(accs.bob));
        }

        #[ink::test]
        fn liquify_rejects_zero_amount() {
            let mut swap = deploy();
            let accs = accounts();
            swap.initialize(accs.bob, accs.charlie).unwrap();
            assert_eq!(swap.swap_and_liquify(0), Err(Error::ZeroAmount));
        }

        #[ink::test]
        fn liquify_requires_configuration() {
            let mut swap = deploy();
            assert_eq!(swap.swap_and_liquify(1_000), Err(Error::NotInitialized));
        }
    }
}
