#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// # LampWallet — per-lamp custodial wallet
///
/// Every supported NFT owns a sub-account keyed `(collection, token_id)`
/// that can hold four asset classes at once: native currency, fungible
/// tokens, NFTs, and multi-tokens. The collection contract's `owner_of` is
/// the sole authority on who controls a sub-account — the wallet stores no
/// ownership of its own, so sub-accounts travel with their lamp.
///
/// Sub-accounts are created lazily on first deposit and never destroyed;
/// balances simply reach zero. An owner may time-lock a sub-account, which
/// freezes withdrawals and outbound transfers until the lock expires. Lock
/// end times only ever move forward.
///
/// Mutating entry points finish their ledger writes before any external
/// token call, and cross-contract calls are made with reentrancy denied,
/// so a failing leg reverts the whole operation.
#[ink::contract]
mod lamp_wallet {
    use ink::env::{
        call::{build_call, ExecutionInput, Selector},
        DefaultEnvironment,
    };
    use ink::prelude::vec::Vec;
    use ink::storage::Mapping;

    /// Sub-account key: the lamp that owns the funds.
    pub type SubAccount = (AccountId, u128);

    // =========================================================================
    // STORAGE TYPES
    // =========================================================================

    #[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum AssetClass {
        Native,
        Bep20,
        Erc721,
        Erc1155,
    }

    /// Everything a sub-account held, drained out of the ledger in one pass.
    struct SweptAssets {
        native: Balance,
        bep20: Vec<(AccountId, Balance)>,
        erc721: Vec<(AccountId, Vec<u128>)>,
        erc1155: Vec<(AccountId, u128, Balance)>,
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct LampWallet {
        supported: Mapping<AccountId, bool>,

        native_balances: Mapping<SubAccount, Balance>,

        bep20_tokens: Mapping<SubAccount, Vec<AccountId>>,
        bep20_balances: Mapping<(AccountId, u128, AccountId), Balance>,

        erc721_contracts: Mapping<SubAccount, Vec<AccountId>>,
        erc721_ids: Mapping<(AccountId, u128, AccountId), Vec<u128>>,

        erc1155_keys: Mapping<SubAccount, Vec<(AccountId, u128)>>,
        erc1155_balances: Mapping<(AccountId, u128, AccountId, u128), Balance>,

        /// 0 = unlocked.
        locks: Mapping<SubAccount, Timestamp>,

        owner: AccountId,
        pending_owner: Option<AccountId>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Deposited {
        #[ink(topic)]
        collection: AccountId,
        #[ink(topic)]
        token_id: u128,
        class: AssetClass,
        amount: Balance,
    }

    #[ink(event)]
    pub struct Withdrawn {
        #[ink(topic)]
        collection: AccountId,
        #[ink(topic)]
        token_id: u128,
        class: AssetClass,
        amount: Balance,
        to: AccountId,
    }

    #[ink(event)]
    pub struct SubAccountMove {
        #[ink(topic)]
        from_collection: AccountId,
        from_token_id: u128,
        #[ink(topic)]
        to_collection: AccountId,
        to_token_id: u128,
        class: AssetClass,
        amount: Balance,
    }

    #[ink(event)]
    pub struct WalletLocked {
        #[ink(topic)]
        collection: AccountId,
        #[ink(topic)]
        token_id: u128,
        lock_end: Timestamp,
    }

    #[ink(event)]
    pub struct CollectionSupported {
        #[ink(topic)]
        collection: AccountId,
    }

    #[ink(event)]
    pub struct OwnershipTransferAuthorized {
        #[ink(topic)]
        current_owner: AccountId,
        #[ink(topic)]
        authorized: AccountId,
    }

    #[ink(event)]
    pub struct OwnershipTransferred {
        #[ink(topic)]
        previous_owner: AccountId,
        #[ink(topic)]
        new_owner: AccountId,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        NotOwner,
        NotAuthorized,
        CollectionNotSupported,
        NotWalletOwner,
        Locked,
        SelfDeposit,
        SameWallet,
        ZeroAmount,
        LengthMismatch,
        InsufficientBalance,
        TokenNotFound,
        OwnershipLookupFailed,
        TransferFailed,
        MathOverflow,
    }

    pub type Result<T> = core::result::Result<T, Error>;

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl LampWallet {
        #[ink(constructor)]
        pub fn new() -> Self {
            Self {
                supported: Mapping::default(),
                native_balances: Mapping::default(),
                bep20_tokens: Mapping::default(),
                bep20_balances: Mapping::default(),
                erc721_contracts: Mapping::default(),
                erc721_ids: Mapping::default(),
                erc1155_keys: Mapping::default(),
                erc1155_balances: Mapping::default(),
                locks: Mapping::default(),
                owner: Self::env().caller(),
                pending_owner: None,
            }
        }

        // =================================================================
        // ADMINISTRATION
        // =================================================================

        #[ink(message)]
        pub fn support(&mut self, collection: AccountId) -> Result<()> {
            self.only_owner()?;
            self.supported.insert(collection, &true);
            self.env().emit_event(CollectionSupported { collection });
            Ok(())
        }

        #[ink(message)]
        pub fn is_supported(&self, collection: AccountId) -> bool {
            self.supported.get(collection).unwrap_or(false)
        }

        // =================================================================
        // DEPOSITS — open to anyone, gated only by collection support
        // =================================================================

        #[ink(message, payable)]
        pub fn deposit_native(&mut self, collection: AccountId, token_id: u128) -> Result<()> {
            self.ensure_supported(collection)?;
            let amount = self.env().transferred_value();
            if amount == 0 {
                return Err(Error::ZeroAmount);
            }
            self.credit_native((collection, token_id), amount)?;
            self.env().emit_event(Deposited {
                collection,
                token_id,
                class: AssetClass::Native,
                amount,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn deposit_bep20(
            &mut self,
            collection: AccountId,
            token_id: u128,
            tokens: Vec<AccountId>,
            amounts: Vec<Balance>,
        ) -> Result<()> {
            self.ensure_supported(collection)?;
            if tokens.len() != amounts.len() {
                return Err(Error::LengthMismatch);
            }
            let caller = self.env().caller();
            for (token, amount) in tokens.iter().zip(amounts.iter()) {
                if *amount == 0 {
                    return Err(Error::ZeroAmount);
                }
                self.pull_bep20(*token, caller, *amount)?;
                self.credit_bep20((collection, token_id), *token, *amount)?;
                self.env().emit_event(Deposited {
                    collection,
                    token_id,
                    class: AssetClass::Bep20,
                    amount: *amount,
                });
            }
            Ok(())
        }

        #[ink(message)]
        pub fn deposit_erc721(
            &mut self,
            collection: AccountId,
            token_id: u128,
            contract: AccountId,
            ids: Vec<u128>,
        ) -> Result<()> {
            self.ensure_supported(collection)?;
            // A lamp must never end up inside its own wallet.
            if contract == collection && ids.contains(&token_id) {
                return Err(Error::SelfDeposit);
            }
            let caller = self.env().caller();
            for id in &ids {
                self.pull_erc721(contract, caller, *id)?;
                self.add_erc721((collection, token_id), contract, *id);
            }
            self.env().emit_event(Deposited {
                collection,
                token_id,
                class: AssetClass::Erc721,
                amount: ids.len() as Balance,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn deposit_erc1155(
            &mut self,
            collection: AccountId,
            token_id: u128,
            contract: AccountId,
            ids: Vec<u128>,
            amounts: Vec<Balance>,
        ) -> Result<()> {
            self.ensure_supported(collection)?;
            if ids.len() != amounts.len() {
                return Err(Error::LengthMismatch);
            }
            let caller = self.env().caller();
            for (id, amount) in ids.iter().zip(amounts.iter()) {
                if *amount == 0 {
                    return Err(Error::ZeroAmount);
                }
                self.pull_erc1155(contract, caller, *id, *amount)?;
                self.credit_erc1155((collection, token_id), contract, *id, *amount)?;
                self.env().emit_event(Deposited {
                    collection,
                    token_id,
                    class: AssetClass::Erc1155,
                    amount: *amount,
                });
            }
            Ok(())
        }

        // =================================================================
        // WITHDRAWALS — wallet owner only, frozen while locked
        // =================================================================

        #[ink(message)]
        pub fn withdraw_native(
            &mut self,
            collection: AccountId,
            token_id: u128,
            amount: Balance,
        ) -> Result<()> {
            let caller = self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            self.debit_native((collection, token_id), amount)?;
            self.env()
                .transfer(caller, amount)
                .map_err(|_| Error::TransferFailed)?;
            self.env().emit_event(Withdrawn {
                collection,
                token_id,
                class: AssetClass::Native,
                amount,
                to: caller,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn withdraw_bep20(
            &mut self,
            collection: AccountId,
            token_id: u128,
            tokens: Vec<AccountId>,
            amounts: Vec<Balance>,
        ) -> Result<()> {
            let caller = self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            if tokens.len() != amounts.len() {
                return Err(Error::LengthMismatch);
            }
            // Ledger first, token pushes second.
            for (token, amount) in tokens.iter().zip(amounts.iter()) {
                self.debit_bep20((collection, token_id), *token, *amount)?;
            }
            for (token, amount) in tokens.iter().zip(amounts.iter()) {
                self.push_bep20(*token, caller, *amount)?;
                self.env().emit_event(Withdrawn {
                    collection,
                    token_id,
                    class: AssetClass::Bep20,
                    amount: *amount,
                    to: caller,
                });
            }
            Ok(())
        }

        #[ink(message)]
        pub fn withdraw_erc721(
            &mut self,
            collection: AccountId,
            token_id: u128,
            contract: AccountId,
            ids: Vec<u128>,
        ) -> Result<()> {
            let caller = self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            for id in &ids {
                self.remove_erc721((collection, token_id), contract, *id)?;
            }
            for id in &ids {
                self.push_erc721(contract, caller, *id)?;
            }
            self.env().emit_event(Withdrawn {
                collection,
                token_id,
                class: AssetClass::Erc721,
                amount: ids.len() as Balance,
                to: caller,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn withdraw_erc1155(
            &mut self,
            collection: AccountId,
            token_id: u128,
            contract: AccountId,
            ids: Vec<u128>,
            amounts: Vec<Balance>,
        ) -> Result<()> {
            let caller = self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            if ids.len() != amounts.len() {
                return Err(Error::LengthMismatch);
            }
            for (id, amount) in ids.iter().zip(amounts.iter()) {
                self.debit_erc1155((collection, token_id), contract, *id, *amount)?;
            }
            for (id, amount) in ids.iter().zip(amounts.iter()) {
                self.push_erc1155(contract, caller, *id, *amount)?;
                self.env().emit_event(Withdrawn {
                    collection,
                    token_id,
                    class: AssetClass::Erc1155,
                    amount: *amount,
                    to: caller,
                });
            }
            Ok(())
        }

        /// Drain every asset class of a sub-account to its owner in one
        /// atomic operation.
        #[ink(message)]
        pub fn withdraw_all(&mut self, collection: AccountId, token_id: u128) -> Result<()> {
            let caller = self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            let swept = self.collect_assets((collection, token_id));

            if swept.native > 0 {
                self.env()
                    .transfer(caller, swept.native)
                    .map_err(|_| Error::TransferFailed)?;
                self.env().emit_event(Withdrawn {
                    collection,
                    token_id,
                    class: AssetClass::Native,
                    amount: swept.native,
                    to: caller,
                });
            }
            for (token, amount) in &swept.bep20 {
                self.push_bep20(*token, caller, *amount)?;
            }
            for (contract, ids) in &swept.erc721 {
                for id in ids {
                    self.push_erc721(*contract, caller, *id)?;
                }
            }
            for (contract, id, amount) in &swept.erc1155 {
                self.push_erc1155(*contract, caller, *id, *amount)?;
            }
            Ok(())
        }

        // =================================================================
        // SUB-ACCOUNT TRANSFERS — pure ledger moves
        // =================================================================

        #[ink(message)]
        pub fn transfer_native(
            &mut self,
            collection: AccountId,
            token_id: u128,
            amount: Balance,
            to_collection: AccountId,
            to_token_id: u128,
        ) -> Result<()> {
            self.ensure_distinct(collection, token_id, to_collection, to_token_id)?;
            self.ensure_supported(to_collection)?;
            self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            self.debit_native((collection, token_id), amount)?;
            self.credit_native((to_collection, to_token_id), amount)?;
            self.env().emit_event(SubAccountMove {
                from_collection: collection,
                from_token_id: token_id,
                to_collection,
                to_token_id,
                class: AssetClass::Native,
                amount,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn transfer_bep20(
            &mut self,
            collection: AccountId,
            token_id: u128,
            token: AccountId,
            amount: Balance,
            to_collection: AccountId,
            to_token_id: u128,
        ) -> Result<()> {
            self.ensure_distinct(collection, token_id, to_collection, to_token_id)?;
            self.ensure_supported(to_collection)?;
            self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            self.debit_bep20((collection, token_id), token, amount)?;
            self.credit_bep20((to_collection, to_token_id), token, amount)?;
            self.env().emit_event(SubAccountMove {
                from_collection: collection,
                from_token_id: token_id,
                to_collection,
                to_token_id,
                class: AssetClass::Bep20,
                amount,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn transfer_erc721(
            &mut self,
            collection: AccountId,
            token_id: u128,
            contract: AccountId,
            ids: Vec<u128>,
            to_collection: AccountId,
            to_token_id: u128,
        ) -> Result<()> {
            self.ensure_distinct(collection, token_id, to_collection, to_token_id)?;
            self.ensure_supported(to_collection)?;
            self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            for id in &ids {
                self.remove_erc721((collection, token_id), contract, *id)?;
                self.add_erc721((to_collection, to_token_id), contract, *id);
            }
            self.env().emit_event(SubAccountMove {
                from_collection: collection,
                from_token_id: token_id,
                to_collection,
                to_token_id,
                class: AssetClass::Erc721,
                amount: ids.len() as Balance,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn transfer_erc1155(
            &mut self,
            collection: AccountId,
            token_id: u128,
            contract: AccountId,
            ids: Vec<u128>,
            amounts: Vec<Balance>,
            to_collection: AccountId,
            to_token_id: u128,
        ) -> Result<()> {
            self.ensure_distinct(collection, token_id, to_collection, to_token_id)?;
            self.ensure_supported(to_collection)?;
            if ids.len() != amounts.len() {
                return Err(Error::LengthMismatch);
            }
            self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            for (id, amount) in ids.iter().zip(amounts.iter()) {
                self.debit_erc1155((collection, token_id), contract, *id, *amount)?;
                self.credit_erc1155((to_collection, to_token_id), contract, *id, *amount)?;
                self.env().emit_event(SubAccountMove {
                    from_collection: collection,
                    from_token_id: token_id,
                    to_collection,
                    to_token_id,
                    class: AssetClass::Erc1155,
                    amount: *amount,
                });
            }
            Ok(())
        }

        /// Move every asset class to another sub-account in one atomic
        /// ledger operation.
        #[ink(message)]
        pub fn transfer_all(
            &mut self,
            collection: AccountId,
            token_id: u128,
            to_collection: AccountId,
            to_token_id: u128,
        ) -> Result<()> {
            self.ensure_distinct(collection, token_id, to_collection, to_token_id)?;
            self.ensure_supported(to_collection)?;
            self.ensure_wallet_owner(collection, token_id)?;
            self.ensure_unlocked((collection, token_id))?;
            self.move_all_assets((collection, token_id), (to_collection, to_token_id))
        }

        // =================================================================
        // LOCKING
        // =================================================================

        /// Freeze withdrawals and outbound transfers for `duration`
        /// milliseconds. Repeated calls can only push the end time forward;
        /// a shorter duration is a no-op.
        #[ink(message)]
        pub fn lock(&mut self, collection: AccountId, token_id: u128, duration: Timestamp) -> Result<()> {
            self.ensure_wallet_owner(collection, token_id)?;
            self.apply_lock((collection, token_id), duration)?;
            Ok(())
        }

        #[ink(message)]
        pub fn is_locked(&self, collection: AccountId, token_id: u128) -> (bool, Timestamp) {
            let lock_end = self.locks.get((collection, token_id)).unwrap_or(0);
            (lock_end > self.env().block_timestamp(), lock_end)
        }

        // =================================================================
        // VIEWS
        // =================================================================

        /// (native present, fungible token count, NFT count, multi-token
        /// position count).
        #[ink(message)]
        pub fn get_tokens_count(&self, collection: AccountId, token_id: u128) -> (u8, u32, u32, u32) {
            let key = (collection, token_id);
            let native = if self.native_balances.get(key).unwrap_or(0) > 0 {
                1
            } else {
                0
            };
            let bep20 = self.bep20_tokens.get(key).map(|t| t.len()).unwrap_or(0) as u32;
            let erc721 = self
                .erc721_contracts
                .get(key)
                .map(|contracts| {
                    contracts
                        .iter()
                        .map(|c| {
                            self.erc721_ids
                                .get((collection, token_id, *c))
                                .map(|ids| ids.len())
                                .unwrap_or(0)
                        })
                        .sum::<usize>()
                })
                .unwrap_or(0) as u32;
            let erc1155 = self.erc1155_keys.get(key).map(|k| k.len()).unwrap_or(0) as u32;
            (native, bep20, erc721, erc1155)
        }

        #[ink(message)]
        pub fn get_native(&self, collection: AccountId, token_id: u128) -> Balance {
            self.native_balances.get((collection, token_id)).unwrap_or(0)
        }

        #[ink(message)]
        pub fn get_bep20_tokens(
            &self,
            collection: AccountId,
            token_id: u128,
        ) -> (Vec<AccountId>, Vec<Balance>) {
            let tokens = self.bep20_tokens.get((collection, token_id)).unwrap_or_default();
            let balances = tokens
                .iter()
                .map(|t| {
                    self.bep20_balances
                        .get((collection, token_id, *t))
                        .unwrap_or(0)
                })
                .collect();
            (tokens, balances)
        }

        /// (NFT contracts held, total id count across them).
        #[ink(message)]
        pub fn get_erc721_tokens(
            &self,
            collection: AccountId,
            token_id: u128,
        ) -> (Vec<AccountId>, u32) {
            let contracts = self
                .erc721_contracts
                .get((collection, token_id))
                .unwrap_or_default();
            let count = contracts
                .iter()
                .map(|c| {
                    self.erc721_ids
                        .get((collection, token_id, *c))
                        .map(|ids| ids.len())
                        .unwrap_or(0)
                })
                .sum::<usize>() as u32;
            (contracts, count)
        }

        #[ink(message)]
        pub fn get_erc721_ids(
            &self,
            collection: AccountId,
            token_id: u128,
            contract: AccountId,
        ) -> Vec<u128> {
            self.erc721_ids
                .get((collection, token_id, contract))
                .unwrap_or_default()
        }

        #[ink(message)]
        pub fn get_erc1155_token_balances(
            &self,
            collection: AccountId,
            token_id: u128,
            contract: AccountId,
            ids: Vec<u128>,
        ) -> Vec<Balance> {
            ids.iter()
                .map(|id| {
                    self.erc1155_balances
                        .get((collection, token_id, contract, *id))
                        .unwrap_or(0)
                })
                .collect()
        }

        // =================================================================
        // OWNERSHIP
        // =================================================================

        #[ink(message)]
        pub fn owner(&self) -> AccountId {
            self.owner
        }

        #[ink(message)]
        pub fn authorize_ownership_transfer(&mut self, new_owner: AccountId) -> Result<()> {
            self.only_owner()?;
            self.pending_owner = Some(new_owner);
            self.env().emit_event(OwnershipTransferAuthorized {
                current_owner: self.owner,
                authorized: new_owner,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn assume_ownership(&mut self) -> Result<()> {
            let caller = self.env().caller();
            if self.pending_owner != Some(caller) {
                return Err(Error::NotAuthorized);
            }
            let previous = self.owner;
            self.owner = caller;
            self.pending_owner = None;
            self.env().emit_event(OwnershipTransferred {
                previous_owner: previous,
                new_owner: caller,
            });
            Ok(())
        }

        // =================================================================
        // LEDGER INTERNALS
        // =================================================================

        fn credit_native(&mut self, key: SubAccount, amount: Balance) -> Result<()> {
            let balance = self.native_balances.get(key).unwrap_or(0);
            let next = balance.checked_add(amount).ok_or(Error::MathOverflow)?;
            self.native_balances.insert(key, &next);
            Ok(())
        }

        fn debit_native(&mut self, key: SubAccount, amount: Balance) -> Result<()> {
            if amount == 0 {
                return Err(Error::ZeroAmount);
            }
            let balance = self.native_balances.get(key).unwrap_or(0);
            if balance < amount {
                return Err(Error::InsufficientBalance);
            }
            self.native_balances.insert(key, &(balance - amount));
            Ok(())
        }

        fn credit_bep20(&mut self, key: SubAccount, token: AccountId, amount: Balance) -> Result<()> {
            let balance_key = (key.0, key.1, token);
            let balance = self.bep20_balances.get(balance_key).unwrap_or(0);
            if balance == 0 {
                let mut tokens = self.bep20_tokens.get(key).unwrap_or_default();
                tokens.push(token);
                self.bep20_tokens.insert(key, &tokens);
            }
            let next = balance.checked_add(amount).ok_or(Error::MathOverflow)?;
            self.bep20_balances.insert(balance_key, &next);
            Ok(())
        }

        fn debit_bep20(&mut self, key: SubAccount, token: AccountId, amount: Balance) -> Result<()> {
            if amount == 0 {
                return Err(Error::ZeroAmount);
            }
            let balance_key = (key.0, key.1, token);
            let balance = self.bep20_balances.get(balance_key).unwrap_or(0);
            if balance < amount {
                return Err(Error::InsufficientBalance);
            }
            let next = balance - amount;
            self.bep20_balances.insert(balance_key, &next);
            if next == 0 {
                let mut tokens = self.bep20_tokens.get(key).unwrap_or_default();
                tokens.retain(|t| *t != token);
                self.bep20_tokens.insert(key, &tokens);
            }
            Ok(())
        }

        fn add_erc721(&mut self, key: SubAccount, contract: AccountId, id: u128) {
            let ids_key = (key.0, key.1, contract);
            let mut ids = self.erc721_ids.get(ids_key).unwrap_or_default();
            if ids.is_empty() {
                let mut contracts = self.erc721_contracts.get(key).unwrap_or_default();
                if !contracts.contains(&contract) {
                    contracts.push(contract);
                }
                self.erc721_contracts.insert(key, &contracts);
            }
            ids.push(id);
            self.erc721_ids.insert(ids_key, &ids);
        }

        fn remove_erc721(&mut self, key: SubAccount, contract: AccountId, id: u128) -> Result<()> {
            let ids_key = (key.0, key.1, contract);
            let mut ids = self.erc721_ids.get(ids_key).unwrap_or_default();
            let position = ids
                .iter()
                .position(|held| *held == id)
                .ok_or(Error::TokenNotFound)?;
            ids.swap_remove(position);
            self.erc721_ids.insert(ids_key, &ids);
            if ids.is_empty() {
                let mut contracts = self.erc721_contracts.get(key).unwrap_or_default();
                contracts.retain(|c| *c != contract);
                self.erc721_contracts.insert(key, &contracts);
            }
            Ok(())
        }

        fn credit_erc1155(
            &mut self,
            key: SubAccount,
            contract: AccountId,
            id: u128,
            amount: Balance,
        ) -> Result<()> {
            let balance_key = (key.0, key.1, contract, id);
            let balance = self.erc1155_balances.get(balance_key).unwrap_or(0);
            if balance == 0 {
                let mut keys = self.erc1155_keys.get(key).unwrap_or_default();
                keys.push((contract, id));
                self.erc1155_keys.insert(key, &keys);
            }
            let next = balance.checked_add(amount).ok_or(Error::MathOverflow)?;
            self.erc1155_balances.insert(balance_key, &next);
            Ok(())
        }

        fn debit_erc1155(
            &mut self,
            key: SubAccount,
            contract: AccountId,
            id: u128,
            amount: Balance,
        ) -> Result<()> {
            if amount == 0 {
                return Err(Error::ZeroAmount);
            }
            let balance_key = (key.0, key.1, contract, id);
            let balance = self.erc1155_balances.get(balance_key).unwrap_or(0);
            if balance < amount {
                return Err(Error::InsufficientBalance);
            }
            let next = balance - amount;
            self.erc1155_balances.insert(balance_key, &next);
            if next == 0 {
                let mut keys = self.erc1155_keys.get(key).unwrap_or_default();
                keys.retain(|held| *held != (contract, id));
                self.erc1155_keys.insert(key, &keys);
            }
            Ok(())
        }

        /// Drain the whole sub-account out of the ledger. The caller decides
        /// whether the swept assets are re-credited (transfer) or pushed out
        /// (withdrawal); either way the ledger is already consistent.
        fn collect_assets(&mut self, key: SubAccount) -> SweptAssets {
            let native = self.native_balances.get(key).unwrap_or(0);
            if native > 0 {
                self.native_balances.insert(key, &0);
            }

            let tokens = self.bep20_tokens.get(key).unwrap_or_default();
            let mut bep20 = Vec::new();
            for token in &tokens {
                let balance_key = (key.0, key.1, *token);
                let balance = self.bep20_balances.get(balance_key).unwrap_or(0);
                if balance > 0 {
                    self.bep20_balances.insert(balance_key, &0);
                    bep20.push((*token, balance));
                }
            }
            self.bep20_tokens.remove(key);

            let contracts = self.erc721_contracts.get(key).unwrap_or_default();
            let mut erc721 = Vec::new();
            for contract in &contracts {
                let ids_key = (key.0, key.1, *contract);
                let ids = self.erc721_ids.get(ids_key).unwrap_or_default();
                if !ids.is_empty() {
                    self.erc721_ids.remove(ids_key);
                    erc721.push((*contract, ids));
                }
            }
            self.erc721_contracts.remove(key);

            let keys = self.erc1155_keys.get(key).unwrap_or_default();
            let mut erc1155 = Vec::new();
            for (contract, id) in &keys {
                let balance_key = (key.0, key.1, *contract, *id);
                let balance = self.erc1155_balances.get(balance_key).unwrap_or(0);
                if balance > 0 {
                    self.erc1155_balances.insert(balance_key, &0);
                    erc1155.push((*contract, *id, balance));
                }
            }
            self.erc1155_keys.remove(key);

            SweptAssets {
                native,
                bep20,
                erc721,
                erc1155,
            }
        }

        fn move_all_assets(&mut self, from: SubAccount, to: SubAccount) -> Result<()> {
            let swept = self.collect_assets(from);
            if swept.native > 0 {
                self.credit_native(to, swept.native)?;
                self.env().emit_event(SubAccountMove {
                    from_collection: from.0,
                    from_token_id: from.1,
                    to_collection: to.0,
                    to_token_id: to.1,
                    class: AssetClass::Native,
                    amount: swept.native,
                });
            }
            for (token, amount) in &swept.bep20 {
                self.credit_bep20(to, *token, *amount)?;
            }
            for (contract, ids) in &swept.erc721 {
                for id in ids {
                    self.add_erc721(to, *contract, *id);
                }
            }
            for (contract, id, amount) in &swept.erc1155 {
                self.credit_erc1155(to, *contract, *id, *amount)?;
            }
            Ok(())
        }

        fn apply_lock(&mut self, key: SubAccount, duration: Timestamp) -> Result<()> {
            let now = self.env().block_timestamp();
            let lock_end = now.checked_add(duration).ok_or(Error::MathOverflow)?;
            let current = self.locks.get(key).unwrap_or(0);
            // Lock ends only ever move forward.
            if lock_end > current {
                self.locks.insert(key, &lock_end);
                self.env().emit_event(WalletLocked {
                    collection: key.0,
                    token_id: key.1,
                    lock_end,
                });
            }
            Ok(())
        }

        // =================================================================
        // GUARDS & CROSS-CONTRACT CALLS
        // =================================================================

        fn ensure_supported(&self, collection: AccountId) -> Result<()> {
            if !self.is_supported(collection) {
                return Err(Error::CollectionNotSupported);
            }
            Ok(())
        }

        fn ensure_distinct(
            &self,
            collection: AccountId,
            token_id: u128,
            to_collection: AccountId,
            to_token_id: u128,
        ) -> Result<()> {
            if collection == to_collection && token_id == to_token_id {
                return Err(Error::SameWallet);
            }
            Ok(())
        }

        fn ensure_unlocked(&self, key: SubAccount) -> Result<()> {
            let lock_end = self.locks.get(key).unwrap_or(0);
            if lock_end > self.env().block_timestamp() {
                return Err(Error::Locked);
            }
            Ok(())
        }

        /// The collection contract decides who owns the sub-account.
        fn ensure_wallet_owner(&self, collection: AccountId, token_id: u128) -> Result<AccountId> {
            let caller = self.env().caller();
            let holder = build_call::<DefaultEnvironment>()
                .call(collection)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("owner_of")))
                        .push_arg(token_id),
                )
                .returns::<Option<AccountId>>()
                .try_invoke()
                .map_err(|_| Error::OwnershipLookupFailed)?
                .map_err(|_| Error::OwnershipLookupFailed)?;
            if holder != Some(caller) {
                return Err(Error::NotWalletOwner);
            }
            Ok(caller)
        }

        fn pull_bep20(&self, token: AccountId, from: AccountId, amount: Balance) -> Result<()> {
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

        fn push_bep20(&self, token: AccountId, to: AccountId, amount: Balance) -> Result<()> {
            let outcome = build_call::<DefaultEnvironment>()
                .call(token)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer")))
                        .push_arg(to)
                        .push_arg(amount),
                )
                .returns::<Result<()>>()
                .try_invoke()
                .map_err(|_| Error::TransferFailed)?
                .map_err(|_| Error::TransferFailed)?;
            outcome.map_err(|_| Error::TransferFailed)
        }

        fn pull_erc721(&self, contract: AccountId, from: AccountId, id: u128) -> Result<()> {
            self.call_erc721_transfer(contract, from, self.env().account_id(), id)
        }

        fn push_erc721(&self, contract: AccountId, to: AccountId, id: u128) -> Result<()> {
            self.call_erc721_transfer(contract, self.env().account_id(), to, id)
        }

        fn call_erc721_transfer(
            &self,
            contract: AccountId,
            from: AccountId,
            to: AccountId,
            id: u128,
        ) -> Result<()> {
            let outcome = build_call::<DefaultEnvironment>()
                .call(contract)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer_from")))
                        .push_arg(from)
                        .push_arg(to)
                        .push_arg(id),
                )
                .returns::<Result<()>>()
                .try_invoke()
                .map_err(|_| Error::TransferFailed)?
                .map_err(|_| Error::TransferFailed)?;
            outcome.map_err(|_| Error::TransferFailed)
        }

        fn pull_erc1155(
            &self,
            contract: AccountId,
            from: AccountId,
            id: u128,
            amount: Balance,
        ) -> Result<()> {
            self.call_erc1155_transfer(contract, from, self.env().account_id(), id, amount)
        }

        fn push_erc1155(
            &self,
            contract: AccountId,
            to: AccountId,
            id: u128,
            amount: Balance,
        ) -> Result<()> {
            self.call_erc1155_transfer(contract, self.env().account_id(), to, id, amount)
        }

        fn call_erc1155_transfer(
            &self,
            contract: AccountId,
            from: AccountId,
            to: AccountId,
            id: u128,
            amount: Balance,
        ) -> Result<()> {
            let data: Vec<u8> = Vec::new();
            let outcome = build_call::<DefaultEnvironment>()
                .call(contract)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("safe_transfer_from")))
                        .push_arg(from)
                        .push_arg(to)
                        .push_arg(id)
                        .push_arg(amount)
                        .push_arg(data),
                )
                .returns::<Result<()>>()
                .try_invoke()
                .map_err(|_| Error::TransferFailed)?
                .map_err(|_| Error::TransferFailed)?;
            outcome.map_err(|_| Error::TransferFailed)
        }

        fn only_owner(&self) -> Result<()> {
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
        }
    }

    impl Default for LampWallet {
        fn default() -> Self {
            Self::new()
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
