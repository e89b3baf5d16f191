#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// # MagicLamps — the lamp collection
///
/// Sequentially-numbered NFT collection sold in fixed price tiers, with
/// referral bookkeeping, an on-chain name registry, and proceeds split
/// across three fund wallets. Reward accrual for lamp holders lives in the
/// Genie token contract; this contract only answers ownership queries.
///
/// ```text
/// PRICE TIERS (native units, by current supply):
///   [     0,  1 200)   0.1
///   [ 1 200,  3 200)   0.2
///   [ 3 200,  6 200)   0.5
///   [ 6 200,  9 200)   1
///   [ 9 200, 11 200)   2
///   [11 200, 11 400)   5
///   [11 400, 11 450)  10
///    11 450           100      (the final lamp)
/// ```
#[ink::contract]
mod magic_lamps {
    use ink::env::{
        call::{build_call, ExecutionInput, Selector},
        DefaultEnvironment,
    };
    use ink::prelude::string::String;
    use ink::storage::Mapping;

    // =========================================================================
    // CONSTANTS
    // =========================================================================

    /// Sale opens at this environment timestamp (milliseconds).
    pub const SALE_START_TIMESTAMP: Timestamp = 1_623_751_121_000;

    /// Metadata reveal: 21 days after the sale opens.
    pub const REVEAL_TIMESTAMP: Timestamp = SALE_START_TIMESTAMP + 21 * 86_400_000;

    /// Hard cap on minted lamps.
    pub const MAX_MAGICLAMP_SUPPLY: u32 = 11_451;

    /// Referral reward, BPS of the mint payment, granted to each side.
    pub const REFERRAL_REWARD_PERCENT: u128 = 1_000;

    /// Denominator for all basis-point calculations.
    pub const BPS_DENOMINATOR: u128 = 10_000;

    /// Largest batch one purchase may mint.
    pub const MAX_PURCHASE_QUANTITY: u32 = 50;

    /// Longest accepted lamp name.
    pub const MAX_NAME_LENGTH: usize = 25;

    /// One native token in base units.
    pub const ONE_NATIVE: Balance = 1_000_000_000_000_000_000;

    /// Tier price for the lamp that would be minted at `id`.
    fn price_for_id(id: u32) -> Balance {
        match id {
            0..=1_199 => ONE_NATIVE / 10,
            1_200..=3_199 => ONE_NATIVE / 5,
            3_200..=6_199 => ONE_NATIVE / 2,
            6_200..=9_199 => ONE_NATIVE,
            9_200..=11_199 => 2 * ONE_NATIVE,
            11_200..=11_399 => 5 * ONE_NATIVE,
            11_400..=11_449 => 10 * ONE_NATIVE,
            _ => 100 * ONE_NATIVE,
        }
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct MagicLamps {
        // ── Collection ────────────────────────────────────────────────────
        collection_name: String,
        collection_symbol: String,
        base_uri: String,
        total_supply: u32,
        owners: Mapping<u128, AccountId>,
        balances: Mapping<AccountId, u32>,
        token_approvals: Mapping<u128, AccountId>,
        operator_approvals: Mapping<(AccountId, AccountId), bool>,

        // ── Collaborators ─────────────────────────────────────────────────
        aladdin_token: AccountId,
        genie_token: AccountId,
        lamp_wallet: Option<AccountId>,

        // ── Referrals ─────────────────────────────────────────────────────
        referral_rewards: Mapping<AccountId, Balance>,
        referral_status: Mapping<(AccountId, AccountId), bool>,
        total_referral_rewards: Balance,

        // ── Name registry ─────────────────────────────────────────────────
        names: Mapping<u128, String>,
        reserved_names: Mapping<String, bool>,

        // ── Funds & access control ────────────────────────────────────────
        liquidity_fund: AccountId,
        prize_fund: AccountId,
        treasury_fund: AccountId,
        owner: AccountId,
        pending_owner: Option<AccountId>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Transfer {
        #[ink(topic)]
        from: Option<AccountId>,
        #[ink(topic)]
        to: Option<AccountId>,
        #[ink(topic)]
        token_id: u128,
    }

    #[ink(event)]
    pub struct Approval {
        #[ink(topic)]
        owner: AccountId,
        #[ink(topic)]
        approved: AccountId,
        token_id: u128,
    }

    #[ink(event)]
    pub struct ApprovalForAll {
        #[ink(topic)]
        owner: AccountId,
        #[ink(topic)]
        operator: AccountId,
        approved: bool,
    }

    #[ink(event)]
    pub struct MagicLampMinted {
        #[ink(topic)]
        minter: AccountId,
        first_id: u128,
        quantity: u32,
        payment: Balance,
        referrer: Option<AccountId>,
    }

    #[ink(event)]
    pub struct ReferralRewardAccrued {
        #[ink(topic)]
        referrer: AccountId,
        #[ink(topic)]
        minter: AccountId,
        amount_each: Balance,
    }

    #[ink(event)]
    pub struct ReferralRewardsDistributed {
        #[ink(topic)]
        token_id: u128,
        #[ink(topic)]
        holder: AccountId,
        amount: Balance,
    }

    #[ink(event)]
    pub struct NameChanged {
        #[ink(topic)]
        token_id: u128,
        new_name: String,
    }

    #[ink(event)]
    pub struct FundWithdrawn {
        liquidity: Balance,
        prize: Balance,
        treasury: Balance,
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
        SaleNotStarted,
        InvalidQuantity,
        SupplyExceeded,
        IncorrectPayment,
        TokenNotFound,
        NotTokenOwner,
        NotApproved,
        InvalidName,
        NameAlreadyReserved,
        WalletNotConfigured,
        InsufficientFunds,
        TransferFailed,
        DepositFailed,
        MathOverflow,
    }

    pub type Result<T> = core::result::Result<T, Error>;

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl MagicLamps {
        #[ink(constructor)]
        pub fn new(
            name: String,
            symbol: String,
            aladdin_token: AccountId,
            genie_token: AccountId,
        ) -> Self {
            let caller = Self::env().caller();
            Self {
                collection_name: name,
                collection_symbol: symbol,
                base_uri: String::new(),
                total_supply: 0,
                owners: Mapping::default(),
                balances: Mapping::default(),
                token_approvals: Mapping::default(),
                operator_approvals: Mapping::default(),
                aladdin_token,
                genie_token,
                lamp_wallet: None,
                referral_rewards: Mapping::default(),
                referral_status: Mapping::default(),
                total_referral_rewards: 0,
                names: Mapping::default(),
                reserved_names: Mapping::default(),
                liquidity_fund: caller,
                prize_fund: caller,
                treasury_fund: caller,
                owner: caller,
                pending_owner: None,
            }
        }

        // =================================================================
        // MINTING
        // =================================================================

        /// Exact payment required to mint `quantity` lamps right now,
        /// tier crossings included.
        #[ink(message)]
        pub fn estimate_magiclamp_purchase_amount(&self, quantity: u32) -> Result<Balance> {
            if quantity == 0 || quantity > MAX_PURCHASE_QUANTITY {
                return Err(Error::InvalidQuantity);
            }
            if self.total_supply + quantity > MAX_MAGICLAMP_SUPPLY {
                return Err(Error::SupplyExceeded);
            }
            let mut total: Balance = 0;
            for offset in 0..quantity {
                total = total
                    .checked_add(price_for_id(self.total_supply + offset))
                    .ok_or(Error::MathOverflow)?;
            }
            Ok(total)
        }

        /// Mint `quantity` lamps to the caller against exact payment.
        /// A fresh (referrer, minter) pair earns both sides 10% of the
        /// payment in pending referral rewards.
        #[ink(message, payable)]
        pub fn mint_magiclamp(&mut self, quantity: u32, referrer: Option<AccountId>) -> Result<()> {
            let caller = self.env().caller();
            if self.env().block_timestamp() < SALE_START_TIMESTAMP {
                return Err(Error::SaleNotStarted);
            }
            let price = self.estimate_magiclamp_purchase_amount(quantity)?;
            let payment = self.env().transferred_value();
            if payment != price {
                return Err(Error::IncorrectPayment);
            }

            let first_id = self.total_supply;
            for offset in 0..quantity {
                let token_id = (first_id + offset) as u128;
                self.owners.insert(token_id, &caller);
                self.env().emit_event(Transfer {
                    from: None,
                    to: Some(caller),
                    token_id,
                });
            }
            self.total_supply += quantity;
            let balance = self.balances.get(caller).unwrap_or(0);
            self.balances.insert(caller, &(balance + quantity));

            if let Some(referrer) = referrer {
                self.accrue_referral(referrer, caller, payment)?;
            }

            self.env().emit_event(MagicLampMinted {
                minter: caller,
                first_id: first_id as u128,
                quantity,
                payment,
                referrer,
            });
            Ok(())
        }

        // =================================================================
        // REFERRALS & FUNDS
        // =================================================================

        #[ink(message)]
        pub fn referral_rewards(&self, account: AccountId) -> Balance {
            self.referral_rewards.get(account).unwrap_or(0)
        }

        #[ink(message)]
        pub fn referral_status(&self, referrer: AccountId, minter: AccountId) -> bool {
            self.referral_status.get((referrer, minter)).unwrap_or(false)
        }

        #[ink(message)]
        pub fn total_referral_reward_amount(&self) -> Balance {
            self.total_referral_rewards
        }

        /// Push each lamp holder's pending referral rewards into that lamp's
        /// wallet sub-account, for lamp ids in `[from_id, to_id)`.
        #[ink(message)]
        pub fn distribute_referral_rewards(&mut self, from_id: u128, to_id: u128) -> Result<()> {
            self.only_owner()?;
            let wallet = self.lamp_wallet.ok_or(Error::WalletNotConfigured)?;
            let mut token_id = from_id;
            while token_id < to_id {
                if let Some(holder) = self.owners.get(token_id) {
                    let pending = self.referral_rewards.get(holder).unwrap_or(0);
                    if pending > 0 {
                        // Ledger first, wallet call second.
                        self.referral_rewards.insert(holder, &0);
                        self.total_referral_rewards -= pending;
                        self.deposit_to_wallet(wallet, token_id, pending)?;
                        self.env().emit_event(ReferralRewardsDistributed {
                            token_id,
                            holder,
                            amount: pending,
                        });
                    }
                }
                token_id += 1;
            }
            Ok(())
        }

        /// Split undistributed sale proceeds 10% / 10% / 80% across the
        /// liquidity, prize and treasury funds. Pending referral rewards
        /// stay behind — they are owed to referrers, not the funds.
        #[ink(message)]
        pub fn withdraw_fund(&mut self) -> Result<()> {
            self.only_owner()?;
            let distributable = self
                .env()
                .balance()
                .checked_sub(self.total_referral_rewards)
                .ok_or(Error::InsufficientFunds)?;
            if distributable == 0 {
                return Err(Error::InsufficientFunds);
            }
            let liquidity = distributable / 10;
            let prize = distributable / 10;
            let treasury = distributable - liquidity - prize;

            self.env()
                .transfer(self.liquidity_fund, liquidity)
                .map_err(|_| Error::TransferFailed)?;
            self.env()
                .transfer(self.prize_fund, prize)
                .map_err(|_| Error::TransferFailed)?;
            self.env()
                .transfer(self.treasury_fund, treasury)
                .map_err(|_| Error::TransferFailed)?;

            self.env().emit_event(FundWithdrawn {
                liquidity,
                prize,
                treasury,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn liquidity_fund_address(&self) -> AccountId {
            self.liquidity_fund
        }

        #[ink(message)]
        pub fn prize_fund_address(&self) -> AccountId {
            self.prize_fund
        }

        #[ink(message)]
        pub fn treasury_fund_address(&self) -> AccountId {
            self.treasury_fund
        }

        #[ink(message)]
        pub fn set_fund_addresses(
            &mut self,
            liquidity: AccountId,
            prize: AccountId,
            treasury: AccountId,
        ) -> Result<()> {
            self.only_owner()?;
            self.liquidity_fund = liquidity;
            self.prize_fund = prize;
            self.treasury_fund = treasury;
            Ok(())
        }

        #[ink(message)]
        pub fn init_lamp_wallet_address(&mut self, wallet: AccountId) -> Result<()> {
            self.only_owner()?;
            self.lamp_wallet = Some(wallet);
            Ok(())
        }

        // =================================================================
        // NAME REGISTRY
        // =================================================================

        /// Rename a lamp. Names are unique case-insensitively; the previous
        /// name returns to the open pool.
        #[ink(message)]
        pub fn change_name(&mut self, token_id: u128, new_name: String) -> Result<()> {
            let caller = self.env().caller();
            let holder = self.owners.get(token_id).ok_or(Error::TokenNotFound)?;
            if holder != caller {
                return Err(Error::NotTokenOwner);
            }
            if !is_valid_name(&new_name) {
                return Err(Error::InvalidName);
            }
            let lower = lowercase(&new_name);
            if self.reserved_names.get(&lower).unwrap_or(false) {
                return Err(Error::NameAlreadyReserved);
            }
            if let Some(old) = self.names.get(token_id) {
                self.reserved_names.remove(lowercase(&old));
            }
            self.names.insert(token_id, &new_name);
            self.reserved_names.insert(lower, &true);
            self.env().emit_event(NameChanged { token_id, new_name });
            Ok(())
        }

        #[ink(message)]
        pub fn validate_name(&self, name: String) -> bool {
            is_valid_name(&name)
        }

        #[ink(message)]
        pub fn to_lower(&self, name: String) -> String {
            lowercase(&name)
        }

        #[ink(message)]
        pub fn is_name_reserved(&self, name: String) -> bool {
            self.reserved_names.get(lowercase(&name)).unwrap_or(false)
        }

        #[ink(message)]
        pub fn token_name_by_index(&self, token_id: u128) -> String {
            self.names.get(token_id).unwrap_or_default()
        }

        // =================================================================
        // ERC721 SURFACE
        // =================================================================

        #[ink(message)]
        pub fn name(&self) -> String {
            self.collection_name.clone()
        }

        #[ink(message)]
        pub fn symbol(&self) -> String {
            self.collection_symbol.clone()
        }

        #[ink(message)]
        pub fn total_supply(&self) -> u32 {
            self.total_supply
        }

        #[ink(message)]
        pub fn balance_of(&self, account: AccountId) -> u32 {
            self.balances.get(account).unwrap_or(0)
        }

        #[ink(message)]
        pub fn owner_of(&self, token_id: u128) -> Option<AccountId> {
            self.owners.get(token_id)
        }

        /// Lamps are numbered sequentially, so the index is the id.
        #[ink(message)]
        pub fn token_by_index(&self, index: u128) -> Result<u128> {
            if index >= self.total_supply as u128 {
                return Err(Error::TokenNotFound);
            }
            Ok(index)
        }

        #[ink(message)]
        pub fn token_uri(&self, token_id: u128) -> Result<String> {
            use core::fmt::Write;
            if self.owners.get(token_id).is_none() {
                return Err(Error::TokenNotFound);
            }
            let mut uri = self.base_uri.clone();
            let _ = write!(uri, "{}", token_id);
            Ok(uri)
        }

        #[ink(message)]
        pub fn set_base_uri(&mut self, base_uri: String) -> Result<()> {
            self.only_owner()?;
            self.base_uri = base_uri;
            Ok(())
        }

        #[ink(message)]
        pub fn approve(&mut self, to: AccountId, token_id: u128) -> Result<()> {
            let caller = self.env().caller();
            let holder = self.owners.get(token_id).ok_or(Error::TokenNotFound)?;
            if caller != holder && !self.is_approved_for_all(holder, caller) {
                return Err(Error::NotApproved);
            }
            self.token_approvals.insert(token_id, &to);
            self.env().emit_event(Approval {
                owner: holder,
                approved: to,
                token_id,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn get_approved(&self, token_id: u128) -> Option<AccountId> {
            self.token_approvals.get(token_id)
        }

        #[ink(message)]
        pub fn set_approval_for_all(&mut self, operator: AccountId, approved: bool) -> Result<()> {
            let caller = self.env().caller();
            self.operator_approvals.insert((caller, operator), &approved);
            self.env().emit_event(ApprovalForAll {
                owner: caller,
                operator,
                approved,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn is_approved_for_all(&self, account: AccountId, operator: AccountId) -> bool {
            self.operator_approvals
                .get((account, operator))
                .unwrap_or(false)
        }

        #[ink(message)]
        pub fn transfer_from(
            &mut self,
            from: AccountId,
            to: AccountId,
            token_id: u128,
        ) -> Result<()> {
            let caller = self.env().caller();
            let holder = self.owners.get(token_id).ok_or(Error::TokenNotFound)?;
            if holder != from {
                return Err(Error::NotTokenOwner);
            }
            let approved = self.token_approvals.get(token_id) == Some(caller);
            if caller != holder && !approved && !self.is_approved_for_all(holder, caller) {
                return Err(Error::NotApproved);
            }
            self.token_approvals.remove(token_id);
            self.owners.insert(token_id, &to);
            let from_balance = self.balances.get(from).unwrap_or(0);
            self.balances.insert(from, &from_balance.saturating_sub(1));
            let to_balance = self.balances.get(to).unwrap_or(0);
            self.balances.insert(to, &(to_balance + 1));
            self.env().emit_event(Transfer {
                from: Some(from),
                to: Some(to),
                token_id,
            });
            Ok(())
        }

        // =================================================================
        // VIEWS & OWNERSHIP
        // =================================================================

        #[ink(message)]
        pub fn aladdin_token(&self) -> AccountId {
            self.aladdin_token
        }

        #[ink(message)]
        pub fn genie_token(&self) -> AccountId {
            self.genie_token
        }

        #[ink(message)]
        pub fn sale_start_timestamp(&self) -> Timestamp {
            SALE_START_TIMESTAMP
        }

        #[ink(message)]
        pub fn reveal_timestamp(&self) -> Timestamp {
            REVEAL_TIMESTAMP
        }

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
        // INTERNALS
        // =================================================================

        fn accrue_referral(
            &mut self,
            referrer: AccountId,
            minter: AccountId,
            payment: Balance,
        ) -> Result<()> {
            if referrer == minter {
                return Ok(());
            }
            // Each (referrer, minter) pair counts once.
            if self.referral_status.get((referrer, minter)).unwrap_or(false) {
                return Ok(());
            }
            let reward = payment
                .checked_mul(REFERRAL_REWARD_PERCENT)
                .ok_or(Error::MathOverflow)?
                / BPS_DENOMINATOR;
            if reward == 0 {
                return Ok(());
            }
            let referrer_pending = self.referral_rewards.get(referrer).unwrap_or(0);
            self.referral_rewards.insert(referrer, &(referrer_pending + reward));
            let minter_pending = self.referral_rewards.get(minter).unwrap_or(0);
            self.referral_rewards.insert(minter, &(minter_pending + reward));
            self.total_referral_rewards = self
                .total_referral_rewards
                .checked_add(2 * reward)
                .ok_or(Error::MathOverflow)?;
            self.referral_status.insert((referrer, minter), &true);
            self.env().emit_event(ReferralRewardAccrued {
                referrer,
                minter,
                amount_each: reward,
            });
            Ok(())
        }

        fn deposit_to_wallet(&self, wallet: AccountId, token_id: u128, amount: Balance) -> Result<()> {
            build_call::<DefaultEnvironment>()
                .call(wallet)
                .transferred_value(amount)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("deposit_native")))
                        .push_arg(self.env().account_id())
                        .push_arg(token_id),
                )
                .returns::<()>()
                .try_invoke()
                .map_err(|_| Error::DepositFailed)?
                .map_err(|_| Error::DepositFailed)?;
            Ok(())
        }

        fn only_owner(&self) -> Result<()> {
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
        }
    }

    /// 1–25 ASCII alphanumerics and single interior spaces.
    fn is_valid_name(name: &str) -> bool {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME_LENGTH {
            return false;
        }
        if bytes[0] == b' ' || bytes[bytes.len() - 1] == b' ' {
            return false;
        }
        let mut previous = 0u8;
        for &byte in bytes {
            if !byte.is_ascii_alphanumeric() && byte != b' ' {
                return false;
            }
            if byte == b' ' && previous == b' ' {
                return false;
            }
            previous = byte;
        }
        true
    }

    fn lowercase(name: &str) -> String {
        name.chars().map(|c| c.to_ascii_lowercase()).collect()
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
