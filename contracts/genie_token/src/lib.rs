#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// # GNI — Genie reward token
///
/// Mintable fungible token whose supply grows only through NFT reward
/// claims. Each supported collection carries a linear emission schedule;
/// every token id in that collection accrues rewards against it:
///
/// ```text
/// t1 = max(last_claim[id], start)        t2 = min(now, end)
/// accrued = days(t2 − t1) × per_day      (integer days)
///         + initial_allotment            (first claim only)
/// paid only when accrued ≥ min_claim_floor
/// ```
///
/// Claims are idempotent within a block: the claim stamps
/// `last_claim = now`, so a second claim at the same timestamp accrues
/// nothing. The collection contract is the source of truth for token
/// ownership; minting happens only after every ownership check passes.
#[ink::contract]
mod genie_token {
    use ink::env::{
        call::{build_call, ExecutionInput, Selector},
        DefaultEnvironment,
    };
    use ink::prelude::string::String;
    use ink::prelude::vec::Vec;
    use ink::storage::Mapping;

    /// One emission day, in the environment's millisecond timestamps.
    pub const MS_PER_DAY: Timestamp = 86_400_000;

    /// Token decimals.
    pub const DECIMALS: u8 = 18;

    // =========================================================================
    // STORAGE TYPES
    // =========================================================================

    /// Per-collection linear emission policy. Overwritten, never appended.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(
        feature = "std",
        derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
    )]
    pub struct EmissionSchedule {
        pub active: bool,
        pub start_time: Timestamp,
        pub end_time: Timestamp,
        pub initial_allotment: Balance,
        pub emission_per_day: Balance,
        /// Accruals below this are reported as zero — a claim that small
        /// would cost more than it pays out.
        pub min_claim_floor: Balance,
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct GenieToken {
        token_name: String,
        token_symbol: String,
        total_supply: Balance,
        balances: Mapping<AccountId, Balance>,
        allowances: Mapping<(AccountId, AccountId), Balance>,
        emissions: Mapping<AccountId, EmissionSchedule>,
        last_claims: Mapping<(AccountId, u128), Timestamp>,
        owner: AccountId,
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
        value: Balance,
    }

    #[ink(event)]
    pub struct Approval {
        #[ink(topic)]
        owner: AccountId,
        #[ink(topic)]
        spender: AccountId,
        value: Balance,
    }

    #[ink(event)]
    pub struct EmissionScheduleSet {
        #[ink(topic)]
        collection: AccountId,
        active: bool,
        start_time: Timestamp,
        end_time: Timestamp,
        emission_per_day: Balance,
    }

    #[ink(event)]
    pub struct RewardsClaimed {
        #[ink(topic)]
        account: AccountId,
        #[ink(topic)]
        collection: AccountId,
        amount: Balance,
        token_count: u32,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        NotOwner,
        NotTokenOwner,
        NoTokensSpecified,
        OwnershipLookupFailed,
        InsufficientBalance,
        InsufficientAllowance,
        ZeroTransfer,
        MathOverflow,
    }

    pub type Result<T> = core::result::Result<T, Error>;

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl GenieToken {
        #[ink(constructor)]
        pub fn new(name: String, symbol: String) -> Self {
            Self {
                token_name: name,
                token_symbol: symbol,
                total_supply: 0,
                balances: Mapping::default(),
                allowances: Mapping::default(),
                emissions: Mapping::default(),
                last_claims: Mapping::default(),
                owner: Self::env().caller(),
            }
        }

        // =================================================================
        // EMISSION ADMINISTRATION
        // =================================================================

        /// Install or replace the emission schedule for `collection`.
        #[ink(message)]
        pub fn set_emission(
            &mut self,
            collection: AccountId,
            active: bool,
            initial_allotment: Balance,
            min_claim_floor: Balance,
            start_time: Timestamp,
            duration: Timestamp,
            emission_per_day: Balance,
        ) -> Result<()> {
            self.only_owner()?;
            let end_time = start_time.checked_add(duration).ok_or(Error::MathOverflow)?;
            self.emissions.insert(
                collection,
                &EmissionSchedule {
                    active,
                    start_time,
                    end_time,
                    initial_allotment,
                    emission_per_day,
                    min_claim_floor,
                },
            );
            self.env().emit_event(EmissionScheduleSet {
                collection,
                active,
                start_time,
                end_time,
                emission_per_day,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn emission_active(&self, collection: AccountId) -> bool {
            self.emissions
                .get(collection)
                .map(|s| s.active)
                .unwrap_or(false)
        }

        #[ink(message)]
        pub fn emission_start(&self, collection: AccountId) -> Timestamp {
            self.emissions
                .get(collection)
                .map(|s| s.start_time)
                .unwrap_or(0)
        }

        #[ink(message)]
        pub fn emission_end(&self, collection: AccountId) -> Timestamp {
            self.emissions
                .get(collection)
                .map(|s| s.end_time)
                .unwrap_or(0)
        }

        #[ink(message)]
        pub fn emission_initial_allotment(&self, collection: AccountId) -> Balance {
            self.emissions
                .get(collection)
                .map(|s| s.initial_allotment)
                .unwrap_or(0)
        }

        #[ink(message)]
        pub fn emission_per_day(&self, collection: AccountId) -> Balance {
            self.emissions
                .get(collection)
                .map(|s| s.emission_per_day)
                .unwrap_or(0)
        }

        #[ink(message)]
        pub fn last_claim(&self, collection: AccountId, token_id: u128) -> Timestamp {
            self.last_claims.get((collection, token_id)).unwrap_or(0)
        }

        // =================================================================
        // ACCRUAL & CLAIMS
        // =================================================================

        /// Rewards claimable right now for one token id. Non-decreasing in
        /// elapsed time, zero immediately after a claim.
        #[ink(message)]
        pub fn accumulated(&self, collection: AccountId, token_id: u128) -> Balance {
            let schedule = match self.emissions.get(collection) {
                Some(schedule) => schedule,
                None => return 0,
            };
            if !schedule.active {
                return 0;
            }
            let last = self.last_claims.get((collection, token_id)).unwrap_or(0);
            let t1 = last.max(schedule.start_time);
            let t2 = self.env().block_timestamp().min(schedule.end_time);
            if t2 <= t1 {
                return 0;
            }
            let days = (t2 - t1) / MS_PER_DAY;
            let mut amount = (days as Balance).saturating_mul(schedule.emission_per_day);
            if last == 0 {
                // First claim ever for this token id.
                amount = amount.saturating_add(schedule.initial_allotment);
            }
            if amount < schedule.min_claim_floor {
                return 0;
            }
            amount
        }

        /// Claim accrued rewards for `token_ids`, minting the sum to the
        /// caller. Every id must be owned by the caller per the collection
        /// contract.
        #[ink(message)]
        pub fn claim(&mut self, collection: AccountId, token_ids: Vec<u128>) -> Result<Balance> {
            let caller = self.env().caller();
            if token_ids.is_empty() {
                return Err(Error::NoTokensSpecified);
            }
            for token_id in &token_ids {
                if self.collection_owner_of(collection, *token_id)? != caller {
                    return Err(Error::NotTokenOwner);
                }
            }
            self.settle_claims(collection, &token_ids, caller)
        }

        // =================================================================
        // BEP20 SURFACE
        // =================================================================

        #[ink(message)]
        pub fn name(&self) -> String {
            self.token_name.clone()
        }

        #[ink(message)]
        pub fn symbol(&self) -> String {
            self.token_symbol.clone()
        }

        #[ink(message)]
        pub fn decimals(&self) -> u8 {
            DECIMALS
        }

        #[ink(message)]
        pub fn total_supply(&self) -> Balance {
            self.total_supply
        }

        #[ink(message)]
        pub fn balance_of(&self, account: AccountId) -> Balance {
            self.balances.get(account).unwrap_or(0)
        }

        #[ink(message)]
        pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Balance {
            self.allowances.get((owner, spender)).unwrap_or(0)
        }

        #[ink(message)]
        pub fn approve(&mut self, spender: AccountId, value: Balance) -> Result<()> {
            let owner = self.env().caller();
            self.allowances.insert((owner, spender), &value);
            self.env().emit_event(Approval {
                owner,
                spender,
                value,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn transfer(&mut self, to: AccountId, value: Balance) -> Result<()> {
            let from = self.env().caller();
            self.process_transfer(from, to, value)
        }

        #[ink(message)]
        pub fn transfer_from(
            &mut self,
            from: AccountId,
            to: AccountId,
            value: Balance,
        ) -> Result<()> {
            let caller = self.env().caller();
            let allowance = self.allowance(from, caller);
            if allowance < value {
                return Err(Error::InsufficientAllowance);
            }
            self.allowances.insert((from, caller), &(allowance - value));
            self.process_transfer(from, to, value)
        }

        #[ink(message)]
        pub fn owner(&self) -> AccountId {
            self.owner
        }

        // =================================================================
        // INTERNALS
        // =================================================================

        /// Accrual bookkeeping shared by every claim path: sum, stamp, mint.
        /// Ownership has been verified by the caller of this function.
        fn settle_claims(
            &mut self,
            collection: AccountId,
            token_ids: &[u128],
            to: AccountId,
        ) -> Result<Balance> {
            let now = self.env().block_timestamp();
            let mut total: Balance = 0;
            for token_id in token_ids {
                let accrued = self.accumulated(collection, *token_id);
                total = total.checked_add(accrued).ok_or(Error::MathOverflow)?;
                self.last_claims.insert((collection, *token_id), &now);
            }
            if total > 0 {
                self.mint(to, total)?;
            }
            self.env().emit_event(RewardsClaimed {
                account: to,
                collection,
                amount: total,
                token_count: token_ids.len() as u32,
            });
            Ok(total)
        }

        fn mint(&mut self, to: AccountId, value: Balance) -> Result<()> {
            let balance = self.balance_of(to);
            self.balances.insert(
                to,
                &balance.checked_add(value).ok_or(Error::MathOverflow)?,
            );
            self.total_supply = self
                .total_supply
                .checked_add(value)
                .ok_or(Error::MathOverflow)?;
            self.env().emit_event(Transfer {
                from: None,
                to: Some(to),
                value,
            });
            Ok(())
        }

        fn process_transfer(&mut self, from: AccountId, to: AccountId, value: Balance) -> Result<()> {
            if value == 0 {
                return Err(Error::ZeroTransfer);
            }
            let from_balance = self.balance_of(from);
            if from_balance < value {
                return Err(Error::InsufficientBalance);
            }
            self.balances.insert(from, &(from_balance - value));
            let to_balance = self.balance_of(to);
            self.balances.insert(
                to,
                &to_balance.checked_add(value).ok_or(Error::MathOverflow)?,
            );
            self.env().emit_event(Transfer {
                from: Some(from),
                to: Some(to),
                value,
            });
            Ok(())
        }

        fn collection_owner_of(&self, collection: AccountId, token_id: u128) -> Result<AccountId> {
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
            holder.ok_or(Error::NotTokenOwner)
        }

        fn only_owner(&self) -> Result<()> {
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
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

        const ONE: Balance = 1_000_000_000_000_000_000;
        const T0: Timestamp = 1_623_751_121_000;
        const FIVE_YEARS: Timestamp = 5 * 365 * MS_PER_DAY;
        const ALLOTMENT: Balance = 1_337 * ONE;
        const PER_DAY: Balance = 7_370_000_000_000_000_000; // 7.37 GNI

        fn accounts() -> test::DefaultAccounts<Env> {
            test::default_accounts::<Env>()
        }

        fn set_caller(a: AccountId) {
            test::set_caller::<Env>(a);
        }

        fn set_time(t: Timestamp) {
            test::set_block_timestamp::<Env>(t);
        }

        /// Deploys GNI with the standard MagicLamp schedule keyed on Bob's
        /// address standing in for the collection contract.
        fn deploy_with_schedule() -> (GenieToken, AccountId) {
            set_caller(accounts().alice);
            set_time(T0);
            let mut gni = GenieToken::new("GenieToken".into(), "GNI".into());
            let collection = accounts().bob;
            gni.set_emission(collection, true, ALLOTMENT, 3, T0, FIVE_YEARS, PER_DAY)
                .unwrap();
            (gni, collection)
        }

        // ── Schedule administration ───────────────────────────────────────

        #[ink::test]
        fn schedule_views_reflect_set_emission() {
            let (gni, collection) = deploy_with_schedule();
            assert!(gni.emission_active(collection));
            assert_eq!(gni.emission_start(collection), T0);
            assert_eq!(gni.emission_end(collection), T0 + FIVE_YEARS);
            assert_eq!(gni.emission_initial_allotment(collection), ALLOTMENT);
            assert_eq!(gni.emission_per_day(collection), PER_DAY);
        }

        #[ink::test]
        fn set_emission_overwrites_schedule() {
            let (mut gni, collection) = deploy_with_schedule();
            gni.set_emission(
                collection,
                true,
                2_337 * ONE,
                5,
                T0 + 1_000,
                3 * 365 * MS_PER_DAY,
                6_370_000_000_000_000_000,
            )
            .unwrap();
            assert_eq!(gni.emission_start(collection), T0 + 1_000);
            assert_eq!(
                gni.emission_end(collection),
                T0 + 1_000 + 3 * 365 * MS_PER_DAY
            );
            assert_eq!(gni.emission_initial_allotment(collection), 2_337 * ONE);
            assert_eq!(gni.emission_per_day(collection), 6_370_000_000_000_000_000);
        }

        #[ink::test]
        fn set_emission_is_owner_only() {
            let (mut gni, collection) = deploy_with_schedule();
            set_caller(accounts().charlie);
            assert_eq!(
                gni.set_emission(collection, true, 0, 0, T0, 1, 1),
                Err(Error::NotOwner)
            );
        }

        // ── Accrual ───────────────────────────────────────────────────────

        #[ink::test]
        fn nothing_accrues_before_start() {
            let (gni, collection) = deploy_with_schedule();
            set_time(T0 - 1);
            assert_eq!(gni.accumulated(collection, 20), 0);
        }

        #[ink::test]
        fn nothing_accrues_when_inactive() {
            let (mut gni, collection) = deploy_with_schedule();
            gni.set_emission(collection, false, ALLOTMENT, 3, T0, FIVE_YEARS, PER_DAY)
                .unwrap();
            set_time(T0 + 10 * MS_PER_DAY);
            assert_eq!(gni.accumulated(collection, 20), 0);
        }

        #[ink::test]
        fn first_day_pays_rate_plus_initial_allotment() {
            let (gni, collection) = deploy_with_schedule();
            set_time(T0 + MS_PER_DAY);
            assert_eq!(gni.accumulated(collection, 20), PER_DAY + ALLOTMENT);
        }

        #[ink::test]
        fn accrual_counts_whole_days_only() {
            let (gni, collection) = deploy_with_schedule();
            set_time(T0 + MS_PER_DAY + MS_PER_DAY / 2);
            assert_eq!(gni.accumulated(collection, 20), PER_DAY + ALLOTMENT);
            set_time(T0 + 2 * MS_PER_DAY);
            assert_eq!(gni.accumulated(collection, 20), 2 * PER_DAY + ALLOTMENT);
        }

        #[ink::test]
        fn accrual_is_monotonic_in_time() {
            let (gni, collection) = deploy_with_schedule();
            let mut previous = 0;
            for day in 1..=10 {
                set_time(T0 + day * MS_PER_DAY);
                let now = gni.accumulated(collection, 7);
                assert!(now >= previous);
                previous = now;
            }
        }

        #[ink::test]
        fn accrual_stops_at_schedule_end() {
            let (gni, collection) = deploy_with_schedule();
            set_time(T0 + FIVE_YEARS + 100 * MS_PER_DAY);
            let capped = gni.accumulated(collection, 20);
            assert_eq!(
                capped,
                (FIVE_YEARS / MS_PER_DAY) as Balance * PER_DAY + ALLOTMENT
            );
        }

        // ── Claims ────────────────────────────────────────────────────────

        #[ink::test]
        fn claim_mints_and_resets_accrual() {
            let (mut gni, collection) = deploy_with_schedule();
            let claimer = accounts().charlie;
            set_time(T0 + MS_PER_DAY);

            let minted = gni.settle_claims(collection, &[20], claimer).unwrap();
            assert_eq!(minted, PER_DAY + ALLOTMENT);
            assert_eq!(gni.balance_of(claimer), PER_DAY + ALLOTMENT);
            assert_eq!(gni.total_supply(), PER_DAY + ALLOTMENT);

            // Same block: nothing further to claim.
            assert_eq!(gni.accumulated(collection, 20), 0);
            assert_eq!(gni.settle_claims(collection, &[20], claimer).unwrap(), 0);
        }

        #[ink::test]
        fn accrual_resumes_a_full_day_after_claim() {
            let (mut gni, collection) = deploy_with_schedule();
            let claimer = accounts().charlie;
            set_time(T0 + MS_PER_DAY);
            gni.settle_claims(collection, &[20], claimer).unwrap();

            set_time(T0 + MS_PER_DAY + MS_PER_DAY - 1);
            assert_eq!(gni.accumulated(collection, 20), 0);

            set_time(T0 + 2 * MS_PER_DAY);
            // No initial allotment the second time around.
            assert_eq!(gni.accumulated(collection, 20), PER_DAY);
        }

        #[ink::test]
        fn claim_sums_over_token_ids() {
            let (mut gni, collection) = deploy_with_schedule();
            let claimer = accounts().charlie;
            set_time(T0 + 3 * MS_PER_DAY);

            let minted = gni
                .settle_claims(collection, &[1, 2, 3], claimer)
                .unwrap();
            assert_eq!(minted, 3 * (3 * PER_DAY + ALLOTMENT));
        }

        #[ink::test]
        fn floor_suppresses_dust_claims() {
            let (mut gni, collection) = deploy_with_schedule();
            let claimer = accounts().charlie;
            // Floor above a single day's emission.
            gni.set_emission(
                collection,
                true,
                ALLOTMENT,
                10 * ONE,
                T0,
                FIVE_YEARS,
                PER_DAY,
            )
            .unwrap();

            set_time(T0 + MS_PER_DAY);
            gni.settle_claims(collection, &[20], claimer).unwrap();

            // One further day accrues 7.37 GNI — below the 10 GNI floor.
            set_time(T0 + 2 * MS_PER_DAY);
            assert_eq!(gni.accumulated(collection, 20), 0);

            // Two days clear it.
            set_time(T0 + 3 * MS_PER_DAY);
            assert_eq!(gni.accumulated(collection, 20), 2 * PER_DAY);
        }

        #[ink::test]
        fn claim_rejects_empty_id_list() {
            let (mut gni, collection) = deploy_with_schedule();
            assert_eq!(
                gni.claim(collection, Vec::new()),
                Err(Error::NoTokensSpecified)
            );
        }

        // ── BEP20 basics ──────────────────────────────────────────────────

        #[ink::test]
        fn token_metadata() {
            let (gni, _) = deploy_with_schedule();
            assert_eq!(gni.name(), "GenieToken");
            assert_eq!(gni.symbol(), "GNI");
            assert_eq!(gni.decimals(), 18);
            assert_eq!(gni.total_supply(), 0);
        }

        #[ink::test]
        fn transfer_and_allowance_flow() {
            let (mut gni, collection) = deploy_with_schedule();
            let accs = accounts();
            set_time(T0 + MS_PER_DAY);
            gni.settle_claims(collection, &[20], accs.charlie).unwrap();

            set_caller(accs.charlie);
            gni.transfer(accs.django, ONE).unwrap();
            assert_eq!(gni.balance_of(accs.django), ONE);

            gni.approve(accs.eve, 2 * ONE).unwrap();
            set_caller(accs.eve);
            gni.transfer_from(accs.charlie, accs.eve, 2 * ONE).unwrap();
            assert_eq!(gni.balance_of(accs.eve), 2 * ONE);
            assert_eq!(
                gni.transfer_from(accs.charlie, accs.eve, 1),
                Err(Error::InsufficientAllowance)
            );
        }
    }
}
