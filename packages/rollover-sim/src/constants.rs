use rollover_core::{Address, SeriesId, Timestamp};

pub const STRATEGY_ID: u64 = 0x5747;
pub const BASE_ID: u64 = 0xba5e;
pub const REWARD_TOKEN_ID: u64 = 0x7e3d;

pub const ALICE_ID: u64 = 0xa11ce;
pub const BOB_ID: u64 = 0xb0b;

/// Offset between a series number and its pool / fyToken addresses
pub const POOL_ID_OFFSET: u64 = 0x1000;
pub const FY_TOKEN_ID_OFFSET: u64 = 0x2000;

/// Arbitrary start of simulated time
pub const GENESIS: Timestamp = 1_700_000_000;

pub const ONE_DAY: Timestamp = 86_400;

pub fn strategy_address() -> Address {
    Address::from_low_u64(STRATEGY_ID)
}

pub fn base_address() -> Address {
    Address::from_low_u64(BASE_ID)
}

pub fn reward_token() -> Address {
    Address::from_low_u64(REWARD_TOKEN_ID)
}

pub fn alice() -> Address {
    Address::from_low_u64(ALICE_ID)
}

pub fn bob() -> Address {
    Address::from_low_u64(BOB_ID)
}

pub fn series_id(n: u32) -> SeriesId {
    SeriesId::from_low_u32(n)
}

pub fn pool_address(n: u32) -> Address {
    Address::from_low_u64(POOL_ID_OFFSET + n as u64)
}

pub fn fy_token_address(n: u32) -> Address {
    Address::from_low_u64(FY_TOKEN_ID_OFFSET + n as u64)
}
