//! Domain models and request/response shapes.

pub mod account;
pub mod store;

pub use account::{
    Account, AccountChanges, AccountProfile, AccountRow, LoginRequest, NewAccount, ProfileUpdate,
    RegisterRequest,
};
pub use store::{
    NewStore, PublicStore, PublicStoreRow, Store, StoreChanges, StoreFilter, StoreInput,
    StoreOwner, StoreQuery, StoreRow,
};
