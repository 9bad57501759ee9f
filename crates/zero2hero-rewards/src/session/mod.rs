/*
[INPUT]:  Provider-confirmed identities, fetched balances and notifications
[OUTPUT]: Shared session state plus its durable email cache
[POS]:    Session layer - state owned by the client core
[UPDATE]: When session fields or cache backends change
*/

pub mod cache;
pub mod store;

pub use cache::{FileSessionCache, MemorySessionCache, SessionCache, USER_EMAIL_KEY};
pub use store::{SessionState, SessionStore};
