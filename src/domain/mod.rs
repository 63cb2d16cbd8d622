mod card;
mod ledger;
mod money;
mod transaction;

pub use card::*;
pub use ledger::*;
pub use money::*;
pub use transaction::*;
