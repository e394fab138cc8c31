mod accounts;
mod reminders;
pub mod utils;

pub use utils::test_utils;
