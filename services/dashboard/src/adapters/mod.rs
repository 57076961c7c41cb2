pub mod db;
pub mod gotrue;
pub mod postgrest;

pub use db::DbProfileStore;
pub use gotrue::GoTrueAdapter;
pub use postgrest::PostgrestProfileStore;
