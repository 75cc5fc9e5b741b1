pub mod initdb;
pub mod migrate_and_serve;
pub mod promote_admin;
pub mod serve;
pub mod set_active;

pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use promote_admin::promote_admin;
pub use serve::serve;
pub use set_active::set_active;
