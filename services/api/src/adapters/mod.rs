pub mod auth;
pub mod db;
pub mod rest_client;

pub use auth::StaticAuthProvider;
pub use db::DbAdapter;
pub use rest_client::RestBackend;
