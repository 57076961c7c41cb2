pub mod auth;
pub mod domain;
pub mod forms;
pub mod ports;

pub use auth::AuthStore;
pub use domain::{AuthChange, AuthEvent, AuthState, Credentials, ProfileRecord, Session, SessionUser};
pub use forms::{LoginForm, RegisterForm};
pub use ports::{AuthEventStream, PortError, PortResult, ProfileLookup, ProfileStore, SessionClient};
