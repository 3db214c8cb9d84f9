//! Registration, login, bearer tokens, and the authenticated-user extractor.

pub mod domain;
pub mod extract;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod token;

pub use domain::{AccessToken, Credentials, NewUser, Role, User, UserId, UserView};
pub use extract::CurrentUser;
pub use repository::UserRepository;
pub use router::router;
pub use service::{AccountError, AccountService};
pub use token::{TokenError, TokenIssuer};
