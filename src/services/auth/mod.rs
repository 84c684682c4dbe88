pub mod authorizer;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod token_issuer;
pub mod token_service;

pub use authorizer::RequestAuthorizer;
pub use token_issuer::{IssuedTokenPair, TokenIssuer};
pub use token_service::TokenService;
