mod password;
pub use password::{hash_password, verify_password};
mod jwt;
pub use jwt::{UserClaims, generate_token, process_token};
mod access_code;
pub use access_code::{ACCESS_CODE_LEN, generate_access_code, is_access_code};
mod error;
pub use error::{CryptError, CryptResult};
